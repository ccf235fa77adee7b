use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reply {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

impl Reply {
    pub async fn list_by_post(db: &PgPool, post_id: Uuid) -> anyhow::Result<Vec<Reply>> {
        let replies = sqlx::query_as::<_, Reply>(
            r#"
            SELECT id, post_id, parent_id, author_id, content, created_at, deleted_at
            FROM replies
            WHERE post_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(db)
        .await?;
        Ok(replies)
    }

    /// Active (non-deleted) reply only.
    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Reply>> {
        let reply = sqlx::query_as::<_, Reply>(
            r#"
            SELECT id, post_id, parent_id, author_id, content, created_at, deleted_at
            FROM replies
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(reply)
    }

    pub async fn create(
        db: &PgPool,
        post_id: Uuid,
        parent_id: Option<Uuid>,
        author_id: Uuid,
        content: &str,
    ) -> anyhow::Result<Reply> {
        let reply = sqlx::query_as::<_, Reply>(
            r#"
            INSERT INTO replies (post_id, parent_id, author_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, parent_id, author_id, content, created_at, deleted_at
            "#,
        )
        .bind(post_id)
        .bind(parent_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(db)
        .await?;
        Ok(reply)
    }

    pub async fn update(db: &PgPool, id: Uuid, content: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE replies SET content = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(content)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn soft_delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE replies SET deleted_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Toggle a reaction; returns true when the reaction was added.
    pub async fn toggle_reaction(
        db: &PgPool,
        reply_id: Uuid,
        user_id: Uuid,
        reaction_type: &str,
    ) -> anyhow::Result<bool> {
        let removed = sqlx::query(
            r#"
            DELETE FROM reply_reactions
            WHERE reply_id = $1 AND user_id = $2 AND reaction_type = $3
            "#,
        )
        .bind(reply_id)
        .bind(user_id)
        .bind(reaction_type)
        .execute(db)
        .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO reply_reactions (reply_id, user_id, reaction_type)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(reply_id)
        .bind(user_id)
        .bind(reaction_type)
        .execute(db)
        .await?;
        Ok(true)
    }
}
