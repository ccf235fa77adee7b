use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub deleted_at: Option<OffsetDateTime>,
}

impl Post {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, created_at, updated_at, deleted_at
            FROM posts
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(posts)
    }

    /// Active (non-deleted) post only.
    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, created_at, updated_at, deleted_at
            FROM posts
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    /// Includes soft-deleted rows; needed by restore and hard delete.
    pub async fn find_any(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, created_at, updated_at, deleted_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    pub async fn create(
        db: &PgPool,
        author_id: Uuid,
        title: &str,
        content: &str,
    ) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, title, content)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, title, content, created_at, updated_at, deleted_at
            "#,
        )
        .bind(author_id)
        .bind(title)
        .bind(content)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    pub async fn update(db: &PgPool, id: Uuid, title: &str, content: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, content = $3, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn soft_delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE posts SET deleted_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn restore(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE posts SET deleted_at = NULL WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Permanent removal, replies and reactions included.
    pub async fn hard_delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        let mut tx = db.begin().await?;
        sqlx::query(
            r#"
            DELETE FROM reply_reactions
            WHERE reply_id IN (SELECT id FROM replies WHERE post_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(r#"DELETE FROM replies WHERE post_id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM post_reactions WHERE post_id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM posts WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Toggle a reaction; returns true when the reaction was added.
    pub async fn toggle_reaction(
        db: &PgPool,
        post_id: Uuid,
        user_id: Uuid,
        reaction_type: &str,
    ) -> anyhow::Result<bool> {
        let removed = sqlx::query(
            r#"
            DELETE FROM post_reactions
            WHERE post_id = $1 AND user_id = $2 AND reaction_type = $3
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(reaction_type)
        .execute(db)
        .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO post_reactions (post_id, user_id, reaction_type)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(reaction_type)
        .execute(db)
        .await?;
        Ok(true)
    }
}
