use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, bio, password_hash, role, is_verified,
               verification_token, reset_password_token, reset_password_token_expiry,
               created_at, deleted_at
        FROM users
        WHERE deleted_at IS NULL
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    name: &str,
    bio: Option<&str>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET name = $2, bio = $3
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(bio)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn deactivate(db: &PgPool, id: Uuid, now: OffsetDateTime) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET deleted_at = $2
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn admin_create(
    db: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, is_verified)
        VALUES ($1, $2, $3, TRUE)
        RETURNING id, name, email, bio, password_hash, role, is_verified,
                  verification_token, reset_password_token, reset_password_token_expiry,
                  created_at, deleted_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(db)
    .await?;
    Ok(user)
}
