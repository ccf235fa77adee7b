use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use super::repo_types::{NewUser, User, ROLE_USER};
use super::store::UserStore;

/// Postgres-backed [`UserStore`]. All token handling is done with
/// single-statement updates keyed by exact token match.
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, bio, password_hash, role, is_verified,
                   verification_token, reset_password_token, reset_password_token_expiry,
                   created_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, verification_token, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, bio, password_hash, role, is_verified,
                      verification_token, reset_password_token, reset_password_token_expiry,
                      created_at, deleted_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.verification_token)
        .bind(ROLE_USER)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn consume_verification_token(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        // Flag flip and token clear happen in one statement; a consumed
        // token can never be observed with the account still unverified.
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_token = NULL
            WHERE verification_token = $1 AND deleted_at IS NULL
            RETURNING id
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(id)
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_password_token = $2, reset_password_token_expiry = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET password_hash = $2,
                reset_password_token = NULL,
                reset_password_token_expiry = NULL
            WHERE reset_password_token = $1
              AND reset_password_token_expiry > $3
              AND deleted_at IS NULL
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(new_password_hash)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;

        if id.is_none() {
            // A matching-but-expired token is burned here too: single-use
            // holds no matter how the consumption attempt ends.
            let cleared = sqlx::query(
                r#"
                UPDATE users
                SET reset_password_token = NULL, reset_password_token_expiry = NULL
                WHERE reset_password_token = $1
                "#,
            )
            .bind(token)
            .execute(&self.db)
            .await?;
            if cleared.rows_affected() > 0 {
                warn!("expired reset token cleared");
            }
        }

        Ok(id)
    }
}
