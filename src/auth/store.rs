use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{NewUser, User};

/// Persistence seam for the account lifecycle.
///
/// Every method is a single per-record read-modify-write; token consumption
/// happens in the same step as the state change it authorizes, so no caller
/// can observe a cleared token with the change not yet applied.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a non-deleted user by normalized email.
    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Insert an unverified account carrying its verification token.
    async fn create(&self, new: NewUser) -> anyhow::Result<User>;

    /// Single-use: marks the owning account verified and clears the token.
    /// Unknown and already-consumed tokens both come back as `None`.
    async fn consume_verification_token(&self, token: &str) -> anyhow::Result<Option<Uuid>>;

    /// Attach a reset token, overwriting any outstanding one (latest wins).
    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()>;

    /// Single-use: swaps in the new credential hash and clears the token,
    /// provided the token matches exactly and `now` is inside its validity
    /// window. A matching-but-expired token is cleared as well, so it
    /// cannot be probed a second time.
    async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Uuid>>;
}
