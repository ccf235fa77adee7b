use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::dto::{LoginRequest, ResetPasswordRequest, SignupRequest};
use super::error::AuthError;
use super::jwt::JwtKeys;
use super::repo_types::{NewUser, User};
use super::store::UserStore;
use super::{password, tokens};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: Option<&str>) -> Result<&str, AuthError> {
    match field {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AuthError::Validation(
            "Todos os campos são obrigatórios.".into(),
        )),
    }
}

/// Orchestrates the account state machine: signup → verify, login, and
/// forgot-password → reset-password.
#[derive(Clone)]
pub struct AccountLifecycle {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AccountLifecycle {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    /// Create an unverified account and hand the verification token back to
    /// the caller for out-of-band delivery.
    pub async fn signup(&self, req: SignupRequest) -> Result<(User, String), AuthError> {
        let name = required(req.username.as_deref())?.trim().to_string();
        let email = normalize_email(required(req.email.as_deref())?);
        let plain = required(req.password.as_deref())?;
        let confirm = required(req.confirm_password.as_deref())?;

        if plain != confirm {
            return Err(AuthError::Validation("As senhas não conferem.".into()));
        }
        if !is_valid_email(&email) {
            return Err(AuthError::Validation("E-mail inválido.".into()));
        }
        if self.users.find_active_by_email(&email).await?.is_some() {
            warn!(%email, "signup with taken email");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = password::hash_password(plain)?;
        let verification_token = tokens::generate();
        let user = self
            .users
            .create(NewUser {
                name,
                email,
                password_hash,
                verification_token: verification_token.clone(),
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, "account created, pending verification");
        Ok((user, verification_token))
    }

    /// Flip the account to verified, consuming its token. Unknown and
    /// already-consumed tokens are indistinguishable to the caller.
    pub async fn verify_account(&self, token: &str) -> Result<(), AuthError> {
        match self.users.consume_verification_token(token).await? {
            Some(user_id) => {
                info!(%user_id, "account verified");
                Ok(())
            }
            None => {
                warn!("verification with unknown or consumed token");
                Err(AuthError::InvalidVerificationToken)
            }
        }
    }

    /// Authenticate and mint a session. Verification is deliberately not
    /// required to log in.
    pub async fn login(&self, req: LoginRequest) -> Result<(User, String), AuthError> {
        let email = normalize_email(required(req.email.as_deref())?);
        let plain = required(req.password.as_deref())?;

        // Unknown email and wrong password fall through to the same error;
        // the response must not reveal which factor failed.
        let Some(user) = self.users.find_active_by_email(&email).await? else {
            warn!(%email, "login with unknown email");
            return Err(AuthError::Unauthorized);
        };
        if !password::verify_password(plain, &user.password_hash)? {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::Unauthorized);
        }

        let token = self.keys.sign_session(&user)?;
        info!(user_id = %user.id, "session issued");
        Ok((user, token))
    }

    /// Issue a reset token when the address matches an active account.
    /// Always reported as success: a miss must look identical to a hit so
    /// addresses cannot be enumerated.
    pub async fn forgot_password(&self, email: Option<&str>) -> Result<(), AuthError> {
        let Some(email) = email.map(normalize_email).filter(|e| !e.is_empty()) else {
            return Ok(());
        };

        if let Some(user) = self.users.find_active_by_email(&email).await? {
            let token = tokens::generate();
            let expires_at = tokens::reset_expiry(OffsetDateTime::now_utc());
            self.users.set_reset_token(user.id, &token, expires_at).await?;
            info!(user_id = %user.id, "reset token issued");
        }
        Ok(())
    }

    /// Swap the credential for the token's owner, consuming the token.
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AuthError> {
        let token = required(req.token.as_deref())?;
        let plain = required(req.password.as_deref())?;
        let confirm = required(req.confirm_password.as_deref())?;

        // Checked before the token lookup: a mismatch leaves the token
        // outstanding for a corrected attempt.
        if plain != confirm {
            return Err(AuthError::Validation("As senhas não conferem.".into()));
        }

        let new_hash = password::hash_password(plain)?;
        let now = OffsetDateTime::now_utc();
        match self.users.consume_reset_token(token, &new_hash, now).await? {
            Some(user_id) => {
                info!(%user_id, "password reset");
                Ok(())
            }
            None => {
                warn!("reset with unknown or expired token");
                Err(AuthError::InvalidResetToken)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::testing::MemoryUserStore;
    use crate::config::JwtConfig;
    use time::Duration;

    const SEED_EMAIL: &str = "teste@email.com";
    const SEED_PASSWORD: &str = "senha123";

    fn test_keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "uma_chave_super_secreta_com_pelo_menos_32_caracteres".into(),
            issuer: "backbeat-test".into(),
            audience: "backbeat-test-users".into(),
            ttl_minutes: 60,
        })
    }

    fn seeded() -> (Arc<MemoryUserStore>, AccountLifecycle) {
        let store = Arc::new(MemoryUserStore::new());
        let hash = password::hash_password(SEED_PASSWORD).unwrap();
        store.insert_verified("Teste User", SEED_EMAIL, &hash);
        let lifecycle = AccountLifecycle::new(store.clone(), test_keys());
        (store, lifecycle)
    }

    fn signup_req(email: &str) -> SignupRequest {
        SignupRequest {
            username: Some("suki".into()),
            email: Some(email.into()),
            password: Some("Suki1234".into()),
            confirm_password: Some("Suki1234".into()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn reset_req(token: &str, password: &str, confirm: &str) -> ResetPasswordRequest {
        ResetPasswordRequest {
            token: Some(token.into()),
            password: Some(password.into()),
            confirm_password: Some(confirm.into()),
        }
    }

    #[tokio::test]
    async fn signup_creates_unverified_account_with_token() {
        let (store, lifecycle) = seeded();
        let (user, token) = lifecycle.signup(signup_req("suki@email.com")).await.unwrap();

        assert!(!user.is_verified);
        assert_eq!(user.email, "suki@email.com");
        assert_eq!(user.role, "USER");

        let stored = store.get_by_email("suki@email.com").unwrap();
        assert_eq!(stored.verification_token.as_deref(), Some(token.as_str()));
    }

    #[tokio::test]
    async fn signup_normalizes_email() {
        let (store, lifecycle) = seeded();
        lifecycle
            .signup(signup_req("  Suki@Email.com "))
            .await
            .unwrap();
        assert!(store.get_by_email("suki@email.com").is_some());
    }

    #[tokio::test]
    async fn signup_rejects_password_mismatch_without_creating_a_user() {
        let (store, lifecycle) = seeded();
        let mut req = signup_req("suki@email.com");
        req.confirm_password = Some("Suki1233".into());

        let err = lifecycle.signup(req).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(err.to_string(), "As senhas não conferem.");
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn signup_rejects_missing_fields() {
        let (store, lifecycle) = seeded();
        let mut req = signup_req("suki@email.com");
        req.confirm_password = None;

        let err = lifecycle.signup(req).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email() {
        let (store, lifecycle) = seeded();
        let err = lifecycle.signup(signup_req(SEED_EMAIL)).await.unwrap_err();

        assert!(matches!(err, AuthError::DuplicateEmail));
        assert_eq!(
            err.to_string(),
            "Já existe um usuário cadastrado com este e-mail."
        );
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn signup_is_allowed_after_the_holder_deactivates() {
        let (store, lifecycle) = seeded();
        store.deactivate(SEED_EMAIL);
        assert!(lifecycle.signup(signup_req(SEED_EMAIL)).await.is_ok());
    }

    #[tokio::test]
    async fn verification_consumes_the_token() {
        let (store, lifecycle) = seeded();
        let (_, token) = lifecycle.signup(signup_req("suki@email.com")).await.unwrap();

        lifecycle.verify_account(&token).await.unwrap();
        let stored = store.get_by_email("suki@email.com").unwrap();
        assert!(stored.is_verified);
        assert!(stored.verification_token.is_none());

        // Second use of the same token is indistinguishable from an
        // unknown one.
        let err = lifecycle.verify_account(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidVerificationToken));
    }

    #[tokio::test]
    async fn verification_rejects_unknown_tokens() {
        let (_, lifecycle) = seeded();
        let err = lifecycle.verify_account("token-invalido").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidVerificationToken));
        assert_eq!(err.to_string(), "Token de verificação inválido.");
    }

    #[tokio::test]
    async fn login_issues_a_session_for_valid_credentials() {
        let (_, lifecycle) = seeded();
        let (user, token) = lifecycle
            .login(login_req(SEED_EMAIL, SEED_PASSWORD))
            .await
            .unwrap();

        assert_eq!(user.email, SEED_EMAIL);
        let claims = test_keys().verify(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, SEED_EMAIL);
        assert_eq!(claims.role, "USER");
    }

    #[tokio::test]
    async fn login_failure_does_not_reveal_which_factor_failed() {
        let (_, lifecycle) = seeded();
        let wrong_password = lifecycle
            .login(login_req(SEED_EMAIL, "senha321"))
            .await
            .unwrap_err();
        let unknown_email = lifecycle
            .login(login_req("wrong@email.com", SEED_PASSWORD))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::Unauthorized));
        assert!(matches!(unknown_email, AuthError::Unauthorized));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn login_rejects_missing_fields() {
        let (_, lifecycle) = seeded();
        let err = lifecycle
            .login(LoginRequest {
                email: Some("wrong@email.com".into()),
                password: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn login_does_not_require_verification() {
        let (_, lifecycle) = seeded();
        lifecycle.signup(signup_req("suki@email.com")).await.unwrap();
        assert!(lifecycle
            .login(login_req("suki@email.com", "Suki1234"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn login_rejects_deactivated_accounts() {
        let (store, lifecycle) = seeded();
        store.deactivate(SEED_EMAIL);
        let err = lifecycle
            .login(login_req(SEED_EMAIL, SEED_PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn forgot_then_reset_then_login_round_trip() {
        let (store, lifecycle) = seeded();
        lifecycle.forgot_password(Some(SEED_EMAIL)).await.unwrap();

        let token = store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token
            .unwrap();
        lifecycle
            .reset_password(reset_req(&token, "Suki4321", "Suki4321"))
            .await
            .unwrap();

        assert!(lifecycle
            .login(login_req(SEED_EMAIL, "Suki4321"))
            .await
            .is_ok());
        let err = lifecycle
            .login(login_req(SEED_EMAIL, SEED_PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn forgot_password_is_silent_for_unknown_addresses() {
        let (store, lifecycle) = seeded();
        lifecycle
            .forgot_password(Some("wrong@email.com"))
            .await
            .unwrap();
        lifecycle.forgot_password(None).await.unwrap();
        assert!(store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token
            .is_none());
    }

    #[tokio::test]
    async fn forgot_password_sets_an_hour_long_window() {
        let (store, lifecycle) = seeded();
        let before = OffsetDateTime::now_utc();
        lifecycle.forgot_password(Some(SEED_EMAIL)).await.unwrap();

        let expiry = store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token_expiry
            .unwrap();
        let window = expiry - before;
        assert!(window >= Duration::HOUR);
        assert!(window < Duration::HOUR + Duration::MINUTE);
    }

    #[tokio::test]
    async fn second_forgot_password_invalidates_the_first_token() {
        let (store, lifecycle) = seeded();
        lifecycle.forgot_password(Some(SEED_EMAIL)).await.unwrap();
        let first = store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token
            .unwrap();
        lifecycle.forgot_password(Some(SEED_EMAIL)).await.unwrap();
        let second = store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token
            .unwrap();
        assert_ne!(first, second);

        let err = lifecycle
            .reset_password(reset_req(&first, "Suki4321", "Suki4321"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));
        assert!(lifecycle
            .reset_password(reset_req(&second, "Suki4321", "Suki4321"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn reset_mismatch_leaves_the_token_outstanding() {
        let (store, lifecycle) = seeded();
        lifecycle.forgot_password(Some(SEED_EMAIL)).await.unwrap();
        let token = store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token
            .unwrap();

        let err = lifecycle
            .reset_password(reset_req(&token, "Suki4321", "Suki4322"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        // The credential is untouched and the token survives for a
        // corrected attempt.
        assert!(lifecycle
            .login(login_req(SEED_EMAIL, SEED_PASSWORD))
            .await
            .is_ok());
        assert!(store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token
            .is_some());
        assert!(lifecycle
            .reset_password(reset_req(&token, "Suki4321", "Suki4321"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn reset_rejects_unknown_tokens() {
        let (_, lifecycle) = seeded();
        let err = lifecycle
            .reset_password(reset_req("token-invalido-qualquer", "Suki4321", "Suki4321"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn reset_tokens_are_single_use() {
        let (store, lifecycle) = seeded();
        lifecycle.forgot_password(Some(SEED_EMAIL)).await.unwrap();
        let token = store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token
            .unwrap();

        lifecycle
            .reset_password(reset_req(&token, "Suki4321", "Suki4321"))
            .await
            .unwrap();
        let err = lifecycle
            .reset_password(reset_req(&token, "Suki9999", "Suki9999"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn reset_rejects_and_burns_expired_tokens() {
        let (store, lifecycle) = seeded();
        let user_id = store.get_by_email(SEED_EMAIL).unwrap().id;
        let expired = OffsetDateTime::now_utc() - Duration::MINUTE;
        store
            .set_reset_token(user_id, "token-expirado", expired)
            .await
            .unwrap();

        let err = lifecycle
            .reset_password(reset_req("token-expirado", "Suki4321", "Suki4321"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));

        // The expired token is cleared by the attempt.
        assert!(store
            .get_by_email(SEED_EMAIL)
            .unwrap()
            .reset_password_token
            .is_none());
    }
}
