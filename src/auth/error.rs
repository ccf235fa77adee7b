use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Failure taxonomy for the account lifecycle. Security-adjacent variants
/// keep one message per class, regardless of which sub-case fired.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Já existe um usuário cadastrado com este e-mail.")]
    DuplicateEmail,

    #[error("Credenciais inválidas.")]
    Unauthorized,

    #[error("Token de verificação inválido.")]
    InvalidVerificationToken,

    #[error("Token de redefinição de senha inválido ou expirado.")]
    InvalidResetToken,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_)
            | AuthError::DuplicateEmail
            | AuthError::InvalidVerificationToken
            | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(e) = &self {
            error!(error = %e, "internal auth failure");
        }
        (self.status(), self.to_string()).into_response()
    }
}
