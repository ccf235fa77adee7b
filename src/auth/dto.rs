use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;

/// Request body for signup. Fields stay optional so presence is checked by
/// the lifecycle (missing fields are a 400, not a deserialization reject).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Query string of `POST /auth/verify?token=...`.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Public part of the user returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

/// 201 body for signup: the created user plus its verification token.
/// Email delivery is out of band, so the token rides along for the caller.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: PublicUser,
    pub token: String,
}

/// 200 body for login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_accepts_camel_case_confirmation() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"username":"suki","email":"suki@email.com","password":"Suki1234","confirmPassword":"Suki1234"}"#,
        )
        .unwrap();
        assert_eq!(req.confirm_password.as_deref(), Some("Suki1234"));
    }

    #[test]
    fn public_user_hides_nothing_it_should_show() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "Teste User".into(),
            email: "teste@email.com".into(),
            is_verified: false,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("teste@email.com"));
        assert!(json.contains("\"isVerified\":false"));
    }
}
