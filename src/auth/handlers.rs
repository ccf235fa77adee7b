use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::state::AppState;

use super::dto::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, PublicUser, ResetPasswordRequest,
    SignupRequest, SignupResponse, VerifyParams,
};
use super::error::AuthError;
use super::jwt::JwtKeys;
use super::services::AccountLifecycle;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/verify", post(verify))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

fn lifecycle(state: &AppState) -> AccountLifecycle {
    AccountLifecycle::new(state.users.clone(), JwtKeys::from_ref(state))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AuthError> {
    let (user, token) = lifecycle(&state).signup(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: PublicUser::from(&user),
            token,
        }),
    ))
}

#[instrument(skip(state, params))]
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<StatusCode, AuthError> {
    lifecycle(&state).verify_account(&params.token).await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let (user, token) = lifecycle(&state).login(payload).await?;
    Ok(Json(LoginResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    lifecycle(&state)
        .forgot_password(payload.email.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    lifecycle(&state).reset_password(payload).await?;
    Ok(StatusCode::OK)
}
