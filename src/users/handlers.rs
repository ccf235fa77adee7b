use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::repo_types::ROLE_ADMIN;
use crate::auth::store::UserStore;
use crate::auth::{password, services};
use crate::state::AppState;

use super::dto::{AdminCreateUserRequest, UpdateUserRequest, UserProfile};
use super::repo;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(admin_create_user))
        .route("/users/:id", put(update_user))
        .route("/users/me/deactivate", delete(deactivate_me))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, (StatusCode, String)> {
    let users = repo::list_active(&state.db).await.map_err(internal)?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if auth.id != id {
        warn!(user_id = %auth.id, target = %id, "profile edit on another account");
        return Err((
            StatusCode::FORBIDDEN,
            "Você só pode editar o próprio perfil.".into(),
        ));
    }

    let updated = repo::update_profile(&state.db, id, &payload.name, payload.bio.as_deref())
        .await
        .map_err(internal)?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "Usuário não encontrado.".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn deactivate_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, (StatusCode, String)> {
    repo::deactivate(&state.db, auth.id, OffsetDateTime::now_utc())
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn admin_create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), (StatusCode, String)> {
    if auth.role != ROLE_ADMIN {
        return Err((
            StatusCode::FORBIDDEN,
            "Apenas administradores podem criar usuários.".into(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    if !services::is_valid_email(&email) {
        return Err((StatusCode::BAD_REQUEST, "E-mail inválido.".into()));
    }
    if state
        .users
        .find_active_by_email(&email)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "Já existe um usuário cadastrado com este e-mail.".into(),
        ));
    }

    let hash = password::hash_password(&payload.password).map_err(internal)?;
    let user = repo::admin_create(&state.db, payload.name.trim(), &email, &hash)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "users handler failure");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
