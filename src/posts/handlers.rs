use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::repo_types::ROLE_ADMIN;
use crate::state::AppState;

use super::dto::{Pagination, PostReactionRequest, PostRequest, PostResponse};
use super::repo::Post;

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/react", post(react_to_post))
        .route("/posts/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/posts/:id/hard", delete(hard_delete_post))
        .route("/posts/:id/restore", patch(restore_post))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PostResponse>>, (StatusCode, String)> {
    let posts = Post::list(&state.db, p.limit, p.offset)
        .await
        .map_err(internal)?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, (StatusCode, String)> {
    let post = Post::find(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Post não encontrado.".to_string()))?;
    Ok(Json(PostResponse::from(post)))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PostRequest>,
) -> Result<(StatusCode, HeaderMap, Json<PostResponse>), (StatusCode, String)> {
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Título e conteúdo são obrigatórios.".into(),
        ));
    }

    let post = Post::create(&state.db, auth.id, payload.title.trim(), &payload.content)
        .await
        .map_err(internal)?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/posts/{}", post.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(PostResponse::from(post))))
}

#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let post = Post::find(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Post não encontrado.".to_string()))?;
    if post.author_id != auth.id {
        warn!(user_id = %auth.id, post_id = %id, "edit on another author's post");
        return Err((
            StatusCode::FORBIDDEN,
            "Você não é o autor deste post.".into(),
        ));
    }

    Post::update(&state.db, id, payload.title.trim(), &payload.content)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let post = Post::find(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Post não encontrado.".to_string()))?;
    if post.author_id != auth.id && auth.role != ROLE_ADMIN {
        return Err((
            StatusCode::FORBIDDEN,
            "Você não é o autor deste post.".into(),
        ));
    }

    Post::soft_delete(&state.db, id).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn hard_delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if auth.role != ROLE_ADMIN {
        return Err((
            StatusCode::FORBIDDEN,
            "Apenas administradores podem excluir permanentemente.".into(),
        ));
    }
    if Post::find_any(&state.db, id).await.map_err(internal)?.is_none() {
        return Err((StatusCode::NOT_FOUND, "Post não encontrado.".into()));
    }

    Post::hard_delete(&state.db, id).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn restore_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let post = Post::find_any(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Post não encontrado.".to_string()))?;
    if post.author_id != auth.id && auth.role != ROLE_ADMIN {
        return Err((
            StatusCode::FORBIDDEN,
            "Você não é o autor deste post.".into(),
        ));
    }
    if post.deleted_at.is_none() {
        return Err((StatusCode::BAD_REQUEST, "Este post não está deletado.".into()));
    }

    Post::restore(&state.db, id).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn react_to_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PostReactionRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if Post::find(&state.db, payload.post_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Post não encontrado.".into()));
    }

    let added = Post::toggle_reaction(
        &state.db,
        payload.post_id,
        auth.id,
        &payload.reaction_type,
    )
    .await
    .map_err(internal)?;

    let message = if added {
        "Reação adicionada."
    } else {
        "Reação removida."
    };
    Ok(Json(serde_json::json!({ "message": message })))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "posts handler failure");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
