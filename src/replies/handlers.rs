use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::repo_types::ROLE_ADMIN;
use crate::posts::repo::Post;
use crate::state::AppState;

use super::dto::{CreateReplyRequest, ReplyReactionRequest, ReplyResponse, UpdateReplyRequest};
use super::repo::Reply;

pub fn reply_routes() -> Router<AppState> {
    Router::new()
        .route("/replies", post(create_reply))
        .route("/replies/react", post(react_to_reply))
        .route("/replies/post/:post_id", get(list_replies_by_post))
        .route(
            "/replies/:id",
            get(get_reply).put(update_reply).delete(delete_reply),
        )
}

#[instrument(skip(state))]
pub async fn list_replies_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<ReplyResponse>>, (StatusCode, String)> {
    let replies = Reply::list_by_post(&state.db, post_id)
        .await
        .map_err(internal)?;
    Ok(Json(replies.into_iter().map(ReplyResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReplyResponse>, (StatusCode, String)> {
    let reply = Reply::find(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Resposta não encontrada.".to_string()))?;
    Ok(Json(ReplyResponse::from(reply)))
}

#[instrument(skip(state, payload))]
pub async fn create_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<ReplyResponse>), (StatusCode, String)> {
    if payload.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Conteúdo é obrigatório.".into()));
    }
    if Post::find(&state.db, payload.post_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Post não encontrado.".into()));
    }

    // A threaded reply must hang off a reply of the same post.
    if let Some(parent_id) = payload.parent_id {
        let parent = Reply::find(&state.db, parent_id).await.map_err(internal)?;
        let belongs = parent.map(|p| p.post_id == payload.post_id).unwrap_or(false);
        if !belongs {
            warn!(post_id = %payload.post_id, %parent_id, "reply thread crossing posts");
            return Err((
                StatusCode::BAD_REQUEST,
                "Inconsistência entre post e resposta.".into(),
            ));
        }
    }

    let reply = Reply::create(
        &state.db,
        payload.post_id,
        payload.parent_id,
        auth.id,
        &payload.content,
    )
    .await
    .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(ReplyResponse::from(reply))))
}

#[instrument(skip(state, payload))]
pub async fn update_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReplyRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let reply = Reply::find(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Resposta não encontrada.".to_string()))?;
    if reply.author_id != auth.id {
        return Err((
            StatusCode::FORBIDDEN,
            "Você não é o autor desta resposta.".into(),
        ));
    }

    Reply::update(&state.db, id, &payload.content)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let reply = Reply::find(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Resposta não encontrada.".to_string()))?;
    if reply.author_id != auth.id && auth.role != ROLE_ADMIN {
        return Err((
            StatusCode::FORBIDDEN,
            "Você não é o autor desta resposta.".into(),
        ));
    }

    Reply::soft_delete(&state.db, id).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn react_to_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ReplyReactionRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if Reply::find(&state.db, payload.reply_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Resposta não encontrada.".into()));
    }

    let added = Reply::toggle_reaction(
        &state.db,
        payload.reply_id,
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
    error!(error = %e, "replies handler failure");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
