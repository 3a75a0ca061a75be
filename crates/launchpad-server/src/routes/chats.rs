use axum::extract::{Path, State};
use axum::{Extension, Json};
use launchpad_core::chats::{self, RagMessage, RECENT_CHAT_LIMIT};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::routes::rag::release_session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveChatBody {
    pub session_id: Option<String>,
    pub messages: Option<Vec<RagMessage>>,
    pub chat_id: Option<String>,
}

/// GET /api/rag/chats — the caller's most recent chats, newest first.
pub async fn list_chats(
    State(app): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let store = app.store.clone();
    let list = tokio::task::spawn_blocking(move || {
        chats::list_recent(store.as_ref(), identity.as_str(), RECENT_CHAT_LIMIT)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(serde_json::to_value(list)?))
}

/// POST /api/rag/chats — create or update a chat transcript.
pub async fn save_chat(
    State(app): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let body: SaveChatBody = serde_json::from_value(body)
        .map_err(|e| AppError::bad_request(format!("invalid chat: {e}")))?;
    let (Some(session_id), Some(messages)) = (body.session_id, body.messages) else {
        return Err(AppError::bad_request("session_id and messages are required"));
    };

    let store = app.store.clone();
    let chat_id = tokio::task::spawn_blocking(move || {
        chats::save_chat(
            store.as_ref(),
            identity.as_str(),
            &session_id,
            messages,
            body.chat_id.as_deref(),
        )
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(json!({ "chat_id": chat_id })))
}

/// DELETE /api/rag/chats — delete every chat the caller owns and release
/// the remote sessions they referenced.
pub async fn delete_all_chats(
    State(app): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let store = app.store.clone();
    let deleted = tokio::task::spawn_blocking(move || {
        chats::delete_all(store.as_ref(), identity.as_str())
    })
    .await
    .map_err(AppError::join)??;

    for session_id in &deleted.session_ids {
        release_session(&app, session_id).await;
    }

    Ok(Json(serde_json::to_value(deleted)?))
}

/// GET /api/rag/chats/{id} — one chat with its full transcript.
pub async fn get_chat(
    State(app): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(chat_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let store = app.store.clone();
    let chat = tokio::task::spawn_blocking(move || {
        chats::load_chat(store.as_ref(), identity.as_str(), &chat_id)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(serde_json::to_value(chat)?))
}

/// DELETE /api/rag/chats/{id} — delete one chat. The remote RAG session is
/// released once no other chat of the caller references it.
pub async fn delete_chat(
    State(app): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(chat_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let store = app.store.clone();
    let (chat, still_referenced) = tokio::task::spawn_blocking(move || {
        let chat = chats::delete_chat(store.as_ref(), identity.as_str(), &chat_id)?;
        let referenced = chats::session_referenced(store.as_ref(), identity.as_str(), &chat.session_id)?;
        Ok::<_, launchpad_core::LaunchpadError>((chat, referenced))
    })
    .await
    .map_err(AppError::join)??;

    if !still_referenced {
        release_session(&app, &chat.session_id).await;
    }

    Ok(Json(json!({
        "success": true,
        "session_id": chat.session_id,
    })))
}
