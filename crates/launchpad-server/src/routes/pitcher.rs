use axum::extract::{Path, State};
use axum::Json;
use launchpad_core::config::Service;
use launchpad_core::validate;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::proxy::{self, Failure};
use crate::state::AppState;

/// POST /api/pitcher/start — begin a pitch workflow for an MVP description.
pub async fn start_pitch(
    State(app): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let start = validate::pitch_start(&body)?;
    let base = app.config.require(Service::Pitcher)?;

    let resp = proxy::send(
        app.http_client
            .post(format!("{base}/api/pitch/start"))
            .json(&start),
        "Failed to start pitch workflow",
    )
    .await?;
    proxy::relay_json(resp, Failure::Detail("Failed to start pitch workflow")).await
}

/// POST /api/pitcher/approve/{session_id} — approve the draft or send it
/// back with feedback.
pub async fn approve_pitch(
    State(app): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let approval = validate::pitch_approval(&body)?;
    let base = app.config.require(Service::Pitcher)?;

    tracing::debug!(session_id, approved = approval.approved, "pitch review");
    let resp = proxy::send(
        app.http_client
            .post(proxy::upstream_url(base, &["api", "pitch", "approve", session_id.as_str()])?)
            .json(&json!({
                "approved": approval.approved,
                "feedback": approval.feedback,
            })),
        "Failed to process approval",
    )
    .await?;
    proxy::relay_json(resp, Failure::Detail("Failed to process approval")).await
}

/// GET /api/pitcher/final/{session_id}
pub async fn final_pitch(
    State(app): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let base = app.config.require(Service::Pitcher)?;
    let resp = proxy::send(
        app.http_client
            .get(proxy::upstream_url(base, &["api", "pitch", "final", session_id.as_str()])?),
        "Failed to get final pitch",
    )
    .await?;
    proxy::relay_json(resp, Failure::Detail("Failed to get final pitch")).await
}

/// DELETE /api/pitcher/session/{session_id}
pub async fn delete_pitch_session(
    State(app): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let base = app.config.require(Service::Pitcher)?;
    let resp = proxy::send(
        app.http_client
            .delete(proxy::upstream_url(base, &["api", "pitch", "session", session_id.as_str()])?),
        "Failed to delete session",
    )
    .await?;
    proxy::relay_json(resp, Failure::Detail("Failed to delete session")).await
}
