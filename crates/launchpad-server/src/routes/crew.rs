use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use launchpad_core::config::Service;
use launchpad_core::kind::PipelineKind;
use launchpad_core::validate::require_startup_data;
use launchpad_core::LaunchpadError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::proxy::{self, Failure};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub id: Option<String>,
}

impl AnalysisQuery {
    fn require(self) -> Result<String, AppError> {
        self.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::bad_request("Analysis ID required"))
    }
}

fn pipeline(kind: &str) -> Result<PipelineKind, AppError> {
    kind.parse()
        .map_err(|_| AppError::not_found(format!("Unknown pipeline: {kind}")))
}

/// POST /api/crew/{kind} — submit an analysis and hand back the stream URL.
pub async fn submit_analysis(
    State(app): State<AppState>,
    Path(kind): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let kind = pipeline(&kind)?;
    let startup_data = require_startup_data(&body)?;
    let base = app.config.require(Service::Crew(kind))?;

    let resp = proxy::send(
        app.http_client
            .post(format!("{base}/api/analyze"))
            .json(&json!({ "startup_data": startup_data })),
        "Failed to submit analysis",
    )
    .await?;
    let backend_error = format!(
        "Backend error: {}",
        resp.status().canonical_reason().unwrap_or("Unknown")
    );
    let reply = proxy::read_json(resp, Failure::Fixed(&backend_error)).await?;

    let analysis_id = reply
        .get("analysis_id")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError(LaunchpadError::Decode("submit reply has no analysis_id".into()).into())
        })?;
    tracing::info!(%kind, analysis_id, "analysis queued");

    Ok(Json(json!({
        "analysis_id": analysis_id,
        "agent": kind.agent_label(),
        "status": "queued",
        "message": "Analysis started. Connect to SSE stream for real-time progress.",
        "stream_url": format!("/api/crew/{kind}/stream?id={analysis_id}"),
    })))
}

/// GET /api/crew/{kind}?id= — authoritative result, reshaped into the poll
/// envelope.
pub async fn get_results(
    State(app): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<Value>, AppError> {
    let kind = pipeline(&kind)?;
    let analysis_id = query.require()?;
    let base = app.config.require(Service::Crew(kind))?;

    let resp = proxy::send(
        app.http_client
            .get(proxy::upstream_url(base, &["api", "results", analysis_id.as_str()])?),
        "Failed to fetch results",
    )
    .await?;
    let result = proxy::read_json(resp, Failure::Fixed("Analysis not found")).await?;

    Ok(Json(json!({
        "analysis_id": analysis_id,
        "agent": kind.agent_label(),
        "status": result.get("status"),
        "submitted_at": result.get("submitted_at"),
        "completed_at": result.get("completed_at"),
        "result": result.get("result"),
        "error": result.get("error"),
        "pipeline": result.get("pipeline"),
    })))
}

/// GET /api/crew/{kind}/stream?id= — forward the backend progress stream.
pub async fn stream_progress(
    State(app): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Response, AppError> {
    let kind = pipeline(&kind)?;
    let analysis_id = query.require()?;
    let base = app.config.require(Service::Crew(kind))?;

    let resp = proxy::send(
        app.http_client
            .get(proxy::upstream_url(base, &["api", "stream", analysis_id.as_str()])?)
            .header(reqwest::header::ACCEPT, "text/event-stream"),
        "Failed to connect to backend stream",
    )
    .await?;
    if !resp.status().is_success() {
        tracing::warn!(%kind, analysis_id, status = resp.status().as_u16(), "backend stream refused");
        return Err(AppError::upstream(resp.status().as_u16(), "Analysis not found"));
    }

    tracing::debug!(%kind, analysis_id, "relaying progress stream");
    Ok(proxy::relay_event_stream(resp))
}
