use axum::extract::State;
use axum::Json;
use launchpad_core::config::Service;
use launchpad_core::validate;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::proxy;
use crate::state::AppState;

const SUBMIT_FAILED: &str = "Failed to submit your startup details. Please try again.";

/// POST /api/investor — forward a validated submission to the
/// investor-matching webhook. The webhook reply is not relayed.
pub async fn submit_investor(
    State(app): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let submission = validate::investor(&body)?;
    let webhook = app.config.require(Service::InvestorWorkflow)?;

    let resp = proxy::send(app.http_client.post(webhook).json(&submission), SUBMIT_FAILED).await?;
    // Webhooks often answer with plain text; only the status matters.
    let status = resp.status();
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "investor workflow rejected submission");
        return Err(AppError::upstream(status.as_u16(), SUBMIT_FAILED));
    }

    tracing::info!(startup = %submission.startup_name, "investor submission forwarded");
    Ok(Json(json!({ "success": true })))
}
