use axum::extract::State;
use axum::Json;
use launchpad_core::config::Service;
use launchpad_core::validate;
use serde_json::Value;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::proxy::{self, Failure};
use crate::state::AppState;

/// POST /api/enhance — rewrite a raw idea into a structured pitch.
pub async fn enhance(
    State(app): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let request = validate::enhancement(&body)?;
    let base = app.config.require(Service::Enhancer)?;

    let resp = proxy::send(
        app.http_client
            .post(format!("{base}/enhance-idea"))
            .json(&request),
        "Enhancement service unavailable",
    )
    .await?;
    proxy::relay_json(resp, Failure::Unavailable("Enhancement service unavailable")).await
}
