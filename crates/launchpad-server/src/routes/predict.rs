use axum::extract::State;
use axum::Json;
use launchpad_core::config::Service;
use launchpad_core::validate;
use serde_json::Value;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::proxy::{self, Failure};
use crate::state::AppState;

/// POST /api/predict — acquisition probability from the success predictor.
pub async fn predict(
    State(app): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let request = validate::prediction(&body)?;
    let base = app.config.require(Service::Predictor)?;

    let resp = proxy::send(
        app.http_client
            .post(format!("{base}/predict"))
            .json(&request),
        "Prediction service unavailable",
    )
    .await?;
    proxy::relay_json(resp, Failure::Unavailable("Prediction service unavailable")).await
}
