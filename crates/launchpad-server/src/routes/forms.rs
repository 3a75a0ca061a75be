use axum::extract::State;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// GET /api/crew/get-form — the caller's saved startup form, or
/// `{"formData": null}`.
pub async fn get_form(
    State(app): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let store = app.store.clone();
    let saved = tokio::task::spawn_blocking(move || {
        launchpad_core::forms::load_form(store.as_ref(), identity.as_str())
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(json!({
        "formData": saved.map(|s| s.form_data),
    })))
}

/// POST /api/crew/save-form — replace the caller's saved form.
pub async fn save_form(
    State(app): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let form = body
        .get("formData")
        .cloned()
        .ok_or_else(|| AppError::bad_request("formData is required"))?;

    let store = app.store.clone();
    tokio::task::spawn_blocking(move || {
        launchpad_core::forms::save_form(store.as_ref(), identity.as_str(), form)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(json!({
        "success": true,
        "message": "Form data saved successfully",
    })))
}
