use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/health — which external services are configured. Never
/// reveals the URLs themselves.
pub async fn health(State(app): State<AppState>) -> Json<Value> {
    let services: Vec<Value> = app
        .config
        .summary()
        .into_iter()
        .map(|(service, var, configured)| {
            json!({
                "service": service.to_string(),
                "env_var": var,
                "configured": configured,
            })
        })
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "auth_configured": app.config.session_secret().is_some(),
        "services": services,
    }))
}
