use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use launchpad_core::LaunchpadError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 404 Not Found errors
// ---------------------------------------------------------------------------

/// Private sentinel error type used to carry an explicit HTTP 404 through
/// the `anyhow::Error` chain without touching the `LaunchpadError` enum.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// Downcasts to [`LaunchpadError`] to pick the status; anything else is a
/// 500. The body is always `{"error": "<message>"}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(LaunchpadError::validation(msg).into())
    }

    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    /// Construct a 503 Service Unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self(LaunchpadError::ServiceUnavailable(msg.into()).into())
    }

    /// Upstream failure passed through with the remote status.
    pub fn upstream(status: u16, msg: impl Into<String>) -> Self {
        Self(LaunchpadError::upstream(status, msg).into())
    }

    pub(crate) fn join(e: tokio::task::JoinError) -> Self {
        AppError(anyhow::anyhow!("task join error: {e}"))
    }
}

fn status_for(e: &LaunchpadError) -> StatusCode {
    match e {
        LaunchpadError::Validation(_) => StatusCode::BAD_REQUEST,
        LaunchpadError::Unauthorized => StatusCode::UNAUTHORIZED,
        LaunchpadError::Forbidden => StatusCode::FORBIDDEN,
        LaunchpadError::ChatNotFound(_) => StatusCode::NOT_FOUND,
        LaunchpadError::Upstream { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        LaunchpadError::Transport(_) | LaunchpadError::Decode(_) => StatusCode::BAD_GATEWAY,
        LaunchpadError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        LaunchpadError::Config(_)
        | LaunchpadError::Store(_)
        | LaunchpadError::Io(_)
        | LaunchpadError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }

        let status = match self.0.downcast_ref::<LaunchpadError>() {
            Some(e) => status_for(e),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
