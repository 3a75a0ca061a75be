//! Upstream relay helpers shared by the pass-through routes.
//!
//! Every route forwards to an external service, then either relays the JSON
//! reply, relays a server-sent event stream, or normalizes the failure into
//! an [`AppError`].

use axum::{body::Body, http::StatusCode, response::Response, Json};
use futures::StreamExt;
use launchpad_core::upstream::extract_message;
use launchpad_core::LaunchpadError;
use serde_json::Value;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Hop-by-hop headers — must not be forwarded in either direction.
// ---------------------------------------------------------------------------

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers the event-stream relay always sets itself.
const SSE_OWNED: &[&str] = &["content-type", "cache-control", "content-length", "x-accel-buffering"];

// ---------------------------------------------------------------------------
// Upstream URLs
// ---------------------------------------------------------------------------

/// `base` followed by `segments`, each percent-encoded as exactly one path
/// segment. Caller-supplied ids cannot climb into other upstream routes.
pub(crate) fn upstream_url(base: &str, segments: &[&str]) -> Result<reqwest::Url, AppError> {
    if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
        return Err(AppError::bad_request("Invalid identifier"));
    }
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| AppError(anyhow::anyhow!("invalid upstream URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| AppError(anyhow::anyhow!("upstream URL {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

/// Send an upstream request. Connection failures become `Transport` carrying
/// `context` as the client-facing message.
pub(crate) async fn send(
    req: reqwest::RequestBuilder,
    context: &str,
) -> Result<reqwest::Response, AppError> {
    req.send().await.map_err(|e| {
        tracing::warn!(error = %e, "{context}");
        AppError(LaunchpadError::Transport(context.to_string()).into())
    })
}

// ---------------------------------------------------------------------------
// JSON relay
// ---------------------------------------------------------------------------

/// How a non-2xx upstream reply is reported to the client.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure<'a> {
    /// Keep the upstream status, answer with a fixed message.
    Fixed(&'a str),
    /// Keep the upstream status, prefer the upstream `detail`/`error`
    /// message and fall back to the given one.
    Detail(&'a str),
    /// Answer 503 with a fixed message regardless of the upstream status.
    Unavailable(&'a str),
}

impl Failure<'_> {
    fn into_error(self, status: StatusCode, body: &str) -> AppError {
        match self {
            Failure::Fixed(msg) => AppError::upstream(status.as_u16(), msg),
            Failure::Detail(fallback) => AppError::upstream(
                status.as_u16(),
                extract_message(body).unwrap_or_else(|| fallback.to_string()),
            ),
            Failure::Unavailable(msg) => AppError::unavailable(msg),
        }
    }
}

/// Relay a JSON reply, or turn a non-2xx reply into an error per `failure`.
pub(crate) async fn relay_json(
    resp: reqwest::Response,
    failure: Failure<'_>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(read_json(resp, failure).await?))
}

/// Like [`relay_json`] but hands the decoded body back for reshaping.
pub(crate) async fn read_json(resp: reqwest::Response, failure: Failure<'_>) -> Result<Value, AppError> {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let url = resp.url().clone();
    let body = resp
        .text()
        .await
        .map_err(|e| AppError(LaunchpadError::Transport(e.to_string()).into()))?;

    if !status.is_success() {
        tracing::warn!(%url, status = status.as_u16(), body = %body, "upstream rejected request");
        return Err(failure.into_error(status, &body));
    }

    // Some upstreams answer 204 or an empty 200.
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| AppError(LaunchpadError::Decode(format!("{url}: {e}")).into()))
}

// ---------------------------------------------------------------------------
// Event-stream relay
// ---------------------------------------------------------------------------

/// Forward an upstream `text/event-stream` body without buffering.
///
/// End-to-end headers other than the ones the relay owns are copied; the
/// body is streamed chunk by chunk so the client sees each snapshot as soon
/// as the upstream emits it.
pub(crate) fn relay_event_stream(resp: reqwest::Response) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/event-stream")
        .header("Cache-Control", "no-cache")
        .header("X-Accel-Buffering", "no");

    for (name, value) in resp.headers() {
        let lower = name.as_str().to_ascii_lowercase();
        if HOP_BY_HOP.contains(&lower.as_str()) || SSE_OWNED.contains(&lower.as_str()) {
            continue;
        }
        if let Ok(v) = axum::http::HeaderValue::from_bytes(value.as_bytes()) {
            builder = builder.header(name.as_str(), v);
        }
    }

    let stream = resp
        .bytes_stream()
        .map(|chunk| chunk.map_err(std::io::Error::other));
    builder
        .body(Body::from_stream(stream))
        .expect("infallible: all header values are valid ASCII")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
