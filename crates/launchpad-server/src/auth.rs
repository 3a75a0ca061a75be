use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use launchpad_core::config::{SESSION_COOKIE, SESSION_SECRET_VAR};
use launchpad_core::LaunchpadError;
use sha2::Sha256;

use crate::error::AppError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// The authenticated user, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Session values
// ---------------------------------------------------------------------------

fn mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("infallible: HMAC takes keys of any length")
}

/// Mint a session value `<b64url(identity)>.<b64url(hmac-sha256)>`.
pub fn sign_session(secret: &str, identity: &str) -> String {
    let mut m = mac(secret);
    m.update(identity.as_bytes());
    let sig = m.finalize().into_bytes();
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(identity.as_bytes()),
        URL_SAFE_NO_PAD.encode(sig)
    )
}

/// Identity carried by a session value, or `None` when it is malformed or
/// was signed with another secret.
pub fn verify_session(secret: &str, value: &str) -> Option<Identity> {
    let (payload, sig) = value.split_once('.')?;
    let identity = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let sig = URL_SAFE_NO_PAD.decode(sig).ok()?;

    let mut m = mac(secret);
    m.update(&identity);
    m.verify_slice(&sig).ok()?;

    let identity = String::from_utf8(identity).ok()?;
    if identity.is_empty() {
        return None;
    }
    Some(Identity(identity))
}

fn session_cookie(req: &Request) -> Option<&str> {
    let cookies = req.headers().get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
    })
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Gate `/api/*` behind a signed session cookie.
///
/// `/api/health` and anything outside `/api/` pass through. Without a
/// configured secret every gated request fails closed with a 500.
pub async fn auth_middleware(State(app): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api/") || path == "/api/health" {
        return next.run(req).await;
    }

    let Some(secret) = app.config.session_secret() else {
        return AppError(LaunchpadError::Config(SESSION_SECRET_VAR.to_string()).into())
            .into_response();
    };

    match session_cookie(&req).and_then(|v| verify_session(secret, v)) {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        None => unauthorized(),
    }
}

fn unauthorized() -> Response {
    Response::builder()
        .status(401)
        .header("Content-Type", "application/json")
        .body(Body::from(concat!(
            r#"{"error":"Authentication required","code":"AUTH_REQUIRED","#,
            r#""message":"Please sign in to use this feature"}"#,
        )))
        .expect("infallible: all header values are valid ASCII")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
