use launchpad_core::config::SESSION_COOKIE;
use launchpad_core::kind::PipelineKind;
use launchpad_core::upstream::extract_message;
use launchpad_core::validate::require_startup_data;
use serde::Deserialize;
use serde_json::Value;

use crate::{CrewClientError, Result};

/// Environment variable naming the launchpad server base URL.
pub const SERVER_URL_VAR: &str = "LAUNCHPAD_SERVER";

// ─── CrewEndpoint ─────────────────────────────────────────────────────────

/// Where one pipeline kind lives on the launchpad server, plus the session
/// used to talk to it.
#[derive(Debug, Clone)]
pub struct CrewEndpoint {
    base: String,
    kind: PipelineKind,
    session: Option<String>,
}

impl CrewEndpoint {
    /// Fails with `Config` when no base URL is set.
    pub fn new(base: Option<&str>, kind: PipelineKind) -> Result<Self> {
        let base = base
            .map(|b| b.trim().trim_end_matches('/'))
            .filter(|b| !b.is_empty())
            .ok_or_else(|| CrewClientError::Config(SERVER_URL_VAR.to_string()))?;
        Ok(Self {
            base: base.to_string(),
            kind,
            session: None,
        })
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    /// Submit and poll share one route: POST to start, GET `?id=` to poll.
    pub fn analysis_url(&self) -> String {
        format!("{}/api/crew/{}", self.base, self.kind)
    }

    pub fn default_stream_url(&self, analysis_id: &str) -> String {
        format!("{}/stream?id={analysis_id}", self.analysis_url())
    }

    /// Absolute URLs pass through; paths are joined to the base.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base, url.trim_start_matches('/'))
        }
    }

    pub(crate) fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session {
            Some(session) => req.header(
                reqwest::header::COOKIE,
                format!("{SESSION_COOKIE}={session}"),
            ),
            None => req,
        }
    }
}

// ─── Submitter ────────────────────────────────────────────────────────────

/// A submitted analysis, ready to stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisHandle {
    pub analysis_id: String,
    /// Absolute URL of the progress stream.
    pub stream_url: String,
}

#[derive(Debug, Deserialize)]
struct SubmitReply {
    analysis_id: String,
    #[serde(default)]
    stream_url: Option<String>,
}

pub struct Submitter {
    http: reqwest::Client,
    endpoint: CrewEndpoint,
}

impl Submitter {
    pub fn new(http: reqwest::Client, endpoint: CrewEndpoint) -> Self {
        Self { http, endpoint }
    }

    /// Start one analysis. Never retries.
    ///
    /// `payload` must carry `startup_data`; that is checked before any
    /// network call.
    pub async fn submit(&self, payload: &Value) -> Result<AnalysisHandle> {
        require_startup_data(payload)?;

        let url = self.endpoint.analysis_url();
        tracing::debug!(%url, kind = %self.endpoint.kind(), "submitting analysis");
        let resp = self
            .endpoint
            .authorize(self.http.post(&url))
            .json(payload)
            .send()
            .await
            .map_err(|e| CrewClientError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CrewClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = extract_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(CrewClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let reply: SubmitReply =
            serde_json::from_str(&body).map_err(|e| CrewClientError::Decode(e.to_string()))?;
        let stream_url = match reply.stream_url.as_deref() {
            Some(u) if !u.is_empty() => self.endpoint.resolve(u),
            _ => self.endpoint.default_stream_url(&reply.analysis_id),
        };
        tracing::info!(analysis_id = %reply.analysis_id, "analysis queued");
        Ok(AnalysisHandle {
            analysis_id: reply.analysis_id,
            stream_url,
        })
    }
}
