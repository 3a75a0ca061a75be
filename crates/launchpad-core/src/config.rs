use crate::error::{LaunchpadError, Result};
use crate::kind::PipelineKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// An external collaborator addressed by a base URL from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Crew(PipelineKind),
    Rag,
    Pitcher,
    Predictor,
    Enhancer,
    InvestorWorkflow,
}

impl Service {
    pub fn all() -> Vec<Service> {
        let mut all: Vec<Service> = PipelineKind::all()
            .iter()
            .copied()
            .map(Service::Crew)
            .collect();
        all.extend([
            Service::Rag,
            Service::Pitcher,
            Service::Predictor,
            Service::Enhancer,
            Service::InvestorWorkflow,
        ]);
        all
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Service::Crew(kind) => kind.env_var(),
            Service::Rag => "MULTIMODAL_RAG",
            Service::Pitcher => "PITCHER_AGENT_URL",
            Service::Predictor => "STARTUP_SUCCESS_PREDICTOR",
            Service::Enhancer => "STARTUP_IDEA_ENHANCEMENT",
            Service::InvestorWorkflow => "INVESTOR_WORKFLOW_URL",
        }
    }

    /// Message used when the service is needed but unset.
    fn missing_message(self) -> String {
        match self {
            Service::Crew(_) | Service::Pitcher => self.env_var().to_string(),
            Service::Rag => "RAG service".to_string(),
            Service::Predictor => "Prediction service".to_string(),
            Service::Enhancer => "Enhancement service".to_string(),
            Service::InvestorWorkflow => "Investor workflow".to_string(),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Crew(kind) => write!(f, "crew:{kind}"),
            Service::Rag => f.write_str("rag"),
            Service::Pitcher => f.write_str("pitcher"),
            Service::Predictor => f.write_str("predictor"),
            Service::Enhancer => f.write_str("enhancer"),
            Service::InvestorWorkflow => f.write_str("investor"),
        }
    }
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

pub const SESSION_SECRET_VAR: &str = "SESSION_SECRET";

/// Cookie carrying the signed session value.
pub const SESSION_COOKIE: &str = "launchpad_session";

/// Base URLs for every external service plus the session signing secret.
///
/// Missing entries are not an error at load time: a request that needs an
/// unset service fails closed through [`ServiceConfig::require`].
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    urls: BTreeMap<Service, String>,
    session_secret: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Tests use this instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut urls = BTreeMap::new();
        for service in Service::all() {
            if let Some(url) = non_empty(lookup(service.env_var())) {
                urls.insert(service, url.trim_end_matches('/').to_string());
            }
        }
        Self {
            urls,
            session_secret: non_empty(lookup(SESSION_SECRET_VAR)),
        }
    }

    pub fn with_service(mut self, service: Service, url: impl Into<String>) -> Self {
        let url = url.into();
        self.urls
            .insert(service, url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = Some(secret.into());
        self
    }

    pub fn get(&self, service: Service) -> Option<&str> {
        self.urls.get(&service).map(String::as_str)
    }

    /// Base URL for `service`, or a `Config` error naming what is missing.
    pub fn require(&self, service: Service) -> Result<&str> {
        self.get(service)
            .ok_or_else(|| LaunchpadError::Config(service.missing_message()))
    }

    pub fn session_secret(&self) -> Option<&str> {
        self.session_secret.as_deref()
    }

    /// `(service, env var, configured)` for every known service.
    pub fn summary(&self) -> Vec<(Service, &'static str, bool)> {
        Service::all()
            .into_iter()
            .map(|s| (s, s.env_var(), self.urls.contains_key(&s)))
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_and_trims_trailing_slash() {
        let cfg = ServiceConfig::from_lookup(lookup(&[(
            "CREWAI_ROADMAP_URL",
            "http://roadmap:8000/",
        )]));
        assert_eq!(
            cfg.get(Service::Crew(PipelineKind::Roadmap)),
            Some("http://roadmap:8000")
        );
    }

    #[test]
    fn empty_value_counts_as_unset() {
        let cfg = ServiceConfig::from_lookup(lookup(&[("MULTIMODAL_RAG", "  ")]));
        assert!(cfg.get(Service::Rag).is_none());
    }

    #[test]
    fn require_missing_crew_names_the_variable() {
        let cfg = ServiceConfig::default();
        let err = cfg
            .require(Service::Crew(PipelineKind::Weaknesses))
            .unwrap_err();
        assert!(matches!(err, LaunchpadError::Config(_)));
        assert_eq!(err.to_string(), "CREWAI_WEAKNESSES_URL not configured");
    }

    #[test]
    fn require_missing_rag_uses_service_name() {
        let err = ServiceConfig::default().require(Service::Rag).unwrap_err();
        assert_eq!(err.to_string(), "RAG service not configured");
    }

    #[test]
    fn session_secret_is_loaded() {
        let cfg = ServiceConfig::from_lookup(lookup(&[("SESSION_SECRET", "s3cret")]));
        assert_eq!(cfg.session_secret(), Some("s3cret"));
    }

    #[test]
    fn summary_lists_every_service() {
        let cfg = ServiceConfig::default().with_service(Service::Pitcher, "http://p");
        let summary = cfg.summary();
        assert_eq!(summary.len(), Service::all().len());
        assert!(summary
            .iter()
            .any(|(s, var, ok)| *s == Service::Pitcher && *var == "PITCHER_AGENT_URL" && *ok));
        assert!(summary
            .iter()
            .any(|(s, _, ok)| *s == Service::Rag && !*ok));
    }
}
