use std::sync::Arc;

use launchpad_core::config::ServiceConfig;
use launchpad_core::store::DocumentStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub http_client: reqwest::Client,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: ServiceConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: Arc::new(config),
            http_client: reqwest::Client::new(),
            store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::config::Service;
    use launchpad_core::store::MemoryStore;

    #[test]
    fn new_state_keeps_config() {
        let config = ServiceConfig::default().with_service(Service::Rag, "http://rag:9000");
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        assert_eq!(state.config.get(Service::Rag), Some("http://rag:9000"));
        assert!(state.config.session_secret().is_none());
    }
}
