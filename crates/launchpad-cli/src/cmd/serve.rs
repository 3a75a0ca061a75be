use anyhow::{Context, Result};
use launchpad_core::config::ServiceConfig;
use launchpad_core::store::RedbStore;
use launchpad_server::AppState;
use std::path::Path;
use std::sync::Arc;

pub fn run(port: u16, db: &Path, open_browser: bool) -> Result<()> {
    let config = ServiceConfig::from_env();
    for (service, var, configured) in config.summary() {
        if !configured {
            tracing::debug!(%service, var, "service not configured");
        }
    }

    let store = RedbStore::open(db)
        .with_context(|| format!("failed to open document store at {}", db.display()))?;
    let state = AppState::new(config, Arc::new(store));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(launchpad_server::serve(state, port, open_browser))
}
