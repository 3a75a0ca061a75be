use crate::output::print_json;
use anyhow::{bail, Result};
use launchpad_core::config::{ServiceConfig, SESSION_COOKIE, SESSION_SECRET_VAR};
use launchpad_server::auth::sign_session;

pub fn run(identity: &str, json: bool) -> Result<()> {
    let identity = identity.trim();
    if identity.is_empty() {
        bail!("identity must not be empty");
    }
    let config = ServiceConfig::from_env();
    let Some(secret) = config.session_secret() else {
        bail!("{SESSION_SECRET_VAR} not configured");
    };

    let value = sign_session(secret, identity);
    if json {
        print_json(&serde_json::json!({
            "identity": identity,
            "session": value,
            "cookie": format!("{SESSION_COOKIE}={value}"),
        }))?;
    } else {
        println!("{value}");
    }
    Ok(())
}
