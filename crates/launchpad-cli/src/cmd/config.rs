use crate::output::{print_json, print_table};
use anyhow::Result;
use launchpad_core::config::ServiceConfig;

pub fn run(json: bool) -> Result<()> {
    let config = ServiceConfig::from_env();
    let summary = config.summary();

    if json {
        let services: Vec<serde_json::Value> = summary
            .iter()
            .map(|(service, var, configured)| {
                serde_json::json!({
                    "service": service.to_string(),
                    "env_var": var,
                    "configured": configured,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "services": services,
            "session_secret": config.session_secret().is_some(),
        }))?;
        return Ok(());
    }

    let mut rows: Vec<Vec<String>> = summary
        .iter()
        .map(|(service, var, configured)| {
            vec![
                service.to_string(),
                var.to_string(),
                yes_no(*configured).to_string(),
            ]
        })
        .collect();
    rows.push(vec![
        "session".to_string(),
        launchpad_core::config::SESSION_SECRET_VAR.to_string(),
        yes_no(config.session_secret().is_some()).to_string(),
    ]);
    print_table(&["SERVICE", "VARIABLE", "CONFIGURED"], rows);
    Ok(())
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}
