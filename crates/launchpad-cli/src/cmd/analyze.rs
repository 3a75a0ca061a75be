use crate::output::{print_json, print_table};
use anyhow::{bail, Context, Result};
use crew_client::{CrewEndpoint, Phase, PipelineDriver};
use launchpad_core::kind::PipelineKind;
use launchpad_core::pipeline::PipelineStatus;
use launchpad_core::projection;
use launchpad_core::reconcile::Outcome;
use launchpad_core::results::{
    CategoryResults, RoadmapResults, StrengthsResults, SuggestionsResults, WeaknessesResults,
};
use serde_json::{json, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(
    kind: PipelineKind,
    input: &Path,
    server: Option<&str>,
    session: Option<&str>,
    json: bool,
) -> Result<()> {
    let payload = load_payload(input)?;
    let mut endpoint = CrewEndpoint::new(server, kind)?;
    if let Some(session) = session {
        endpoint = endpoint.with_session(session);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        match kind {
            PipelineKind::Roadmap => drive::<RoadmapResults>(endpoint, &payload, json).await,
            PipelineKind::Strengths => drive::<StrengthsResults>(endpoint, &payload, json).await,
            PipelineKind::Weaknesses => drive::<WeaknessesResults>(endpoint, &payload, json).await,
            PipelineKind::Suggestions => {
                drive::<SuggestionsResults>(endpoint, &payload, json).await
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn load_payload(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(wrap_payload(value))
}

/// Accept a submit body, a saved-form reply, or a bare form.
fn wrap_payload(value: Value) -> Value {
    if value.get("startup_data").is_some() {
        return value;
    }
    if let Some(form) = value.get("formData").filter(|f| !f.is_null()) {
        return json!({ "startup_data": form });
    }
    json!({ "startup_data": value })
}

// ---------------------------------------------------------------------------
// Driving
// ---------------------------------------------------------------------------

async fn drive<R: CategoryResults>(endpoint: CrewEndpoint, payload: &Value, json: bool) -> Result<()> {
    let driver = PipelineDriver::<R>::new(reqwest::Client::new(), endpoint);

    let mut view = driver.subscribe();
    let printer = tokio::spawn(async move {
        let mut last: Option<PipelineStatus> = None;
        while view.changed().await.is_ok() {
            let (phase, analysis_id, snapshot) = {
                let v = view.borrow_and_update();
                (v.phase, v.analysis_id.clone(), v.snapshot.clone())
            };
            let shown = match (snapshot, analysis_id) {
                (Some(snapshot), _) => Some(snapshot),
                // Nothing streamed yet: show the stages as waiting.
                (None, Some(id)) if phase == Phase::Connecting => {
                    Some(projection::pending_pipeline(R::KIND, &id))
                }
                _ => None,
            };
            if let Some(shown) = shown {
                if last.as_ref() != Some(&shown) {
                    if !json {
                        print_progress(&shown);
                    }
                    last = Some(shown);
                }
            }
            if phase.is_terminal() {
                break;
            }
        }
    });

    let result = {
        let run = driver.run(payload);
        tokio::pin!(run);
        tokio::select! {
            r = &mut run => r,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; closing stream");
                driver.close();
                run.await
            }
        }
    };

    let final_view = driver.view();
    drop(driver);
    let _ = printer.await;

    let reconciled = match result? {
        Some(r) => r,
        None => bail!("analysis cancelled before results were fetched"),
    };

    if json {
        print_json(&final_view)?;
    } else if let Some(results) = reconciled.outcome.results() {
        print_results(results);
    }

    match &reconciled.outcome {
        Outcome::Completed { .. } => Ok(()),
        Outcome::Failed { error, .. } => bail!("analysis failed: {error}"),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_progress(snapshot: &PipelineStatus) {
    let (done, total) = projection::progress(snapshot);
    println!();
    println!(
        "{}  {}  {done}/{total} agents complete",
        snapshot.analysis_id, snapshot.pipeline_status
    );
    let rows: Vec<Vec<String>> = projection::project(snapshot)
        .into_iter()
        .map(|row| {
            vec![
                row.icon.to_string(),
                row.display_name,
                row.label,
                row.finding_count.to_string(),
            ]
        })
        .collect();
    print_table(&["", "AGENT", "STATUS", "FINDINGS"], rows);
}

fn print_results<R: CategoryResults>(results: &R) {
    for view in projection::category_views(results) {
        println!();
        println!("{}", view.title);
        if view.items.is_empty() {
            println!("  (none)");
        }
        for item in &view.items {
            println!("  - {item}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_form_is_wrapped() {
        let wrapped = wrap_payload(json!({"startup_name": "Acme"}));
        assert_eq!(wrapped, json!({"startup_data": {"startup_name": "Acme"}}));
    }

    #[test]
    fn submit_body_is_kept() {
        let body = json!({"startup_data": {"startup_name": "Acme"}});
        assert_eq!(wrap_payload(body.clone()), body);
    }

    #[test]
    fn saved_form_reply_is_unwrapped() {
        let wrapped = wrap_payload(json!({"formData": {"stage": "seed"}}));
        assert_eq!(wrapped, json!({"startup_data": {"stage": "seed"}}));
    }
}
