//! Pure mapping from pipeline snapshots and result buckets to display rows.
//!
//! Shared by every pipeline so that all four progress views read the same.

use crate::kind::{Category, PipelineKind};
use crate::pipeline::{AgentState, AgentStatus, PipelineStatus};
use crate::results::CategoryResults;
use serde::Serialize;

pub fn status_icon(state: AgentState) -> &'static str {
    match state {
        AgentState::Pending => "○",
        AgentState::Running => "▶",
        AgentState::Retrying => "↻",
        AgentState::CoolingDown => "⏳",
        AgentState::Completed => "✓",
        AgentState::Failed => "✗",
    }
}

pub fn status_label(agent: &AgentStatus) -> String {
    match agent.status {
        AgentState::Pending => "waiting".to_string(),
        AgentState::Running => format!("running (attempt {})", agent.attempt),
        AgentState::Retrying => format!("retrying (attempt {})", agent.attempt),
        AgentState::CoolingDown => format!(
            "cooling down: {}s remaining",
            agent.cooldown_remaining.unwrap_or(0)
        ),
        AgentState::Completed => "completed".to_string(),
        AgentState::Failed => format!(
            "failed: {}",
            agent.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// One line of the progress view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRow {
    pub agent_name: String,
    pub display_name: String,
    pub category: Option<Category>,
    pub icon: &'static str,
    pub label: String,
    pub finding_count: usize,
    pub active: bool,
}

pub fn project(pipeline: &PipelineStatus) -> Vec<AgentRow> {
    pipeline
        .agents
        .iter()
        .map(|agent| AgentRow {
            agent_name: agent.agent_name.clone(),
            display_name: agent.display_name.clone(),
            category: Category::from_agent_name(&agent.agent_name),
            icon: status_icon(agent.status),
            label: status_label(agent),
            finding_count: agent.findings().len(),
            active: agent.status.is_active(),
        })
        .collect()
}

/// `(completed agents, total agents)`.
pub fn progress(pipeline: &PipelineStatus) -> (usize, usize) {
    (pipeline.completed_count(), pipeline.agents.len())
}

/// One category card of the results view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub category: Category,
    pub key: String,
    pub title: &'static str,
    pub items: Vec<String>,
}

pub fn category_views<R: CategoryResults>(results: &R) -> Vec<CategoryView> {
    R::KIND
        .stages()
        .into_iter()
        .map(|stage| CategoryView {
            category: stage.category,
            key: stage.result_key,
            title: stage.category.title(),
            items: results.bucket(stage.category).to_vec(),
        })
        .collect()
}

/// Placeholder snapshot shown before the first real one arrives: every
/// stage of `kind` pending, in execution order.
pub fn pending_pipeline(kind: PipelineKind, analysis_id: &str) -> PipelineStatus {
    let agents = kind
        .stages()
        .into_iter()
        .map(|stage| AgentStatus::pending(stage.agent_name, stage.display_name))
        .collect();
    PipelineStatus::queued(analysis_id, agents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{agent, snapshot};
    use crate::pipeline::PipelineState;
    use crate::results::{StrengthsResults, WeaknessesResults};

    #[test]
    fn labels_for_every_state() {
        let mut a = agent("tech_lead", AgentState::Pending);
        assert_eq!(status_label(&a), "waiting");

        a.status = AgentState::Running;
        a.attempt = 1;
        assert_eq!(status_label(&a), "running (attempt 1)");

        a.status = AgentState::Retrying;
        a.attempt = 2;
        assert_eq!(status_label(&a), "retrying (attempt 2)");

        a.status = AgentState::CoolingDown;
        a.cooldown_remaining = Some(9);
        assert_eq!(status_label(&a), "cooling down: 9s remaining");

        a.status = AgentState::Completed;
        assert_eq!(status_label(&a), "completed");

        a.status = AgentState::Failed;
        a.error = Some("rate limited".into());
        assert_eq!(status_label(&a), "failed: rate limited");
    }

    #[test]
    fn project_marks_active_row_and_counts_findings() {
        let mut done = agent("finance_advisor", AgentState::Completed);
        done.result = Some(vec!["a".into(), "b".into()]);
        let p = snapshot(
            PipelineState::Running,
            vec![
                done,
                agent("marketing_advisor", AgentState::Running),
                agent("tech_lead", AgentState::Pending),
            ],
        );
        let rows = project(&p);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].finding_count, 2);
        assert_eq!(rows[0].icon, "✓");
        assert_eq!(rows[0].category, Some(Category::Finance));
        assert!(rows[1].active);
        assert!(!rows[2].active);
        assert_eq!(rows[2].label, "waiting");
        assert_eq!(progress(&p), (1, 3));
    }

    #[test]
    fn category_views_use_kind_keys_and_titles() {
        let mut r = WeaknessesResults::default();
        r.org_hr_weaknesses.push("no cto".into());
        let views = category_views(&r);
        assert_eq!(views.len(), 5);
        assert_eq!(views[3].key, "org_hr_weaknesses");
        assert_eq!(views[3].title, "Organization & HR");
        assert_eq!(views[3].items, vec!["no cto"]);

        let s = category_views(&StrengthsResults::default());
        assert_eq!(s[2].key, "tech_strengths");
        assert_eq!(s[2].title, "Technology");
        assert!(s.iter().all(|v| v.items.is_empty()));
    }

    #[test]
    fn pending_pipeline_lists_every_stage_waiting() {
        let p = pending_pipeline(PipelineKind::Weaknesses, "a-3");
        assert_eq!(p.analysis_id, "a-3");
        assert_eq!(p.pipeline_status, PipelineState::Queued);
        assert!(p.check_invariants().is_empty());

        let rows = project(&p);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].display_name, "Finance Weaknesses");
        assert_eq!(rows[4].agent_name, "competitive_analyst");
        assert!(rows.iter().all(|r| r.label == "waiting" && !r.active));
        assert_eq!(progress(&p), (0, 5));
    }
}
