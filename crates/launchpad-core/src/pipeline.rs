use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AgentState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Pending,
    Running,
    Retrying,
    CoolingDown,
    Completed,
    Failed,
}

impl AgentState {
    /// Running, retrying or cooling down. At most one agent may be active.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            AgentState::Running | AgentState::Retrying | AgentState::CoolingDown
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::Pending => "pending",
            AgentState::Running => "running",
            AgentState::Retrying => "retrying",
            AgentState::CoolingDown => "cooling_down",
            AgentState::Completed => "completed",
            AgentState::Failed => "failed",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Queued => "queued",
            PipelineState::Running => "running",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AgentStatus / PipelineStatus
// ---------------------------------------------------------------------------

fn default_attempt() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_name: String,
    pub display_name: String,
    pub status: AgentState,
    #[serde(default = "default_attempt")]
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Seconds left in the inter-agent delay; meaningful only while cooling down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<String>>,
}

impl AgentStatus {
    pub fn pending(agent_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            display_name: display_name.into(),
            status: AgentState::Pending,
            attempt: 1,
            started_at: None,
            completed_at: None,
            cooldown_remaining: None,
            error: None,
            result: None,
        }
    }

    /// Findings, empty until the agent completes.
    pub fn findings(&self) -> &[String] {
        self.result.as_deref().unwrap_or(&[])
    }
}

/// Full snapshot of a sequential pipeline. The event stream sends these
/// whole; the newest snapshot replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub analysis_id: String,
    pub pipeline_status: PipelineState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub agents: Vec<AgentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub total_cooldown_seconds: u32,
}

/// A broken protocol rule observed in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `pipeline_status == completed` but some agent is not completed.
    CompletedWithUnfinishedAgents(Vec<String>),
    /// Every agent completed but the pipeline does not say so.
    AllAgentsCompletedButPipelineIs(PipelineState),
    /// `pipeline_status == failed` without any failed agent.
    FailedWithoutFailedAgent,
    /// More than one agent running, retrying or cooling down.
    ConcurrentAgents(Vec<String>),
    /// An agent after the failed one made progress.
    ProgressAfterFailure(String),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::CompletedWithUnfinishedAgents(names) => {
                write!(f, "pipeline completed but agents unfinished: {}", names.join(", "))
            }
            InvariantViolation::AllAgentsCompletedButPipelineIs(state) => {
                write!(f, "all agents completed but pipeline is {state}")
            }
            InvariantViolation::FailedWithoutFailedAgent => {
                f.write_str("pipeline failed without a failed agent")
            }
            InvariantViolation::ConcurrentAgents(names) => {
                write!(f, "more than one active agent: {}", names.join(", "))
            }
            InvariantViolation::ProgressAfterFailure(name) => {
                write!(f, "agent '{name}' progressed after a failure")
            }
        }
    }
}

impl PipelineStatus {
    /// A fresh queued snapshot with every agent pending.
    pub fn queued(analysis_id: impl Into<String>, agents: Vec<AgentStatus>) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            pipeline_status: PipelineState::Queued,
            current_agent: None,
            current_phase: None,
            agents,
            started_at: None,
            completed_at: None,
            total_cooldown_seconds: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.pipeline_status.is_terminal()
    }

    pub fn active_agent(&self) -> Option<&AgentStatus> {
        self.agents.iter().find(|a| a.status.is_active())
    }

    pub fn completed_count(&self) -> usize {
        self.agents
            .iter()
            .filter(|a| a.status == AgentState::Completed)
            .count()
    }

    pub fn has_completed_agents(&self) -> bool {
        self.completed_count() > 0
    }

    /// Every protocol rule this snapshot breaks. Empty means well-formed.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        let unfinished: Vec<String> = self
            .agents
            .iter()
            .filter(|a| a.status != AgentState::Completed)
            .map(|a| a.agent_name.clone())
            .collect();
        let all_completed = !self.agents.is_empty() && unfinished.is_empty();

        if self.pipeline_status == PipelineState::Completed && !unfinished.is_empty() {
            violations.push(InvariantViolation::CompletedWithUnfinishedAgents(unfinished));
        }
        if all_completed && self.pipeline_status != PipelineState::Completed {
            violations.push(InvariantViolation::AllAgentsCompletedButPipelineIs(
                self.pipeline_status,
            ));
        }

        let failed_at = self
            .agents
            .iter()
            .position(|a| a.status == AgentState::Failed);
        if self.pipeline_status == PipelineState::Failed && failed_at.is_none() {
            violations.push(InvariantViolation::FailedWithoutFailedAgent);
        }
        if self.pipeline_status == PipelineState::Failed {
            if let Some(idx) = failed_at {
                if let Some(later) = self.agents[idx + 1..]
                    .iter()
                    .find(|a| a.status != AgentState::Pending)
                {
                    violations.push(InvariantViolation::ProgressAfterFailure(
                        later.agent_name.clone(),
                    ));
                }
            }
        }

        let active: Vec<String> = self
            .agents
            .iter()
            .filter(|a| a.status.is_active())
            .map(|a| a.agent_name.clone())
            .collect();
        if active.len() > 1 {
            violations.push(InvariantViolation::ConcurrentAgents(active));
        }

        violations
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn agent(name: &str, status: AgentState) -> AgentStatus {
        let mut a = AgentStatus::pending(name, name);
        a.status = status;
        a
    }

    pub(crate) fn snapshot(state: PipelineState, agents: Vec<AgentStatus>) -> PipelineStatus {
        let mut p = PipelineStatus::queued("a-1", agents);
        p.pipeline_status = state;
        p
    }

    #[test]
    fn decodes_backend_snapshot() {
        let json = r#"{
            "analysis_id": "abc",
            "pipeline_status": "running",
            "current_agent": "Finance Suggestions",
            "current_phase": "cooling_down",
            "agents": [
                {"agent_name":"finance_advisor","display_name":"Finance Suggestions",
                 "status":"cooling_down","attempt":1,"cooldown_remaining":12,
                 "result":["cut burn"]},
                {"agent_name":"marketing_advisor","display_name":"Marketing Suggestions",
                 "status":"pending","attempt":1}
            ],
            "started_at": "2025-01-01T00:00:00",
            "completed_at": null,
            "total_cooldown_seconds": 15
        }"#;
        let p: PipelineStatus = serde_json::from_str(json).unwrap();
        assert_eq!(p.pipeline_status, PipelineState::Running);
        assert_eq!(p.agents[0].status, AgentState::CoolingDown);
        assert_eq!(p.agents[0].cooldown_remaining, Some(12));
        assert_eq!(p.active_agent().unwrap().agent_name, "finance_advisor");
        assert!(p.check_invariants().is_empty());
        assert!(!p.is_terminal());
    }

    #[test]
    fn attempt_defaults_to_one() {
        let a: AgentStatus = serde_json::from_str(
            r#"{"agent_name":"tech_lead","display_name":"Tech","status":"pending"}"#,
        )
        .unwrap();
        assert_eq!(a.attempt, 1);
        assert!(a.findings().is_empty());
    }

    #[test]
    fn completed_requires_every_agent_completed() {
        let p = snapshot(
            PipelineState::Completed,
            vec![
                agent("finance_advisor", AgentState::Completed),
                agent("tech_lead", AgentState::Pending),
            ],
        );
        assert_eq!(
            p.check_invariants(),
            vec![InvariantViolation::CompletedWithUnfinishedAgents(vec![
                "tech_lead".into()
            ])]
        );
    }

    #[test]
    fn all_completed_implies_pipeline_completed() {
        let p = snapshot(
            PipelineState::Running,
            vec![
                agent("finance_advisor", AgentState::Completed),
                agent("tech_lead", AgentState::Completed),
            ],
        );
        assert_eq!(
            p.check_invariants(),
            vec![InvariantViolation::AllAgentsCompletedButPipelineIs(
                PipelineState::Running
            )]
        );

        let done = snapshot(
            PipelineState::Completed,
            vec![
                agent("finance_advisor", AgentState::Completed),
                agent("tech_lead", AgentState::Completed),
            ],
        );
        assert!(done.check_invariants().is_empty());
        assert!(done.is_terminal());
    }

    #[test]
    fn at_most_one_active_agent() {
        let p = snapshot(
            PipelineState::Running,
            vec![
                agent("finance_advisor", AgentState::Running),
                agent("marketing_advisor", AgentState::Retrying),
            ],
        );
        assert_eq!(
            p.check_invariants(),
            vec![InvariantViolation::ConcurrentAgents(vec![
                "finance_advisor".into(),
                "marketing_advisor".into()
            ])]
        );
    }

    #[test]
    fn failed_pipeline_leaves_remaining_agents_pending() {
        let ok = snapshot(
            PipelineState::Failed,
            vec![
                agent("finance_advisor", AgentState::Completed),
                agent("marketing_advisor", AgentState::Failed),
                agent("tech_lead", AgentState::Pending),
            ],
        );
        assert!(ok.check_invariants().is_empty());

        let bad = snapshot(
            PipelineState::Failed,
            vec![
                agent("finance_advisor", AgentState::Failed),
                agent("marketing_advisor", AgentState::Completed),
            ],
        );
        assert_eq!(
            bad.check_invariants(),
            vec![InvariantViolation::ProgressAfterFailure(
                "marketing_advisor".into()
            )]
        );
    }

    #[test]
    fn failed_without_failed_agent_is_reported() {
        let p = snapshot(
            PipelineState::Failed,
            vec![agent("finance_advisor", AgentState::Pending)],
        );
        assert_eq!(
            p.check_invariants(),
            vec![InvariantViolation::FailedWithoutFailedAgent]
        );
    }

    #[test]
    fn cooling_down_serializes_snake_case() {
        let json = serde_json::to_value(AgentState::CoolingDown).unwrap();
        assert_eq!(json, "cooling_down");
    }
}
