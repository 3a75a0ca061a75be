//! Terminal reconciliation of a pipeline run.
//!
//! Once the progress stream ends, for whatever reason, the authoritative
//! result is fetched once and run through [`reconcile`]. The decision table
//! always produces a terminal [`Outcome`]: a run never stays "in progress"
//! after reconciliation.

use crate::pipeline::PipelineStatus;
use crate::results::{reconstruct_from_agents, CategoryResults};
use serde::{Deserialize, Serialize};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch results";
const DEFAULT_FAILURE_MESSAGE: &str = "Analysis failed";

// ---------------------------------------------------------------------------
// Poll payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Queued,
    Processing,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Body of `GET <results>?id=<analysis_id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "R: CategoryResults")]
pub struct FinalResult<R> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    pub status: AnalysisState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Where the completed buckets came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Top-level `result` of the poll payload.
    Authoritative,
    /// Re-keyed from completed agents' individual results.
    Reconstructed,
    /// Nothing usable; empty buckets so the view still terminates.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<R> {
    Completed {
        results: R,
        source: ResultSource,
    },
    Failed {
        error: String,
        /// Partial buckets still worth rendering.
        #[serde(skip_serializing_if = "Option::is_none")]
        partial: Option<R>,
    },
}

impl<R: CategoryResults> Outcome<R> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    /// Buckets to render, completed or partial.
    pub fn results(&self) -> Option<&R> {
        match self {
            Outcome::Completed { results, .. } => Some(results),
            Outcome::Failed { partial, .. } => partial.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Completed { .. } => None,
            Outcome::Failed { error, .. } => Some(error),
        }
    }
}

/// Outcome plus the last pipeline snapshot the poll carried, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciled<R> {
    pub outcome: Outcome<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineStatus>,
}

/// Apply the reconciliation decision table, first matching row wins:
///
/// 1. `completed` with a result: adopt it.
/// 2. `failed`: surface the error and keep whatever partial result exists.
/// 3. pipelines that allow it, with completed agents: rebuild from agents.
/// 4. otherwise: completed with empty buckets.
pub fn reconcile<R: CategoryResults>(payload: FinalResult<R>) -> Reconciled<R> {
    let FinalResult {
        status,
        result,
        error,
        pipeline,
        ..
    } = payload;

    let reconstruct = || {
        if !R::KIND.reconstructs_from_agents() {
            return None;
        }
        pipeline
            .as_ref()
            .filter(|p| p.has_completed_agents())
            .and_then(|p| reconstruct_from_agents::<R>(&p.agents))
    };

    let outcome = match (status, result) {
        (AnalysisState::Completed, Some(results)) => Outcome::Completed {
            results,
            source: ResultSource::Authoritative,
        },
        (AnalysisState::Failed, result) => Outcome::Failed {
            error: error.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            partial: result.or_else(reconstruct),
        },
        (_, _) => match reconstruct() {
            Some(results) => Outcome::Completed {
                results,
                source: ResultSource::Reconstructed,
            },
            None => Outcome::Completed {
                results: R::default(),
                source: ResultSource::Empty,
            },
        },
    };

    Reconciled { outcome, pipeline }
}

/// Outcome when the final fetch itself could not be completed.
pub fn fetch_failed<R>() -> Reconciled<R> {
    Reconciled {
        outcome: Outcome::Failed {
            error: FETCH_FAILED_MESSAGE.to_string(),
            partial: None,
        },
        pipeline: None,
    }
}
