//! Category result buckets for the four pipelines.
//!
//! Every pipeline produces the same shape: five ordered lists of findings,
//! one per [`Category`], under pipeline-specific keys (`finance_roadmap`,
//! `tech_strengths`, ...). [`CategoryResults`] lets the driver and the
//! reconciler stay generic over which pipeline they serve.

use crate::kind::{Category, PipelineKind};
use crate::pipeline::{AgentState, AgentStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait CategoryResults:
    Serialize + DeserializeOwned + Default + Clone + std::fmt::Debug + PartialEq + Send + Sync + 'static
{
    const KIND: PipelineKind;

    fn bucket(&self, category: Category) -> &[String];

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<String>;

    fn is_empty(&self) -> bool {
        Category::all().iter().all(|&c| self.bucket(c).is_empty())
    }

    fn total_findings(&self) -> usize {
        Category::all().iter().map(|&c| self.bucket(c).len()).sum()
    }
}

macro_rules! category_results {
    ($(#[$meta:meta])* $name:ident, $kind:expr, {
        finance: $finance:ident,
        marketing: $marketing:ident,
        tech: $tech:ident,
        org_hr: $org_hr:ident,
        competitive: $competitive:ident $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
        pub struct $name {
            #[serde(default)]
            pub $finance: Vec<String>,
            #[serde(default)]
            pub $marketing: Vec<String>,
            #[serde(default)]
            pub $tech: Vec<String>,
            #[serde(default)]
            pub $org_hr: Vec<String>,
            #[serde(default)]
            pub $competitive: Vec<String>,
        }

        impl CategoryResults for $name {
            const KIND: PipelineKind = $kind;

            fn bucket(&self, category: Category) -> &[String] {
                match category {
                    Category::Finance => &self.$finance,
                    Category::Marketing => &self.$marketing,
                    Category::Tech => &self.$tech,
                    Category::OrgHr => &self.$org_hr,
                    Category::Competitive => &self.$competitive,
                }
            }

            fn bucket_mut(&mut self, category: Category) -> &mut Vec<String> {
                match category {
                    Category::Finance => &mut self.$finance,
                    Category::Marketing => &mut self.$marketing,
                    Category::Tech => &mut self.$tech,
                    Category::OrgHr => &mut self.$org_hr,
                    Category::Competitive => &mut self.$competitive,
                }
            }
        }
    };
}

category_results!(
    /// Next-month roadmap items per category.
    RoadmapResults, PipelineKind::Roadmap, {
        finance: finance_roadmap,
        marketing: marketing_roadmap,
        tech: tech_roadmap,
        org_hr: org_hr_roadmap,
        competitive: competitive_roadmap,
    }
);

category_results!(StrengthsResults, PipelineKind::Strengths, {
    finance: finance_strengths,
    marketing: marketing_strengths,
    tech: tech_strengths,
    org_hr: org_hr_strengths,
    competitive: competitive_strengths,
});

category_results!(WeaknessesResults, PipelineKind::Weaknesses, {
    finance: finance_weaknesses,
    marketing: marketing_weaknesses,
    tech: tech_weaknesses,
    org_hr: org_hr_weaknesses,
    competitive: competitive_weaknesses,
});

category_results!(SuggestionsResults, PipelineKind::Suggestions, {
    finance: finance_suggestions,
    marketing: marketing_suggestions,
    tech: tech_suggestions,
    org_hr: org_hr_suggestions,
    competitive: competitive_suggestions,
});

/// Rebuild buckets from the per-agent results of completed agents.
///
/// Each agent is re-keyed through the fixed `agent_name → result_key` table
/// of `R::KIND`. Unknown agents and empty results are skipped; categories
/// with no completed agent stay empty. Returns `None` when nothing could be
/// re-keyed.
pub fn reconstruct_from_agents<R: CategoryResults>(agents: &[AgentStatus]) -> Option<R> {
    let mut results = R::default();
    let mut any = false;
    for stage in R::KIND.stages() {
        let Some(agent) = agents
            .iter()
            .find(|a| a.agent_name == stage.agent_name && a.status == AgentState::Completed)
        else {
            continue;
        };
        let findings = agent.findings();
        if findings.is_empty() {
            continue;
        }
        *results.bucket_mut(stage.category) = findings.to_vec();
        any = true;
    }
    any.then_some(results)
}
