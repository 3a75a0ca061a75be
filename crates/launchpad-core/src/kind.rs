use crate::error::LaunchpadError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Business category covered by one stage of every pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Finance,
    Marketing,
    Tech,
    OrgHr,
    Competitive,
}

impl Category {
    /// Execution order of the pipeline stages.
    pub fn all() -> &'static [Category] {
        &[
            Category::Finance,
            Category::Marketing,
            Category::Tech,
            Category::OrgHr,
            Category::Competitive,
        ]
    }

    /// Stable identifier of the agent that owns this category.
    pub fn agent_name(self) -> &'static str {
        match self {
            Category::Finance => "finance_advisor",
            Category::Marketing => "marketing_advisor",
            Category::Tech => "tech_lead",
            Category::OrgHr => "org_hr_strategist",
            Category::Competitive => "competitive_analyst",
        }
    }

    pub fn from_agent_name(name: &str) -> Option<Category> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.agent_name() == name)
    }

    /// Prefix of the result key (`finance_*`, `org_hr_*`, ...).
    pub fn key_prefix(self) -> &'static str {
        match self {
            Category::Finance => "finance",
            Category::Marketing => "marketing",
            Category::Tech => "tech",
            Category::OrgHr => "org_hr",
            Category::Competitive => "competitive",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Category::Finance => "Finance",
            Category::Marketing => "Marketing",
            Category::Tech => "Tech",
            Category::OrgHr => "Org/HR",
            Category::Competitive => "Competitive",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Finance => "Finance",
            Category::Marketing => "Marketing",
            Category::Tech => "Technology",
            Category::OrgHr => "Organization & HR",
            Category::Competitive => "Competitive Strategy",
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineKind
// ---------------------------------------------------------------------------

/// The four sequential analysis pipelines. They share stage order and
/// protocol and differ only in naming and result keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Roadmap,
    Strengths,
    Weaknesses,
    Suggestions,
}

impl PipelineKind {
    pub fn all() -> &'static [PipelineKind] {
        &[
            PipelineKind::Roadmap,
            PipelineKind::Strengths,
            PipelineKind::Weaknesses,
            PipelineKind::Suggestions,
        ]
    }

    /// Route segment under `/api/crew/`.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineKind::Roadmap => "roadmap",
            PipelineKind::Strengths => "strengths",
            PipelineKind::Weaknesses => "weaknesses",
            PipelineKind::Suggestions => "suggestions",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            PipelineKind::Roadmap => "CREWAI_ROADMAP_URL",
            PipelineKind::Strengths => "CREWAI_STRENGTHS_URL",
            PipelineKind::Weaknesses => "CREWAI_WEAKNESSES_URL",
            PipelineKind::Suggestions => "CREWAI_SUGGESTIONS_URL",
        }
    }

    /// Agent label reported in poll envelopes.
    pub fn agent_label(self) -> &'static str {
        match self {
            PipelineKind::Roadmap => "next-month-roadmap",
            other => other.as_str(),
        }
    }

    /// Suffix of every result key for this pipeline.
    pub fn result_suffix(self) -> &'static str {
        self.as_str()
    }

    fn title(self) -> &'static str {
        match self {
            PipelineKind::Roadmap => "Roadmap",
            PipelineKind::Strengths => "Strengths",
            PipelineKind::Weaknesses => "Weaknesses",
            PipelineKind::Suggestions => "Suggestions",
        }
    }

    /// Result key for `category`, e.g. `org_hr_suggestions`.
    pub fn result_key(self, category: Category) -> String {
        format!("{}_{}", category.key_prefix(), self.result_suffix())
    }

    /// Human label for the stage covering `category`, e.g. "Org/HR Suggestions".
    pub fn display_name(self, category: Category) -> String {
        format!("{} {}", category.short_label(), self.title())
    }

    /// Ordered stage table for this pipeline: the fixed
    /// `agent_name → result_key` map, in execution order.
    pub fn stages(self) -> Vec<Stage> {
        Category::all()
            .iter()
            .map(|&category| Stage {
                agent_name: category.agent_name(),
                display_name: self.display_name(category),
                result_key: self.result_key(category),
                category,
            })
            .collect()
    }

    /// Whether buckets may be rebuilt from per-agent results when the poll
    /// payload has no top-level result. Only the suggestions backend omits it.
    pub fn reconstructs_from_agents(self) -> bool {
        matches!(self, PipelineKind::Suggestions)
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PipelineKind {
    type Err = LaunchpadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roadmap" | "next-month-roadmap" => Ok(PipelineKind::Roadmap),
            "strengths" => Ok(PipelineKind::Strengths),
            "weaknesses" => Ok(PipelineKind::Weaknesses),
            "suggestions" => Ok(PipelineKind::Suggestions),
            _ => Err(LaunchpadError::validation(format!(
                "unknown pipeline '{s}': expected roadmap, strengths, weaknesses or suggestions"
            ))),
        }
    }
}

/// One row of a pipeline's stage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub agent_name: &'static str,
    pub display_name: String,
    pub result_key: String,
    pub category: Category,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_fixed() {
        let names: Vec<&str> = PipelineKind::Strengths
            .stages()
            .iter()
            .map(|s| s.agent_name)
            .collect();
        assert_eq!(
            names,
            vec![
                "finance_advisor",
                "marketing_advisor",
                "tech_lead",
                "org_hr_strategist",
                "competitive_analyst"
            ]
        );
    }

    #[test]
    fn suggestions_stage_table() {
        let keys: Vec<(&str, String)> = PipelineKind::Suggestions
            .stages()
            .into_iter()
            .map(|s| (s.agent_name, s.result_key))
            .collect();
        assert_eq!(keys[0], ("finance_advisor", "finance_suggestions".to_string()));
        assert_eq!(keys[3], ("org_hr_strategist", "org_hr_suggestions".to_string()));
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn display_names_match_backend_labels() {
        assert_eq!(
            PipelineKind::Roadmap.display_name(Category::OrgHr),
            "Org/HR Roadmap"
        );
        assert_eq!(
            PipelineKind::Weaknesses.display_name(Category::Competitive),
            "Competitive Weaknesses"
        );
    }

    #[test]
    fn only_suggestions_reconstructs() {
        let allowed: Vec<PipelineKind> = PipelineKind::all()
            .iter()
            .copied()
            .filter(|k| k.reconstructs_from_agents())
            .collect();
        assert_eq!(allowed, vec![PipelineKind::Suggestions]);
    }

    #[test]
    fn parse_accepts_agent_label_alias() {
        assert_eq!(
            "next-month-roadmap".parse::<PipelineKind>().unwrap(),
            PipelineKind::Roadmap
        );
        assert!("pitch".parse::<PipelineKind>().is_err());
    }

    #[test]
    fn roadmap_agent_label() {
        assert_eq!(PipelineKind::Roadmap.agent_label(), "next-month-roadmap");
        assert_eq!(PipelineKind::Weaknesses.agent_label(), "weaknesses");
    }
}
