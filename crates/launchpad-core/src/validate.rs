//! Request checks that must pass before any network call is made.
//!
//! Each check takes the raw JSON body and returns the typed request that is
//! forwarded upstream, or a `Validation` error carrying the user-facing
//! message.

use crate::error::{LaunchpadError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Crew submission
// ---------------------------------------------------------------------------

/// `startup_data` must be present and non-null. Its shape is opaque.
pub fn require_startup_data(body: &Value) -> Result<&Value> {
    match body.get("startup_data") {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(LaunchpadError::validation("startup_data is required")),
    }
}

// ---------------------------------------------------------------------------
// Success prediction
// ---------------------------------------------------------------------------

const PREDICTION_FIELDS: [&str; 10] = [
    "relationships",
    "funding_rounds",
    "funding_total_usd",
    "milestones",
    "has_VC",
    "has_angel",
    "avg_participants",
    "startup_age",
    "execution_velocity",
    "rounds_per_year",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub relationships: f64,
    pub funding_rounds: f64,
    pub funding_total_usd: f64,
    pub milestones: f64,
    #[serde(rename = "has_VC")]
    pub has_vc: u8,
    pub has_angel: u8,
    pub avg_participants: f64,
    pub startup_age: f64,
    pub execution_velocity: f64,
    pub rounds_per_year: f64,
}

pub fn prediction(body: &Value) -> Result<PredictionRequest> {
    for field in PREDICTION_FIELDS {
        if matches!(body.get(field), None | Some(Value::Null)) {
            return Err(LaunchpadError::validation(format!(
                "Missing required field: {field}"
            )));
        }
    }

    let numeric = |field: &str| body.get(field).and_then(Value::as_f64);
    let flag = |field: &str| match body.get(field).and_then(Value::as_f64) {
        Some(v) if v == 0.0 => Some(0u8),
        Some(v) if v == 1.0 => Some(1u8),
        _ => None,
    };

    let number = |field: &str| {
        numeric(field).ok_or_else(|| {
            LaunchpadError::validation("All fields except has_VC and has_angel must be numbers")
        })
    };
    let relationships = number("relationships")?;
    let funding_rounds = number("funding_rounds")?;
    let funding_total_usd = number("funding_total_usd")?;
    let milestones = number("milestones")?;
    let avg_participants = number("avg_participants")?;
    let startup_age = number("startup_age")?;
    let execution_velocity = number("execution_velocity")?;
    let rounds_per_year = number("rounds_per_year")?;

    let (Some(has_vc), Some(has_angel)) = (flag("has_VC"), flag("has_angel")) else {
        return Err(LaunchpadError::validation(
            "has_VC and has_angel must be 0 or 1",
        ));
    };

    Ok(PredictionRequest {
        relationships,
        funding_rounds,
        funding_total_usd,
        milestones,
        has_vc,
        has_angel,
        avg_participants,
        startup_age,
        execution_velocity,
        rounds_per_year,
    })
}

// ---------------------------------------------------------------------------
// Idea enhancement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementRequest {
    pub raw_idea: String,
}

pub fn enhancement(body: &Value) -> Result<EnhancementRequest> {
    let Some(raw_idea) = body.get("raw_idea").and_then(Value::as_str) else {
        return Err(LaunchpadError::validation(
            "raw_idea is required and must be a string",
        ));
    };
    if raw_idea.trim().is_empty() {
        return Err(LaunchpadError::validation("raw_idea cannot be empty"));
    }
    Ok(EnhancementRequest {
        raw_idea: raw_idea.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Pitch workflow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchStart {
    pub mvp_description: String,
}

pub fn pitch_start(body: &Value) -> Result<PitchStart> {
    match body.get("mvp_description").and_then(Value::as_str) {
        Some(desc) if !desc.trim().is_empty() => Ok(PitchStart {
            mvp_description: desc.to_string(),
        }),
        _ => Err(LaunchpadError::validation("MVP description is required")),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchApproval {
    pub approved: bool,
    pub feedback: String,
}

pub fn pitch_approval(body: &Value) -> Result<PitchApproval> {
    let Some(approved) = body.get("approved").and_then(Value::as_bool) else {
        return Err(LaunchpadError::validation(
            "Approved field is required and must be a boolean",
        ));
    };
    let feedback = body
        .get("feedback")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(PitchApproval { approved, feedback })
}

// ---------------------------------------------------------------------------
// RAG
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextQuestion {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

pub fn text_question(body: &Value) -> Result<TextQuestion> {
    let question = match body.get("question").and_then(Value::as_str) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return Err(LaunchpadError::validation("Question is required")),
    };
    let session_id = body
        .get("session_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(TextQuestion {
        question,
        session_id,
    })
}

// ---------------------------------------------------------------------------
// Investor matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorSubmission {
    pub startup_name: String,
    pub problem: String,
    pub solution: String,
    pub target_market: String,
    pub traction: String,
    pub revenue_model: String,
    pub funding_stage_and_ask: String,
    pub founder_background: String,
    pub contact_email: String,
}

const INVESTOR_FIELDS: [&str; 9] = [
    "startup_name",
    "problem",
    "solution",
    "target_market",
    "traction",
    "revenue_model",
    "funding_stage_and_ask",
    "founder_background",
    "contact_email",
];

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
        .is_match(email)
}

pub fn investor(body: &Value) -> Result<InvestorSubmission> {
    for field in INVESTOR_FIELDS {
        let filled = body
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.trim().is_empty());
        if !filled {
            return Err(LaunchpadError::validation(format!("{field} is required")));
        }
    }
    let submission: InvestorSubmission = serde_json::from_value(body.clone())?;
    if !is_valid_email(&submission.contact_email) {
        return Err(LaunchpadError::validation(
            "Please enter a valid email address",
        ));
    }
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(err: LaunchpadError) -> String {
        match err {
            LaunchpadError::Validation(m) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn prediction_body() -> Value {
        json!({
            "relationships": 5, "funding_rounds": 2, "funding_total_usd": 1500000.0,
            "milestones": 3, "has_VC": 1, "has_angel": 0, "avg_participants": 2.5,
            "startup_age": 3, "execution_velocity": 0.8, "rounds_per_year": 0.7
        })
    }

    #[test]
    fn startup_data_presence() {
        assert!(require_startup_data(&json!({"startup_data": {"name": "x"}})).is_ok());
        let err = require_startup_data(&json!({"startup_data": null})).unwrap_err();
        assert_eq!(message(err), "startup_data is required");
        assert!(require_startup_data(&json!({})).is_err());
    }

    #[test]
    fn prediction_accepts_valid_body() {
        let req = prediction(&prediction_body()).unwrap();
        assert_eq!(req.has_vc, 1);
        assert_eq!(req.funding_total_usd, 1500000.0);
        let wire = serde_json::to_value(&req).unwrap();
        assert_eq!(wire["has_VC"], 1);
    }

    #[test]
    fn prediction_reports_first_missing_field() {
        let mut body = prediction_body();
        body.as_object_mut().unwrap().remove("milestones");
        assert_eq!(
            message(prediction(&body).unwrap_err()),
            "Missing required field: milestones"
        );
    }

    #[test]
    fn prediction_rejects_non_numeric_and_bad_flags() {
        let mut body = prediction_body();
        body["startup_age"] = json!("three");
        assert_eq!(
            message(prediction(&body).unwrap_err()),
            "All fields except has_VC and has_angel must be numbers"
        );

        let mut body = prediction_body();
        body["has_angel"] = json!(2);
        assert_eq!(
            message(prediction(&body).unwrap_err()),
            "has_VC and has_angel must be 0 or 1"
        );
    }

    #[test]
    fn enhancement_requires_non_blank_idea() {
        assert!(enhancement(&json!({"raw_idea": "Uber for dogs"})).is_ok());
        assert_eq!(
            message(enhancement(&json!({"raw_idea": 4})).unwrap_err()),
            "raw_idea is required and must be a string"
        );
        assert_eq!(
            message(enhancement(&json!({"raw_idea": "   "})).unwrap_err()),
            "raw_idea cannot be empty"
        );
    }

    #[test]
    fn pitch_checks() {
        assert!(pitch_start(&json!({})).is_err());
        let approval = pitch_approval(&json!({"approved": false})).unwrap();
        assert!(!approval.approved);
        assert_eq!(approval.feedback, "");
        assert!(pitch_approval(&json!({"approved": "yes"})).is_err());
    }

    #[test]
    fn text_question_drops_empty_session() {
        let q = text_question(&json!({"question": "why?", "session_id": ""})).unwrap();
        assert_eq!(q.session_id, None);
        assert!(text_question(&json!({"question": ""})).is_err());
    }

    #[test]
    fn investor_requires_every_field_and_valid_email() {
        let mut body = json!({
            "startup_name": "Acme", "problem": "p", "solution": "s",
            "target_market": "t", "traction": "1k users", "revenue_model": "saas",
            "funding_stage_and_ask": "seed, $1M", "founder_background": "ex-ops",
            "contact_email": "founder@acme.io"
        });
        assert!(investor(&body).is_ok());

        body["contact_email"] = json!("founder@acme");
        assert_eq!(
            message(investor(&body).unwrap_err()),
            "Please enter a valid email address"
        );

        body["contact_email"] = json!("founder@acme.io");
        body["traction"] = json!("  ");
        assert_eq!(message(investor(&body).unwrap_err()), "traction is required");
    }
}
