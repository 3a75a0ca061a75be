//! Saved startup questionnaire, one per signed-in identity.
//!
//! The form body is stored opaquely: the analysis pages read it back and
//! submit it as `startup_data` unchanged.

use crate::error::{LaunchpadError, Result};
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FORMS_COLLECTION: &str = "startup_forms";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedForm {
    pub identity: String,
    pub form_data: Value,
    pub updated_at: DateTime<Utc>,
}

/// Insert or replace the form for `identity`.
pub fn save_form(store: &dyn DocumentStore, identity: &str, form: Value) -> Result<SavedForm> {
    if !form.is_object() {
        return Err(LaunchpadError::validation("formData must be an object"));
    }
    let saved = SavedForm {
        identity: identity.to_string(),
        form_data: form,
        updated_at: Utc::now(),
    };
    store.put(FORMS_COLLECTION, identity, &serde_json::to_value(&saved)?)?;
    tracing::debug!(identity, "startup form saved");
    Ok(saved)
}

pub fn load_form(store: &dyn DocumentStore, identity: &str) -> Result<Option<SavedForm>> {
    match store.get(FORMS_COLLECTION, identity)? {
        Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn load_before_save_is_none() {
        let store = MemoryStore::new();
        assert!(load_form(&store, "a@x.io").unwrap().is_none());
    }

    #[test]
    fn save_replaces_previous_form() {
        let store = MemoryStore::new();
        save_form(&store, "a@x.io", json!({"startup_name": "Acme"})).unwrap();
        save_form(&store, "a@x.io", json!({"startup_name": "Acme 2"})).unwrap();
        save_form(&store, "b@x.io", json!({"startup_name": "Other"})).unwrap();

        let form = load_form(&store, "a@x.io").unwrap().unwrap();
        assert_eq!(form.form_data["startup_name"], "Acme 2");
        assert_eq!(form.identity, "a@x.io");
    }

    #[test]
    fn non_object_form_is_rejected() {
        let store = MemoryStore::new();
        let err = save_form(&store, "a@x.io", json!("nope")).unwrap_err();
        assert!(matches!(err, LaunchpadError::Validation(_)));
    }
}
