use serde_json::Value;

/// Best-effort human message from a remote error body.
///
/// FastAPI services put it in `detail`, workflow hooks in `error` or
/// `message`. Falls back to the trimmed raw text; `None` if the body is
/// empty.
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["detail", "error", "message"] {
            match map.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
                Some(Value::Null) | None => {}
                Some(Value::String(_)) => {}
                Some(other) => return Some(other.to_string()),
            }
        }
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_detail_then_error_then_message() {
        assert_eq!(
            extract_message(r#"{"detail":"Analysis not found","error":"x"}"#).as_deref(),
            Some("Analysis not found")
        );
        assert_eq!(
            extract_message(r#"{"error":"quota exceeded","message":"m"}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(
            extract_message(r#"{"message":"bad gateway"}"#).as_deref(),
            Some("bad gateway")
        );
    }

    #[test]
    fn structured_detail_is_stringified() {
        let msg = extract_message(r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#)
            .unwrap();
        assert!(msg.contains("field required"));
    }

    #[test]
    fn falls_back_to_text() {
        assert_eq!(
            extract_message("  Internal Server Error\n").as_deref(),
            Some("Internal Server Error")
        );
        assert_eq!(extract_message("   "), None);
    }
}
