//! Reply-body extraction shared by every backend.
//!
//! Workflow engines and agents disagree on how a reply is wrapped. Accepted
//! shapes, checked in order:
//!
//! - `[{"output": "..."}]` (n8n "respond to webhook" default)
//! - `{"output": "..."}` or `{"response": "..."}`
//! - `"..."` (a bare JSON string)
//! - anything that is not JSON, used verbatim

use chatdesk_core::RouterError;
use serde_json::Value;

const REPLY_FIELDS: [&str; 2] = ["output", "response"];

/// Pulls the reply text out of a backend response body.
///
/// # Errors
///
/// Returns `RouterError::InvalidReply` when the body is empty, or when it is
/// JSON but carries no reply text.
pub fn extract_reply(body: &str) -> Result<String, RouterError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(RouterError::InvalidReply("empty reply".to_string()));
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return Ok(body.to_string()),
    };

    match value {
        Value::Array(items) => {
            let first = items
                .into_iter()
                .next()
                .ok_or_else(|| RouterError::InvalidReply("empty reply array".to_string()))?;
            reply_from_value(first)
        }
        // Numbers and booleans are plain text that happened to parse as JSON
        Value::Number(_) | Value::Bool(_) => Ok(body.to_string()),
        other => reply_from_value(other),
    }
}

fn reply_from_value(value: Value) -> Result<String, RouterError> {
    match value {
        Value::String(text) => Ok(text),
        Value::Object(mut fields) => REPLY_FIELDS
            .iter()
            .find_map(|field| fields.remove(*field))
            .map(|reply| match reply {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .ok_or_else(|| {
                RouterError::InvalidReply(format!(
                    "no {} field in reply",
                    REPLY_FIELDS.join("/")
                ))
            }),
        Value::Null => Err(RouterError::InvalidReply("null reply".to_string())),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_with_output() {
        let reply = extract_reply(r#"[{"output": "hi there"}]"#).unwrap();
        assert_eq!(reply, "hi there");
    }

    #[test]
    fn test_object_with_output_or_response() {
        assert_eq!(extract_reply(r#"{"output": "a"}"#).unwrap(), "a");
        assert_eq!(extract_reply(r#"{"response": "b"}"#).unwrap(), "b");
        assert_eq!(
            extract_reply(r#"{"output": "first", "response": "second"}"#).unwrap(),
            "first"
        );
    }

    #[test]
    fn test_plain_text_and_json_string() {
        assert_eq!(extract_reply("  just text \n").unwrap(), "just text");
        assert_eq!(extract_reply(r#""quoted""#).unwrap(), "quoted");
        assert_eq!(extract_reply("42").unwrap(), "42");
    }

    #[test]
    fn test_non_string_output_is_rendered() {
        assert_eq!(extract_reply(r#"{"output": {"n": 1}}"#).unwrap(), r#"{"n":1}"#);
    }

    #[test]
    fn test_invalid_replies() {
        for body in ["", "   ", "[]", "null", r#"{"status": "ok"}"#, r#"[{"other": 1}]"#] {
            assert!(
                matches!(extract_reply(body), Err(RouterError::InvalidReply(_))),
                "expected InvalidReply for {body:?}"
            );
        }
    }
}
