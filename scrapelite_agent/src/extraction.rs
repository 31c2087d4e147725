//! Extraction stage: ask the oracle for the requested data and validate it.

use crate::automation::helpers::{log_preview, strip_code_fence, truncate_chars};
use crate::automation::prompts::extraction_prompt;
use crate::error::AgentResult;
use crate::llm::Message;
use crate::oracle::Oracle;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Final answer of a scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Whether the data parsed and carries every required field.
    pub valid: bool,
    /// Parsed JSON, or the raw reply when it did not parse.
    pub data: Value,
    /// Human-readable problems, empty when valid.
    pub errors: Vec<String>,
}

impl ExtractionResult {
    /// Result for an extraction whose oracle call failed.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            valid: false,
            data: Value::Null,
            errors: vec![format!("Extraction failed: {}", reason)],
        }
    }
}

/// Parse and check an extraction reply.
///
/// The first fenced block is used when present. Each field of
/// `required_fields` missing from the parsed object is reported; a parsed
/// value that is not an object is missing all of them.
pub fn validate_extraction(raw: &str, required_fields: &[String]) -> ExtractionResult {
    let body = strip_code_fence(raw);

    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return ExtractionResult {
                valid: false,
                data: Value::String(body.to_string()),
                errors: vec![format!("Invalid JSON: {}", e)],
            }
        }
    };

    let errors: Vec<String> = required_fields
        .iter()
        .filter(|field| !parsed.as_object().is_some_and(|obj| obj.contains_key(field.as_str())))
        .map(|field| format!("Missing field: {}", field))
        .collect();

    ExtractionResult {
        valid: errors.is_empty(),
        data: parsed,
        errors,
    }
}

/// Extraction oracle adapter.
#[derive(Debug, Clone)]
pub struct Extractor {
    max_chars: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(6_000)
    }
}

impl Extractor {
    /// Send at most `max_chars` characters of page text.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Ask the oracle to pull the goal's data out of `page_text`.
    pub async fn extract(&self, oracle: &Oracle, page_text: &str, goal: &str) -> AgentResult<String> {
        let content = truncate_chars(page_text, self.max_chars);
        if content.len() < page_text.len() {
            log::debug!(
                "page text truncated to {} chars for extraction",
                self.max_chars
            );
        }

        let reply = oracle
            .complete(vec![Message::user(extraction_prompt(content, goal))])
            .await?;
        log::debug!("extraction reply: {}", log_preview(&reply));
        Ok(reply)
    }

    /// Extract and validate in one step; oracle failures become an invalid result.
    pub async fn extract_validated(
        &self,
        oracle: &Oracle,
        page_text: &str,
        goal: &str,
        required_fields: &[String],
    ) -> ExtractionResult {
        match self.extract(oracle, page_text, goal).await {
            Ok(reply) => validate_extraction(&reply, required_fields),
            Err(e) => {
                log::warn!("extraction oracle call failed: {}", e);
                ExtractionResult::failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_object() {
        let r = validate_extraction(r#"{"title": "Rust", "points": 10}"#, &fields(&["title"]));
        assert!(r.valid);
        assert!(r.errors.is_empty());
        assert_eq!(r.data, json!({"title": "Rust", "points": 10}));
    }

    #[test]
    fn test_missing_required_field() {
        let r = validate_extraction(r#"{"points": 10}"#, &fields(&["title"]));
        assert!(!r.valid);
        assert_eq!(r.errors, vec!["Missing field: title".to_string()]);
        assert_eq!(r.data, json!({"points": 10}));
    }

    #[test]
    fn test_fenced_reply() {
        let raw = "Here is the data:\n```json\n{\"temp\": \"21C\"}\n```";
        let r = validate_extraction(raw, &[]);
        assert!(r.valid);
        assert_eq!(r.data, json!({"temp": "21C"}));
    }

    #[test]
    fn test_invalid_json_keeps_raw_text() {
        let r = validate_extraction("The temperature is 21C", &fields(&["temp"]));
        assert!(!r.valid);
        assert_eq!(r.data, json!("The temperature is 21C"));
        assert_eq!(r.errors.len(), 1);
        assert!(r.errors[0].starts_with("Invalid JSON: "));
    }

    #[test]
    fn test_array_lacks_required_fields() {
        let r = validate_extraction(r#"["a", "b"]"#, &fields(&["title", "url"]));
        assert!(!r.valid);
        assert_eq!(
            r.errors,
            vec!["Missing field: title".to_string(), "Missing field: url".to_string()]
        );

        assert!(validate_extraction(r#"["a"]"#, &[]).valid);
    }

    #[test]
    fn test_failed_result_shape() {
        let r = ExtractionResult::failed("Request timed out");
        assert!(!r.valid);
        assert_eq!(r.data, Value::Null);
        assert_eq!(r.errors, vec!["Extraction failed: Request timed out".to_string()]);
    }

    #[test]
    fn test_serializes_like_the_persisted_file() {
        let r = validate_extraction(r#"{"a": 1}"#, &[]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, json!({"valid": true, "data": {"a": 1}, "errors": []}));
    }
}
