use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Characters of raw output kept for diagnosis when decoding fails.
pub const EXCERPT_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("no JSON object could be decoded from agent output")]
    Malformed { excerpt: String },
}

impl PayloadError {
    pub fn excerpt(&self) -> &str {
        match self {
            PayloadError::Malformed { excerpt } => excerpt,
        }
    }
}

/// Best-effort decode of a JSON object from noisy agent output.
///
/// Accepts bare JSON, JSON inside a ``` fence (tagged `json` or not), and JSON
/// surrounded by prose.
pub fn decode_payload(raw: &str) -> Result<Value, PayloadError> {
    let candidate = extract_json_text(raw);

    match serde_json::from_str::<Value>(&candidate) {
        Ok(value) if value.is_object() => Ok(value),
        _ => Err(PayloadError::Malformed {
            excerpt: raw.chars().take(EXCERPT_CHARS).collect(),
        }),
    }
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence pattern is valid")
    })
}

fn extract_json_text(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    if let Some(inner) = fence_pattern().captures(raw).and_then(|c| c.get(1)) {
        text = inner.as_str().trim().to_string();
    }

    if !text.starts_with('{') {
        if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
            if start < end {
                text = raw[start..=end].to_string();
            }
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bare_json() {
        let value = decode_payload(r#"{"posts": []}"#).unwrap();
        assert!(value["posts"].is_array());
    }

    #[test]
    fn test_decode_fenced_json() {
        let raw = "Here you go:\n```json\n{\"posts\": [{\"id\": \"1\"}]}\n```\nDone.";
        let value = decode_payload(raw).unwrap();
        assert_eq!(value["posts"][0]["id"], "1");
    }

    #[test]
    fn test_decode_untagged_fence() {
        let raw = "```\n{\"accountsToFollow\": []}\n```";
        let value = decode_payload(raw).unwrap();
        assert!(value["accountsToFollow"].is_array());
    }

    #[test]
    fn test_decode_wrapped_in_prose() {
        let raw = "I searched X and found these: {\"posts\": [], \"methodology\": {\"searches\": []}} Hope that helps!";
        let value = decode_payload(raw).unwrap();
        assert!(value["methodology"].is_object());
    }

    #[test]
    fn test_decode_malformed_keeps_excerpt() {
        let raw = format!("The task failed. {}", "x".repeat(5000));
        let err = decode_payload(&raw).unwrap_err();
        assert_eq!(err.excerpt().chars().count(), EXCERPT_CHARS);
        assert!(err.excerpt().starts_with("The task failed."));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(decode_payload("[1, 2, 3]").is_err());
        assert!(decode_payload("").is_err());
    }

    #[test]
    fn test_decode_broken_json() {
        let err = decode_payload("{\"posts\": [").unwrap_err();
        assert_eq!(err.excerpt(), "{\"posts\": [");
    }
}
