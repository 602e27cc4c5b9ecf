//! JSON extraction utilities
//!
//! Generation services are asked for "valid JSON only" but routinely wrap the
//! object in a markdown fence or add a sentence before it. Extraction tries,
//! in order:
//! 1. the body of a ```json (or bare ```) fence
//! 2. the outermost `{ ... }` span in the text
//! 3. the trimmed text itself, when it already looks like JSON

use crate::types::*;
use crate::parse_error;
use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    static ref CODE_BLOCK_REGEX: Regex = Regex::new(r"```(?:json|JSON)?[ \t]*\r?\n?([\s\S]*?)```").unwrap();
    static ref JSON_OBJECT_REGEX: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
}

/// Extract the JSON body from generated text
///
/// Returns the first successful strategy's output, trimmed.
pub fn extract_json(text: &str) -> TriageResult<String> {
    extract_from_code_block(text)
        .or_else(|| extract_from_json_object(text))
        .or_else(|| extract_raw_text(text))
        .ok_or_else(|| parse_error!("No JSON content found in response", sanitize_error_message(text.trim())))
}

fn extract_from_code_block(text: &str) -> Option<String> {
    CODE_BLOCK_REGEX
        .captures(text)
        .map(|captures| captures[1].trim().to_string())
        .filter(|body| !body.is_empty())
}

fn extract_from_json_object(text: &str) -> Option<String> {
    JSON_OBJECT_REGEX.find(text).map(|m| m.as_str().to_string())
}

fn extract_raw_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Some(trimmed.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_and_plain_bodies_match() {
        let body = r#"{"severity": "high"}"#;
        let fenced = format!("```json\n{}\n```", body);
        let bare_fence = format!("```\n{}\n```", body);
        let inline_fence = format!("```json{}```", body);

        assert_eq!(extract_json(body).unwrap(), body);
        assert_eq!(extract_json(&fenced).unwrap(), body);
        assert_eq!(extract_json(&bare_fence).unwrap(), body);
        assert_eq!(extract_json(&inline_fence).unwrap(), body);
    }

    #[test]
    fn object_inside_prose() {
        let text = "Here is the analysis: {\"a\": 1} hope it helps";
        assert_eq!(extract_json(text).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn no_json() {
        assert!(extract_json("I cannot analyze this image.").is_err());
    }
}
