mod test_helpers;

use grievance_triage::analyzers::contextual::{
    parse_findings, NOT_CONFIGURED_REASON, UNAVAILABLE_REASON,
};
use grievance_triage::{ChatRole, Severity};
use pretty_assertions::assert_eq;
use test_helpers::{client_with, findings_json, MockGenerator};

#[test]
fn test_fenced_and_plain_replies_parse_identically() {
    let body = findings_json("Carriageway pothole roughly 0.5 m across", "high");
    let fenced = format!("```json\n{}\n```", body);
    let bare_fence = format!("Here you go:\n```\n{}\n```\n", body);

    let plain = parse_findings(&body, "a pothole").unwrap();
    assert_eq!(parse_findings(&fenced, "a pothole").unwrap(), plain);
    assert_eq!(parse_findings(&bare_fence, "a pothole").unwrap(), plain);

    assert_eq!(plain.severity, Severity::High);
    assert_eq!(plain.key_observations.len(), 1);
    assert_eq!(plain.severity_reason, "Risk to two-wheeler traffic");
}

#[test]
fn test_missing_fields_default_individually() {
    let reply = r#"{"identified_problems": ["Drain blockage"], "severity": "CRITICAL"}"#;
    let findings = parse_findings(reply, "a clogged drain").unwrap();

    assert_eq!(findings.description, "a clogged drain");
    assert_eq!(findings.identified_problems, vec!["Drain blockage"]);
    assert!(findings.key_observations.is_empty());
    assert!(findings.affected_areas.is_empty());
    assert!(findings.recommended_actions.is_empty());
    assert_eq!(findings.severity, Severity::Critical);
    assert_eq!(findings.severity_reason, "");
}

#[test]
fn test_unrecognised_severity_defaults_to_medium() {
    let reply = r#"{"description": "Broken bench", "severity": "moderate"}"#;
    assert_eq!(parse_findings(reply, "bench").unwrap().severity, Severity::Medium);
}

#[test]
fn test_invalid_json_is_an_error() {
    assert!(parse_findings("```json\n{\"description\": \n```", "x").is_err());
    assert!(parse_findings("I'm sorry, I can't help with that.", "x").is_err());
}

#[tokio::test]
async fn test_request_shape() {
    let generator = MockGenerator::replying(findings_json("Leaking water main", "medium"));
    let client = client_with(None, vec![], Some(generator.clone()));

    client
        .contextual()
        .analyze("water gushing from a pipe", Some("Pipe burst near the market"))
        .await;

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "llama-3.3-70b-versatile");
    assert_eq!(request.max_tokens, Some(800));
    assert_eq!(request.temperature, Some(0.3));
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, ChatRole::User);

    let prompt = request.user_prompt().unwrap();
    assert!(prompt.contains("water gushing from a pipe"));
    assert!(prompt.contains("Complaint Details: Pipe burst near the market"));
    assert!(prompt.contains("Respond ONLY with valid JSON"));
}

#[tokio::test]
async fn test_successful_analysis_uses_reply() {
    let generator = MockGenerator::replying(format!(
        "```json\n{}\n```",
        findings_json("Collapsed retaining wall", "high")
    ));
    let client = client_with(None, vec![], Some(generator));

    let findings = client.contextual().analyze("a fallen wall", None).await;

    assert_eq!(findings.description, "Collapsed retaining wall");
    assert_eq!(findings.severity, Severity::High);
}

#[tokio::test]
async fn test_service_failure_degrades() {
    let client = client_with(None, vec![], Some(MockGenerator::failing()));

    let findings = client.contextual().analyze("overflowing bin", Some("Bins not emptied")).await;

    assert_eq!(findings.description, "overflowing bin");
    assert_eq!(findings.severity, Severity::Medium);
    assert_eq!(findings.severity_reason, UNAVAILABLE_REASON);
    assert!(findings.key_observations.is_empty());
    assert!(findings.identified_problems.is_empty());
    assert!(findings.recommended_actions.is_empty());
}

#[tokio::test]
async fn test_unparseable_reply_degrades() {
    let client = client_with(None, vec![], Some(MockGenerator::replying("No JSON for you")));

    let findings = client.contextual().analyze("a dark street", None).await;

    assert_eq!(findings.severity, Severity::Medium);
    assert_eq!(findings.severity_reason, UNAVAILABLE_REASON);
}

#[tokio::test]
async fn test_missing_service_degrades_without_calls() {
    let client = client_with(None, vec![], None);

    let findings = client.contextual().analyze("a broken swing", None).await;

    assert_eq!(findings.description, "a broken swing");
    assert_eq!(findings.severity, Severity::Medium);
    assert_eq!(findings.severity_reason, NOT_CONFIGURED_REASON);
}
