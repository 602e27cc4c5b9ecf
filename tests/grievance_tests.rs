mod test_helpers;

use async_trait::async_trait;
use bytes::Bytes;
use grievance_triage::services::{CaptionService, GenerationService};
use grievance_triage::{
    ChatRequest, OverallSeverity, SentimentLabel, Severity, TriageClient, TriageConfig, TriageResult,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_helpers::{
    client_with, findings_json, test_config, CaptionBehaviour, MockCaptioner, MockGenerator,
    MockSimilarity, SAMPLE_IMAGE,
};

/// Replies with a severity chosen by a marker in the caption
struct SeverityByCaption;

#[async_trait]
impl GenerationService for SeverityByCaption {
    async fn generate(&self, request: ChatRequest) -> TriageResult<String> {
        let prompt = request.user_prompt().unwrap_or_default().to_string();
        let severity = if prompt.contains("collapsed") {
            "critical"
        } else if prompt.contains("litter") {
            "low"
        } else {
            "medium"
        };
        Ok(findings_json(&format!("Assessment: {}", severity), severity))
    }
}

fn negative_similarity() -> Arc<MockSimilarity> {
    Arc::new(
        MockSimilarity::new()
            .with_scores(SentimentLabel::Positive, vec![0.2, 0.3])
            .with_scores(SentimentLabel::Negative, vec![0.9, 0.7])
            .with_scores(SentimentLabel::Neutral, vec![0.4]),
    )
}

#[tokio::test]
async fn test_full_triage() {
    let client = client_with(
        Some(negative_similarity()),
        vec![MockCaptioner::shared("blip-large", CaptionBehaviour::Caption("a collapsed wall"))],
        Some(Arc::new(SeverityByCaption)),
    );

    let text = "Emergency! The compound wall collapsed onto the footpath, people injured";
    let analysis = client.analyze(text, &[SAMPLE_IMAGE], None).await;

    assert_eq!(analysis.text_analysis.sentiment.label, SentimentLabel::Negative);
    assert!(analysis.text_analysis.sentiment.is_determined());
    assert_eq!(analysis.text_analysis.urgency_score.value(), 9);
    assert_eq!(analysis.overall_urgency, analysis.text_analysis.urgency_score);
    assert_eq!(analysis.image_analyses.len(), 1);
    assert_eq!(analysis.image_analyses[0].severity(), Severity::Critical);
    assert_eq!(analysis.overall_severity, OverallSeverity::High);
}

/// Captions normally but panics on one marked image
struct PanicsOnMarkedImage;

#[async_trait]
impl CaptionService for PanicsOnMarkedImage {
    fn model(&self) -> &str {
        "marked"
    }

    async fn caption(&self, image: Bytes) -> TriageResult<Option<String>> {
        if &image[..] == b"crash" {
            panic!("caption model crashed");
        }
        Ok(Some("litter on the pavement".to_string()))
    }
}

#[tokio::test]
async fn test_image_order_survives_partial_failure() {
    let client = client_with(
        None,
        vec![Arc::new(PanicsOnMarkedImage)],
        Some(Arc::new(SeverityByCaption)),
    );

    // base64 of "crash"
    let images = [SAMPLE_IMAGE, "Y3Jhc2g=", SAMPLE_IMAGE];
    let analysis = client
        .analyze("Litter everywhere on the pavement near the bus stop", &images, None)
        .await;

    let indexes: Vec<usize> = analysis.image_analyses.iter().map(|r| r.image_index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert_eq!(analysis.image_analyses[0].severity(), Severity::Low);
    assert_eq!(analysis.image_analyses[1].severity(), Severity::Unknown);
    assert!(analysis.image_analyses[1].error.is_some());
    assert_eq!(analysis.image_analyses[2].severity(), Severity::Low);

    // Unknown is not low, so the fold lands on medium
    assert_eq!(analysis.overall_severity, OverallSeverity::Medium);
}

#[tokio::test]
async fn test_corrupt_image_is_judged_from_context() {
    let client = client_with(
        None,
        vec![MockCaptioner::shared("blip-large", CaptionBehaviour::Caption("litter on the pavement"))],
        Some(Arc::new(SeverityByCaption)),
    );

    let analysis = client
        .analyze("Some litter near the bus stop", &[SAMPLE_IMAGE, "%%%"], None)
        .await;

    let severities: Vec<Severity> = analysis.image_analyses.iter().map(|r| r.severity()).collect();
    assert_eq!(severities, vec![Severity::Low, Severity::Low]);
    assert!(analysis.image_analyses.iter().all(|r| r.error.is_none()));
    assert_eq!(analysis.overall_severity, OverallSeverity::Low);
}

#[tokio::test]
async fn test_all_low_images_fold_to_low() {
    let client = client_with(
        None,
        vec![MockCaptioner::shared("blip-large", CaptionBehaviour::Caption("scattered litter"))],
        Some(Arc::new(SeverityByCaption)),
    );

    let analysis = client
        .analyze("Some litter near the park gate", &[SAMPLE_IMAGE, SAMPLE_IMAGE], None)
        .await;

    assert_eq!(analysis.overall_severity, OverallSeverity::Low);
}

#[tokio::test]
async fn test_no_images_is_medium() {
    let client = client_with(Some(negative_similarity()), vec![], None);

    let images: Vec<String> = Vec::new();
    let analysis = client.analyze("The park benches need repainting", &images, None).await;

    assert!(analysis.image_analyses.is_empty());
    assert_eq!(analysis.overall_severity, OverallSeverity::Medium);
    assert_eq!(analysis.overall_urgency.value(), 4);
}

#[tokio::test]
async fn test_context_defaults_to_grievance_text() {
    let generator = MockGenerator::replying(findings_json("Sewage overflow", "high"));
    let client = client_with(
        None,
        vec![MockCaptioner::shared("blip-large", CaptionBehaviour::Fail)],
        Some(generator.clone()),
    );

    let text = "Sewage overflowing into the market lane since Monday";
    let analysis = client.analyze(text, &[SAMPLE_IMAGE], None).await;

    // The grievance text stands in for context, so this is not a manual-review result
    assert_eq!(analysis.image_analyses[0].findings.description, "Sewage overflow");
    assert!(generator.last_prompt().unwrap().contains(text));
}

#[tokio::test]
async fn test_explicit_context_wins() {
    let generator = MockGenerator::replying(findings_json("Blocked drain", "medium"));
    let client = client_with(
        None,
        vec![MockCaptioner::shared("blip-large", CaptionBehaviour::Caption("a drain"))],
        Some(generator.clone()),
    );

    client
        .analyze("Drain blocked outside house 14", &[SAMPLE_IMAGE], Some("Ward 7, Lane 3"))
        .await;

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("Ward 7, Lane 3"));
    assert!(!prompt.contains("house 14"));
}

#[tokio::test]
async fn test_total_outage_still_returns() {
    let client = client_with(
        Some(Arc::new(MockSimilarity::new())),
        vec![MockCaptioner::shared("blip-large", CaptionBehaviour::Fail)],
        Some(MockGenerator::failing()),
    );

    let analysis = client
        .analyze("Streetlight not working, urgent danger at night", &[SAMPLE_IMAGE], None)
        .await;

    assert_eq!(analysis.text_analysis.sentiment.label, SentimentLabel::Neutral);
    assert!(!analysis.text_analysis.sentiment.is_determined());
    assert_eq!(analysis.text_analysis.urgency_score.value(), 8);
    assert_eq!(analysis.image_analyses[0].severity(), Severity::Medium);
    assert_eq!(analysis.overall_severity, OverallSeverity::Medium);
}

#[tokio::test]
async fn test_unconfigured_client_degrades() {
    let client = TriageClient::offline(TriageConfig::default());

    let analysis = client
        .analyze("Garbage not collected for two weeks", &[SAMPLE_IMAGE], None)
        .await;

    assert_eq!(analysis.text_analysis.sentiment.label, SentimentLabel::Neutral);
    assert_eq!(analysis.text_analysis.sentiment.confidence, 0.0);
    assert_eq!(analysis.image_analyses.len(), 1);
    assert_eq!(analysis.image_analyses[0].severity(), Severity::Medium);
}

#[tokio::test]
async fn test_analysis_json_shape() {
    let client = client_with(
        Some(negative_similarity()),
        vec![Arc::new(PanicsOnMarkedImage)],
        Some(Arc::new(SeverityByCaption)),
    );

    let analysis = client
        .analyze("Wall collapsed near the school", &[SAMPLE_IMAGE, "Y3Jhc2g="], None)
        .await;
    let json = serde_json::to_value(&analysis).unwrap();

    let text = &json["text_analysis"];
    assert_eq!(text["sentiment"], "negative");
    assert!(text["confidence"].is_number());
    assert!(text["similarity_scores"]["positive"].is_number());
    assert!(text["urgency_score"].is_number());
    assert!(text.get("error").is_none());

    let first = &json["image_analyses"][0];
    assert_eq!(first["image_index"], 0);
    assert_eq!(first["severity"], "critical");
    assert!(first["key_observations"].is_array());
    assert!(first.get("error").is_none());

    let second = &json["image_analyses"][1];
    assert_eq!(second["image_index"], 1);
    assert_eq!(second["severity"], "unknown");
    assert!(second["error"].is_string());

    assert_eq!(json["overall_severity"], "high");
    assert!(json["overall_urgency"].is_number());
}

#[tokio::test]
async fn test_image_concurrency_of_one_keeps_results() {
    let config = test_config();
    let config = TriageConfig {
        image_concurrency: 1,
        ..config
    };
    let client = TriageClient::offline(config)
        .with_caption_services(vec![MockCaptioner::shared("m", CaptionBehaviour::Caption("litter"))])
        .with_generation_service(Arc::new(SeverityByCaption));

    let images = vec![SAMPLE_IMAGE.to_string(); 5];
    let analysis = client.analyze("Litter outside the library", &images, None).await;

    let indexes: Vec<usize> = analysis.image_analyses.iter().map(|r| r.image_index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
}
