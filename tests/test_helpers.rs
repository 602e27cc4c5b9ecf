// Shared mock services for the integration tests

use async_trait::async_trait;
use bytes::Bytes;
use grievance_triage::config::{ReferenceSentences, Timeouts};
use grievance_triage::services::{CaptionService, GenerationService, SimilarityService};
use grievance_triage::{ChatRequest, SentimentLabel, TriageClient, TriageConfig, TriageError, TriageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A tiny valid base64 payload standing in for an uploaded photo
#[allow(dead_code)]
pub const SAMPLE_IMAGE: &str = "iVBORw0KGgoAAAANSUhEUgAAAAE=";

#[allow(dead_code)]
pub fn sample_data_uri() -> String {
    format!("data:image/png;base64,{}", SAMPLE_IMAGE)
}

#[allow(dead_code)]
pub fn unavailable(service: &str) -> TriageError {
    TriageError::api_error(format!("{} unavailable", service), Some(503), None, None)
}

/// Test configuration with short timeouts
#[allow(dead_code)]
pub fn test_config() -> TriageConfig {
    TriageConfig::default().with_timeouts(Timeouts::uniform(Duration::from_millis(200)))
}

/// Offline client with the given services attached
#[allow(dead_code)]
pub fn client_with(
    similarity: Option<Arc<dyn SimilarityService>>,
    captioners: Vec<Arc<dyn CaptionService>>,
    generator: Option<Arc<dyn GenerationService>>,
) -> TriageClient {
    let mut client = TriageClient::offline(test_config()).with_caption_services(captioners);
    if let Some(similarity) = similarity {
        client = client.with_similarity_service(similarity);
    }
    if let Some(generator) = generator {
        client = client.with_generation_service(generator);
    }
    client
}

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

/// Answers per label; labels without a configured answer fail with 503
#[derive(Default)]
pub struct MockSimilarity {
    references: ReferenceSentences,
    answers: HashMap<SentimentLabel, Vec<f64>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockSimilarity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scores(mut self, label: SentimentLabel, scores: Vec<f64>) -> Self {
        self.answers.insert(label, scores);
        self
    }

    /// Sleep before answering, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn label_for(&self, candidates: &[String]) -> Option<SentimentLabel> {
        SentimentLabel::ALL
            .into_iter()
            .find(|&label| self.references.for_label(label) == candidates)
    }
}

#[async_trait]
impl SimilarityService for MockSimilarity {
    async fn similarity(&self, _source: &str, candidates: &[String]) -> TriageResult<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.label_for(candidates)
            .and_then(|label| self.answers.get(&label).cloned())
            .ok_or_else(|| unavailable("similarity"))
    }
}

// ---------------------------------------------------------------------------
// Captioning
// ---------------------------------------------------------------------------

#[allow(dead_code)]
pub enum CaptionBehaviour {
    Caption(&'static str),
    Blank,
    Fail,
    Hang,
    Panic,
}

pub struct MockCaptioner {
    model: String,
    behaviour: CaptionBehaviour,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockCaptioner {
    pub fn new(model: &str, behaviour: CaptionBehaviour) -> Self {
        Self {
            model: model.to_string(),
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn shared(model: &str, behaviour: CaptionBehaviour) -> Arc<Self> {
        Arc::new(Self::new(model, behaviour))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptionService for MockCaptioner {
    fn model(&self) -> &str {
        &self.model
    }

    async fn caption(&self, _image: Bytes) -> TriageResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            CaptionBehaviour::Caption(text) => Ok(Some(text.to_string())),
            CaptionBehaviour::Blank => Ok(Some("   ".to_string())),
            CaptionBehaviour::Fail => Err(unavailable("captioning")),
            CaptionBehaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Some("too late".to_string()))
            }
            CaptionBehaviour::Panic => panic!("caption model crashed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Returns a fixed reply (or error) and records every request
pub struct MockGenerator {
    reply: TriageResult<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

#[allow(dead_code)]
impl MockGenerator {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(unavailable("generation")),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|r| r.user_prompt().map(String::from))
    }
}

#[async_trait]
impl GenerationService for MockGenerator {
    async fn generate(&self, request: ChatRequest) -> TriageResult<String> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone()
    }
}

/// A complete findings object as a model would return it
#[allow(dead_code)]
pub fn findings_json(description: &str, severity: &str) -> String {
    serde_json::json!({
        "description": description,
        "key_observations": ["Asphalt surface degradation approximately 2-3 sq meters"],
        "identified_problems": ["Primary deficiency: pothole - carriageway failure"],
        "affected_areas": ["Primary impact zone: public right-of-way"],
        "recommended_actions": ["Immediate: cordon off the area"],
        "severity": severity,
        "severity_reason": "Risk to two-wheeler traffic"
    })
    .to_string()
}
