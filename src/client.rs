// Triage Client

use crate::analyzers::*;
use crate::config::TriageConfig;
use crate::routing::{self, Category, TriageDecision};
use crate::services::*;
use crate::types::*;
use std::sync::{Arc, OnceLock};

/// Entry point for grievance triage.
///
/// Holds the configuration and the external service handles. Analyzers are
/// built on first use and shared by every clone of the client. Cloning is
/// cheap.
#[derive(Clone)]
pub struct TriageClient {
    config: Arc<TriageConfig>,
    similarity: Option<Arc<dyn SimilarityService>>,
    captioners: Vec<Arc<dyn CaptionService>>,
    generator: Option<Arc<dyn GenerationService>>,
    registry: Arc<OnceLock<Arc<AnalyzerRegistry>>>,
}

impl TriageClient {
    /// Create a client backed by the hosted services named in `config`.
    ///
    /// Services whose credentials are absent are left unset and their stages
    /// degrade to fallback results.
    pub fn new(config: TriageConfig) -> TriageResult<Self> {
        config.validate()?;
        let longest = config
            .timeouts
            .similarity
            .max(config.timeouts.caption)
            .max(config.timeouts.generation);
        let http_client = build_http_client(&config.tls, longest)?;

        let similarity = config.hf_token.as_ref().map(|token| {
            Arc::new(HuggingFaceSimilarity::new(
                http_client.clone(),
                token.clone(),
                config.similarity_url.clone(),
                config.timeouts.similarity,
            )) as Arc<dyn SimilarityService>
        });

        let captioners = match &config.hf_token {
            Some(token) => config
                .caption_models
                .iter()
                .map(|model| {
                    Arc::new(HuggingFaceCaptioner::new(
                        http_client.clone(),
                        token.clone(),
                        &config.caption_base_url,
                        model.clone(),
                        config.timeouts.caption,
                    )) as Arc<dyn CaptionService>
                })
                .collect(),
            None => Vec::new(),
        };

        let generator = config.groq_api_key.as_ref().map(|key| {
            Arc::new(GroqChat::new(
                http_client.clone(),
                key.clone(),
                config.generation_url.clone(),
                config.timeouts.generation,
            )) as Arc<dyn GenerationService>
        });

        let client = Self {
            config: Arc::new(config),
            similarity,
            captioners,
            generator,
            registry: Arc::new(OnceLock::new()),
        };
        for gap in client.credential_gaps() {
            tracing::warn!(reason = %gap, "affected stages will use fallback results");
        }
        Ok(client)
    }

    /// Missing credentials that leave stages on their fallback results.
    ///
    /// `HF_TOKEN` covers sentiment and captioning, `GROQ_API_KEY` the
    /// contextual image analysis.
    pub fn credential_gaps(&self) -> Vec<TriageError> {
        let mut gaps = Vec::new();
        if self.similarity.is_none() && self.captioners.is_empty() {
            gaps.push(TriageError::missing_credentials("HF_TOKEN"));
        }
        if self.generator.is_none() {
            gaps.push(TriageError::missing_credentials("GROQ_API_KEY"));
        }
        gaps
    }

    /// Create a client with no external services; every stage degrades
    pub fn offline(config: TriageConfig) -> Self {
        Self {
            config: Arc::new(config),
            similarity: None,
            captioners: Vec::new(),
            generator: None,
            registry: Arc::new(OnceLock::new()),
        }
    }

    /// Replace the similarity service
    pub fn with_similarity_service(mut self, service: Arc<dyn SimilarityService>) -> Self {
        self.similarity = Some(service);
        self.reset_registry();
        self
    }

    /// Replace the ordered list of caption services
    pub fn with_caption_services(mut self, services: Vec<Arc<dyn CaptionService>>) -> Self {
        self.captioners = services;
        self.reset_registry();
        self
    }

    /// Replace the generation service
    pub fn with_generation_service(mut self, service: Arc<dyn GenerationService>) -> Self {
        self.generator = Some(service);
        self.reset_registry();
        self
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Get the analyzer registry
    pub fn analyzers(&self) -> Arc<AnalyzerRegistry> {
        self.registry.get_or_init(|| {
            Arc::new(AnalyzerRegistry::new(
                self.config.clone(),
                self.similarity.clone(),
                self.captioners.clone(),
                self.generator.clone(),
            ))
        }).clone()
    }

    pub fn sentiment(&self) -> Arc<SentimentClassifier> {
        self.analyzers().sentiment()
    }

    pub fn urgency(&self) -> Arc<UrgencyEstimator> {
        self.analyzers().urgency()
    }

    pub fn captioner(&self) -> Arc<ImageCaptioner> {
        self.analyzers().captioner()
    }

    pub fn contextual(&self) -> Arc<ContextualAnalyzer> {
        self.analyzers().contextual()
    }

    pub fn images(&self) -> Arc<ImageAnalyzer> {
        self.analyzers().image()
    }

    /// Triage a grievance. Never fails; degraded stages are reported inside
    /// the result.
    pub async fn analyze<S: AsRef<str>>(
        &self,
        text: &str,
        images: &[S],
        context: Option<&str>,
    ) -> GrievanceAnalysis {
        self.analyzers().grievance().analyze(text, images, context).await
    }

    /// Sentiment and urgency only
    pub async fn analyze_text(&self, text: &str) -> TextAnalysis {
        self.analyzers().grievance().analyze_text(text).await
    }

    /// Analyze a single image outside of a grievance
    pub async fn analyze_image(&self, image_base64: &str, context: Option<&str>) -> ImageAnalysisResult {
        self.images().analyze(0, image_base64, context).await
    }

    /// Department and priority for an analyzed grievance
    pub fn route(
        &self,
        analysis: &GrievanceAnalysis,
        text: &str,
        category: Option<Category>,
    ) -> TriageDecision {
        routing::route(
            analysis,
            text,
            category,
            &self.config.departments,
            &self.config.priority,
        )
    }

    // Services changed, so analyzers built from the old ones must go
    fn reset_registry(&mut self) {
        self.registry = Arc::new(OnceLock::new());
    }
}
