//! Triage pipeline stages.
//!
//! Leaves first:
//!
//! - [`sentiment::SentimentClassifier`]: similarity against reference sentences
//! - [`urgency::UrgencyEstimator`]: offline keyword ladder
//! - [`caption::ImageCaptioner`]: ordered caption-model fallback
//! - [`contextual::ContextualAnalyzer`]: caption + context into a technical report
//! - [`image::ImageAnalyzer`]: per-image orchestration and failure isolation
//! - [`grievance::GrievanceTriage`]: the aggregate entry point
//!
//! Service-backed analyzers hold a [`base::BaseAnalyzer`] by composition and
//! delegate [`Analyzer`] to it. No stage returns an error to its caller; each
//! one degrades to a documented default.
//!
//! The [`AnalyzerRegistry`] builds each stage on first use and hands out
//! shared handles afterwards.

pub mod base;
pub mod caption;
pub mod contextual;
pub mod grievance;
pub mod image;
pub mod sentiment;
pub mod urgency;

pub use caption::{decode_image, ImageCaptioner};
pub use contextual::{ContextualAnalyzer, GenerationSettings};
pub use grievance::{overall_severity, validate_submission, GrievanceTriage};
pub use image::ImageAnalyzer;
pub use sentiment::SentimentClassifier;
pub use urgency::UrgencyEstimator;

use crate::config::TriageConfig;
use crate::services::{CaptionService, GenerationService, SimilarityService};
use std::sync::{Arc, OnceLock};

/// Common trait for pipeline stages
pub trait Analyzer: Send + Sync {
    /// Stage name, used in logs and timeout errors
    fn name(&self) -> &str;
}

/// Lazily constructed, shared pipeline stages
pub struct AnalyzerRegistry {
    config: Arc<TriageConfig>,
    similarity: Option<Arc<dyn SimilarityService>>,
    captioners: Vec<Arc<dyn CaptionService>>,
    generator: Option<Arc<dyn GenerationService>>,
    sentiment: OnceLock<Arc<SentimentClassifier>>,
    urgency: OnceLock<Arc<UrgencyEstimator>>,
    captioner: OnceLock<Arc<ImageCaptioner>>,
    contextual: OnceLock<Arc<ContextualAnalyzer>>,
    image: OnceLock<Arc<ImageAnalyzer>>,
    grievance: OnceLock<Arc<GrievanceTriage>>,
}

impl AnalyzerRegistry {
    pub(crate) fn new(
        config: Arc<TriageConfig>,
        similarity: Option<Arc<dyn SimilarityService>>,
        captioners: Vec<Arc<dyn CaptionService>>,
        generator: Option<Arc<dyn GenerationService>>,
    ) -> Self {
        Self {
            config,
            similarity,
            captioners,
            generator,
            sentiment: OnceLock::new(),
            urgency: OnceLock::new(),
            captioner: OnceLock::new(),
            contextual: OnceLock::new(),
            image: OnceLock::new(),
            grievance: OnceLock::new(),
        }
    }

    pub fn sentiment(&self) -> Arc<SentimentClassifier> {
        self.sentiment.get_or_init(|| {
            Arc::new(SentimentClassifier::new(
                self.similarity.clone(),
                Arc::new(self.config.references.clone()),
                self.config.timeouts.similarity,
            ))
        }).clone()
    }

    pub fn urgency(&self) -> Arc<UrgencyEstimator> {
        self.urgency.get_or_init(|| {
            Arc::new(UrgencyEstimator::new(&self.config.urgency_keywords))
        }).clone()
    }

    pub fn captioner(&self) -> Arc<ImageCaptioner> {
        self.captioner.get_or_init(|| {
            Arc::new(ImageCaptioner::new(
                self.captioners.clone(),
                self.config.timeouts.caption,
            ))
        }).clone()
    }

    pub fn contextual(&self) -> Arc<ContextualAnalyzer> {
        self.contextual.get_or_init(|| {
            let settings = GenerationSettings {
                model: self.config.generation_model.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };
            Arc::new(ContextualAnalyzer::new(
                self.generator.clone(),
                settings,
                self.config.timeouts.generation,
            ))
        }).clone()
    }

    pub fn image(&self) -> Arc<ImageAnalyzer> {
        self.image.get_or_init(|| {
            Arc::new(ImageAnalyzer::new(self.captioner(), self.contextual()))
        }).clone()
    }

    pub fn grievance(&self) -> Arc<GrievanceTriage> {
        self.grievance.get_or_init(|| {
            Arc::new(GrievanceTriage::new(
                self.sentiment(),
                self.urgency(),
                self.image(),
                self.config.image_concurrency,
            ))
        }).clone()
    }
}
