// Grievance Triage Aggregator

use crate::analyzers::image::ImageAnalyzer;
use crate::analyzers::sentiment::SentimentClassifier;
use crate::analyzers::urgency::UrgencyEstimator;
use crate::analyzers::Analyzer;
use crate::types::*;
use crate::utils::StringValidator;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Shortest grievance text accepted at submission time
pub const MIN_GRIEVANCE_LENGTH: usize = 10;

/// Top-level entry point of the pipeline.
pub struct GrievanceTriage {
    sentiment: Arc<SentimentClassifier>,
    urgency: Arc<UrgencyEstimator>,
    images: Arc<ImageAnalyzer>,
    image_concurrency: usize,
}

impl GrievanceTriage {
    pub fn new(
        sentiment: Arc<SentimentClassifier>,
        urgency: Arc<UrgencyEstimator>,
        images: Arc<ImageAnalyzer>,
        image_concurrency: usize,
    ) -> Self {
        Self {
            sentiment,
            urgency,
            images,
            image_concurrency: image_concurrency.max(1),
        }
    }

    /// Sentiment plus urgency for the grievance text
    pub async fn analyze_text(&self, text: &str) -> TextAnalysis {
        let sentiment = self.sentiment.classify(text).await;
        let urgency_score = self.urgency.score(text);
        TextAnalysis {
            sentiment,
            urgency_score,
        }
    }

    /// Run the full triage. Always returns a best-effort result.
    ///
    /// `context` is handed to the image analyzer; when `None`, the grievance
    /// text itself is used. Images are analyzed concurrently but results keep
    /// their input order and `image_index` matches the input position.
    pub async fn analyze<S: AsRef<str>>(
        &self,
        text: &str,
        images: &[S],
        context: Option<&str>,
    ) -> GrievanceAnalysis {
        let context = context.unwrap_or(text);

        let image_analyses = stream::iter(images.iter().enumerate())
            .map(|(index, image)| self.images.analyze(index, image.as_ref(), Some(context)))
            .buffered(self.image_concurrency)
            .collect::<Vec<_>>();

        let (text_analysis, image_analyses) = tokio::join!(self.analyze_text(text), image_analyses);

        let overall_urgency = text_analysis.urgency_score;
        let overall_severity = overall_severity(&image_analyses);

        tracing::info!(
            sentiment = %text_analysis.sentiment.label,
            urgency = overall_urgency.value(),
            images = image_analyses.len(),
            severity = %overall_severity,
            "grievance triaged"
        );

        GrievanceAnalysis {
            text_analysis,
            image_analyses,
            overall_urgency,
            overall_severity,
        }
    }
}

impl Analyzer for GrievanceTriage {
    fn name(&self) -> &str {
        "grievance"
    }
}

/// Fold per-image severities into one grievance severity.
///
/// Any high (or critical) image makes the grievance high. It is low only
/// when there is at least one image and every image is low. Everything
/// else, including no images at all, is medium.
pub fn overall_severity(images: &[ImageAnalysisResult]) -> OverallSeverity {
    if images
        .iter()
        .any(|img| matches!(img.severity(), Severity::High | Severity::Critical))
    {
        OverallSeverity::High
    } else if !images.is_empty() && images.iter().all(|img| img.severity() == Severity::Low) {
        OverallSeverity::Low
    } else {
        OverallSeverity::Medium
    }
}

/// Check the submission rule callers apply before triage
pub fn validate_submission(text: impl Into<String>) -> TriageResult<String> {
    StringValidator::min_length(text, MIN_GRIEVANCE_LENGTH, "grievance text")
}
