// Image Analysis Orchestrator

use crate::analyzers::caption::ImageCaptioner;
use crate::analyzers::contextual::{ContextualAnalyzer, PLACEHOLDER_CAPTION};
use crate::analyzers::Analyzer;
use crate::types::*;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Composes captioning and contextual analysis for one image at a time.
pub struct ImageAnalyzer {
    captioner: Arc<ImageCaptioner>,
    contextual: Arc<ContextualAnalyzer>,
}

impl ImageAnalyzer {
    pub fn new(captioner: Arc<ImageCaptioner>, contextual: Arc<ContextualAnalyzer>) -> Self {
        Self {
            captioner,
            contextual,
        }
    }

    /// Analyze the image at `image_index`.
    ///
    /// Undecodable data is handled like a failed caption. A panic while
    /// handling this image is converted into a result with
    /// [`Severity::Unknown`] so sibling images are unaffected.
    pub async fn analyze(
        &self,
        image_index: usize,
        image_base64: &str,
        context: Option<&str>,
    ) -> ImageAnalysisResult {
        let attempt = AssertUnwindSafe(self.findings(image_base64, context))
            .catch_unwind()
            .await;

        match attempt {
            Ok(findings) => ImageAnalysisResult::new(image_index, findings),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(image_index, %message, "image analysis panicked");
                ImageAnalysisResult::failed(image_index, message)
            }
        }
    }

    async fn findings(&self, image_base64: &str, context: Option<&str>) -> ImageFindings {
        let context = context.map(str::trim).filter(|c| !c.is_empty());

        if let Some(caption) = self.captioner.caption(image_base64).await {
            return self.contextual.analyze(&caption, context).await;
        }

        match context {
            Some(context) => {
                tracing::info!("captioning unavailable, analyzing from grievance context");
                self.contextual.analyze(PLACEHOLDER_CAPTION, Some(context)).await
            }
            None => {
                tracing::info!("captioning unavailable and no context, flagging for manual review");
                manual_review_findings()
            }
        }
    }
}

impl Analyzer for ImageAnalyzer {
    fn name(&self) -> &str {
        "image"
    }
}

/// Static result for an image with neither a caption nor grievance context
pub fn manual_review_findings() -> ImageFindings {
    ImageFindings {
        description: "Image uploaded as supporting evidence".to_string(),
        key_observations: vec!["Visual evidence provided by citizen".to_string()],
        identified_problems: vec!["Issue documented in uploaded image".to_string()],
        affected_areas: vec!["To be determined by manual review".to_string()],
        recommended_actions: vec!["Manual inspection of uploaded image recommended".to_string()],
        severity: Severity::Medium,
        severity_reason: "Automated image analysis temporarily unavailable - manual review needed"
            .to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("analysis panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("analysis panicked: {}", message)
    } else {
        "analysis panicked".to_string()
    }
}
