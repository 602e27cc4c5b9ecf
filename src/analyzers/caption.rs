// Image Captioner

use crate::analyzers::{base::BaseAnalyzer, Analyzer};
use crate::services::CaptionService;
use crate::types::*;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Tries caption providers in order and keeps the first non-empty caption.
pub struct ImageCaptioner {
    base: BaseAnalyzer,
    providers: Vec<Arc<dyn CaptionService>>,
}

impl ImageCaptioner {
    pub fn new(providers: Vec<Arc<dyn CaptionService>>, timeout: Duration) -> Self {
        Self {
            base: BaseAnalyzer::new("captioning", timeout),
            providers,
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Caption base64 image data (a `data:` URI prefix is accepted).
    ///
    /// Image data that does not decode counts as "no caption", the same as
    /// every provider failing. Nothing is decoded when there are no providers.
    pub async fn caption(&self, image_base64: &str) -> Option<String> {
        if self.providers.is_empty() {
            return None;
        }
        match decode_image(image_base64) {
            Ok(image) => self.caption_bytes(image).await,
            Err(e) => {
                tracing::warn!(error = %e, "image could not be decoded, treating as uncaptioned");
                None
            }
        }
    }

    /// Caption decoded image bytes.
    ///
    /// `None` is the normal "no caption" outcome: every provider failed,
    /// timed out, or returned blank text. Provider errors are not propagated.
    pub async fn caption_bytes(&self, image: Bytes) -> Option<String> {
        for provider in &self.providers {
            match self.base.guarded(provider.caption(image.clone())).await {
                Ok(Some(caption)) if !caption.trim().is_empty() => {
                    tracing::debug!(model = provider.model(), "caption obtained");
                    return Some(caption.trim().to_string());
                }
                Ok(_) => {
                    tracing::debug!(model = provider.model(), "empty caption, trying next model");
                }
                Err(e) => {
                    tracing::debug!(model = provider.model(), error = %e, "caption model failed, trying next model");
                }
            }
        }
        None
    }
}

impl Analyzer for ImageCaptioner {
    fn name(&self) -> &str {
        self.base.name()
    }
}

/// Decode base64 image data, accepting an optional `data:<mime>;base64,` prefix.
pub fn decode_image(image_base64: &str) -> TriageResult<Bytes> {
    let trimmed = image_base64.trim();
    let payload = if trimmed.starts_with("data:") {
        trimmed
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| TriageError::InvalidImage("data URI has no payload".into()))?
    } else {
        trimmed
    };

    // MIME-style base64 may be wrapped across lines
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| TriageError::InvalidImage(format!("base64 decode failed: {}", e)))?;

    if bytes.is_empty() {
        return Err(TriageError::InvalidImage("image is empty".into()));
    }
    Ok(Bytes::from(bytes))
}
