// Hugging Face inference adapters: sentence similarity and image-to-text

use crate::services::{check_status, CaptionService, SimilarityService};
use crate::types::*;
use crate::parse_error;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client as HttpClient};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const SIMILARITY_SERVICE: &str = "similarity";
const CAPTION_SERVICE: &str = "captioning";

#[derive(Serialize)]
struct SimilarityPayload<'a> {
    inputs: SimilarityInputs<'a>,
}

#[derive(Serialize)]
struct SimilarityInputs<'a> {
    source_sentence: &'a str,
    sentences: &'a [String],
}

/// Sentence-similarity pipeline endpoint
#[derive(Clone)]
pub struct HuggingFaceSimilarity {
    http_client: HttpClient,
    token: SecureApiKey,
    url: String,
    timeout: Duration,
}

impl HuggingFaceSimilarity {
    pub fn new(
        http_client: HttpClient,
        token: SecureApiKey,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            token,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SimilarityService for HuggingFaceSimilarity {
    async fn similarity(&self, source: &str, candidates: &[String]) -> TriageResult<Vec<f64>> {
        let payload = SimilarityPayload {
            inputs: SimilarityInputs {
                source_sentence: source,
                sentences: candidates,
            },
        };

        let response = self
            .http_client
            .post(&self.url)
            .header(header::AUTHORIZATION, self.token.bearer())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;
        let response = check_status(SIMILARITY_SERVICE, response).await?;

        let scores = response
            .json::<Vec<f64>>()
            .await
            .map_err(|e| parse_error!(format!("similarity scores: {}", e)))?;

        if scores.len() != candidates.len() {
            tracing::warn!(
                expected = candidates.len(),
                received = scores.len(),
                "similarity score count does not match candidates"
            );
        }
        Ok(scores)
    }
}

/// Image-to-text endpoint bound to a single model
#[derive(Clone)]
pub struct HuggingFaceCaptioner {
    http_client: HttpClient,
    token: SecureApiKey,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl HuggingFaceCaptioner {
    pub fn new(
        http_client: HttpClient,
        token: SecureApiKey,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let model = model.into();
        Self {
            http_client,
            token,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model),
            model,
            timeout,
        }
    }
}

#[async_trait]
impl CaptionService for HuggingFaceCaptioner {
    fn model(&self) -> &str {
        &self.model
    }

    async fn caption(&self, image: Bytes) -> TriageResult<Option<String>> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, self.token.bearer())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .timeout(self.timeout)
            .body(image)
            .send()
            .await?;
        let response = check_status(CAPTION_SERVICE, response).await?;

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| parse_error!(format!("caption response: {}", e)))?;
        Ok(generated_text(&body))
    }
}

/// The endpoint answers with either `[{"generated_text": ..}]` or a bare object
fn generated_text(body: &Value) -> Option<String> {
    let entry = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    entry
        .get("generated_text")?
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
}
