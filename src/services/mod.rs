//! External scoring services.
//!
//! The pipeline consumes three hosted services as black boxes. Each one sits
//! behind an async trait so analyzers can be driven by the HTTP adapters in
//! this module or by any other implementation (tests use in-process mocks).

pub mod groq;
pub mod huggingface;

pub use groq::GroqChat;
pub use huggingface::{HuggingFaceCaptioner, HuggingFaceSimilarity};

use crate::config::TlsConfig;
use crate::types::*;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client as HttpClient};
use std::time::Duration;

/// Scores a source text against candidate sentences
#[async_trait]
pub trait SimilarityService: Send + Sync {
    /// One score per candidate, aligned by position
    async fn similarity(&self, source: &str, candidates: &[String]) -> TriageResult<Vec<f64>>;
}

/// Produces a short caption for an image
#[async_trait]
pub trait CaptionService: Send + Sync {
    /// Model identifier, used in logs
    fn model(&self) -> &str;

    /// `Ok(None)` means the model answered but had nothing to say
    async fn caption(&self, image: Bytes) -> TriageResult<Option<String>>;
}

/// Chat-style text generation
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: ChatRequest) -> TriageResult<String>;
}

/// Build the shared HTTP client
pub(crate) fn build_http_client(tls: &TlsConfig, timeout: Duration) -> TriageResult<HttpClient> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    let mut builder = HttpClient::builder()
        .default_headers(headers)
        .timeout(timeout)
        .danger_accept_invalid_certs(!tls.cert_verification);

    if let Some(version) = tls.min_tls_version {
        builder = builder.min_tls_version(version);
    }

    builder
        .build()
        .map_err(|e| crate::request_error!(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success status into an error, sanitizing the body
pub(crate) async fn check_status(
    service: &str,
    response: reqwest::Response,
) -> TriageResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    if status == 429 {
        return Err(TriageError::RateLimited {
            service: service.to_string(),
            retry_after,
        });
    }

    let sanitized = sanitize_error_message(&body);
    Err(TriageError::api_error(
        format!("{} responded with {}", service, status),
        Some(status),
        Some(sanitized),
        Some(concat!(file!(), ":", line!())),
    ))
}
