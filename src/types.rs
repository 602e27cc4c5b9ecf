// Core types and errors

use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::collections::BTreeMap;
use std::time::Duration;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// The result type used throughout the triage pipeline
pub type TriageResult<T> = Result<T, TriageError>;

/// Convert reqwest::Error to our TriageError
impl From<reqwest::Error> for TriageError {
    fn from(err: reqwest::Error) -> Self {
        TriageError::RequestError {
            message: sanitize_error_message(&err.to_string()),
            details: None,
            location: None,
            source: Some(Arc::new(err) as Arc<dyn std::error::Error + Send + Sync>),
        }
    }
}

/// A secure container for service credentials that zeroes memory when dropped
pub struct SecureApiKey {
    key: String,
}

impl SecureApiKey {
    /// Create a new secure API key
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Get a reference to the underlying key
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Build the value of an `Authorization: Bearer` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.key)
    }
}

impl Deref for SecureApiKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.key
    }
}

// Overwrite the key bytes so the credential does not linger in freed memory
impl Drop for SecureApiKey {
    fn drop(&mut self) {
        unsafe {
            let bytes = self.key.as_bytes_mut();
            bytes.iter_mut().for_each(|b| *b = 0);
        }
    }
}

impl fmt::Debug for SecureApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureApiKey([REDACTED])")
    }
}

impl fmt::Display for SecureApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED API KEY]")
    }
}

impl Clone for SecureApiKey {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum TriageError {
    #[error("Service request failed: {message}")]
    RequestError {
        message: String,
        details: Option<String>,
        location: Option<String>,
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to parse service response: {message}")]
    ParseError {
        message: String,
        source_text: Option<String>,
        location: Option<String>,
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Rate limited by {service}: retry after {retry_after:?}")]
    RateLimited {
        service: String,
        retry_after: Option<Duration>,
    },

    #[error("{service} credentials not configured")]
    MissingCredentials {
        service: String,
    },

    #[error("Service returned error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
        response_body: Option<String>,
        location: Option<String>,
    },

    #[error("{service} call timed out after {after:?}")]
    Timeout {
        service: String,
        after: Duration,
    },

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl TriageError {
    pub fn request_error<T: Into<String>>(
        message: T,
        details: Option<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
        location: Option<&str>,
    ) -> Self {
        let error = Self::RequestError {
            message: message.into(),
            details,
            location: location.map(String::from),
            source: source.map(|e| Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>),
        };
        error.log();
        error
    }

    pub fn parse_error<T: Into<String>>(
        message: T,
        source_text: Option<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
        location: Option<&str>,
    ) -> Self {
        let error = Self::ParseError {
            message: message.into(),
            source_text,
            location: location.map(String::from),
            source: source.map(|e| Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>),
        };
        error.log();
        error
    }

    pub fn api_error<T: Into<String>>(
        message: T,
        status: Option<u16>,
        response_body: Option<String>,
        location: Option<&str>,
    ) -> Self {
        let error = Self::ApiError {
            message: message.into(),
            status: status.unwrap_or(500),
            response_body,
            location: location.map(String::from),
        };
        error.log();
        error
    }

    pub fn missing_credentials(service: impl Into<String>) -> Self {
        Self::MissingCredentials {
            service: service.into(),
        }
    }

    pub fn timeout(service: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            service: service.into(),
            after,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::RequestError { location, .. } => location.as_deref(),
            Self::ParseError { location, .. } => location.as_deref(),
            Self::ApiError { location, .. } => location.as_deref(),
            _ => None,
        }
    }

    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        match self {
            Self::RequestError { source, .. } => source.as_ref().map(|s| s.as_ref()),
            Self::ParseError { source, .. } => source.as_ref().map(|s| s.as_ref()),
            _ => None,
        }
    }

    fn log(&self) {
        if let Some(loc) = self.location() {
            log::error!("{} at {}", self, loc);
        } else {
            log::error!("{}", self);
        }
    }
}

/// Build a request error carrying the call site
#[macro_export]
macro_rules! request_error {
    ($message:expr) => {
        $crate::types::TriageError::request_error($message, None, None::<reqwest::Error>, Some(concat!(file!(), ":", line!())))
    };
    ($message:expr, $details:expr) => {
        $crate::types::TriageError::request_error($message, Some($details), None::<reqwest::Error>, Some(concat!(file!(), ":", line!())))
    };
}

/// Build a parse error carrying the call site
#[macro_export]
macro_rules! parse_error {
    ($message:expr) => {
        $crate::types::TriageError::parse_error($message, None, None::<serde_json::Error>, Some(concat!(file!(), ":", line!())))
    };
    ($message:expr, $source_text:expr) => {
        $crate::types::TriageError::parse_error($message, Some($source_text), None::<serde_json::Error>, Some(concat!(file!(), ":", line!())))
    };
    ($message:expr, $source_text:expr, $source:expr) => {
        $crate::types::TriageError::parse_error($message, Some($source_text), Some($source), Some(concat!(file!(), ":", line!())))
    };
}

/// Helper function to sanitize error messages to prevent leaking credentials
pub fn sanitize_error_message(message: &str) -> String {
    lazy_static::lazy_static! {
        static ref TOKEN_PATTERN: regex::Regex = regex::Regex::new(r"[A-Za-z0-9_-]{20,}").unwrap();
    }
    TOKEN_PATTERN.replace_all(message, "[REDACTED]").into_owned()
}

// ---------------------------------------------------------------------------
// Triage data model
// ---------------------------------------------------------------------------

/// Sentiment label produced by the similarity classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Fixed iteration order; earlier labels win ties
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    pub confidence: f64,
    pub similarity_scores: BTreeMap<SentimentLabel, f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl SentimentResult {
    /// Neutral result flagged with a diagnostic
    pub fn undetermined(
        similarity_scores: BTreeMap<SentimentLabel, f64>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            similarity_scores,
            error: Some(error.into()),
        }
    }

    pub fn is_determined(&self) -> bool {
        self.error.is_none()
    }
}

/// Keyword-derived urgency in the range 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct UrgencyScore(u8);

impl UrgencyScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Clamps into the valid range
    pub fn new(value: u8) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for UrgencyScore {
    type Error = TriageError;

    /// Unlike [`UrgencyScore::new`], out-of-range values are rejected
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TriageError::ValidationError(format!(
                "urgency score must be between {} and {}, but got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }
}

impl From<UrgencyScore> for u8 {
    fn from(score: UrgencyScore) -> Self {
        score.0
    }
}

impl fmt::Display for UrgencyScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity reported for a single image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    /// Only produced when analysis of an image failed outright
    Unknown,
}

impl Severity {
    /// Lenient parse of a model-supplied severity tag
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of the grievance as a whole, folded over its images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for OverallSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverallSeverity::Low => "low",
            OverallSeverity::Medium => "medium",
            OverallSeverity::High => "high",
        })
    }
}

/// Technical report for one image, as produced by the contextual analyzer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageFindings {
    pub description: String,
    pub key_observations: Vec<String>,
    pub identified_problems: Vec<String>,
    pub affected_areas: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub severity: Severity,
    pub severity_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysisResult {
    #[serde(flatten)]
    pub findings: ImageFindings,
    pub image_index: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl ImageAnalysisResult {
    pub fn new(image_index: usize, findings: ImageFindings) -> Self {
        Self {
            findings,
            image_index,
            error: None,
        }
    }

    /// Result recorded when an image could not be analyzed at all
    pub fn failed(image_index: usize, error: impl Into<String>) -> Self {
        Self {
            findings: ImageFindings {
                severity: Severity::Unknown,
                ..ImageFindings::default()
            },
            image_index,
            error: Some(error.into()),
        }
    }

    pub fn severity(&self) -> Severity {
        self.findings.severity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    #[serde(flatten)]
    pub sentiment: SentimentResult,
    pub urgency_score: UrgencyScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrievanceAnalysis {
    pub text_analysis: TextAnalysis,
    pub image_analyses: Vec<ImageAnalysisResult>,
    pub overall_urgency: UrgencyScore,
    pub overall_severity: OverallSeverity,
}

// ---------------------------------------------------------------------------
// Generation service wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Text of the last user message, if any
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }
}
