//! Runtime configuration for the triage pipeline.
//!
//! Everything the pipeline treats as fixed data (reference sentences, keyword
//! tiers, the department table) lives here and is built once, then shared
//! read-only behind an `Arc` by every analyzer.

use crate::routing::{Category, DepartmentTable};
use crate::types::*;
use crate::utils::validate_range;
use std::time::Duration;

pub const DEFAULT_SIMILARITY_URL: &str =
    "https://router.huggingface.co/hf-inference/models/intfloat/multilingual-e5-small/pipeline/sentence-similarity";
pub const DEFAULT_CAPTION_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_GENERATION_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GENERATION_MODEL: &str = "llama-3.3-70b-versatile";

pub const DEFAULT_CAPTION_MODELS: [&str; 3] = [
    "Salesforce/blip-image-captioning-large",
    "Salesforce/blip-image-captioning-base",
    "nlpconnect/vit-gpt2-image-captioning",
];

/// Configuration for TLS
#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub min_tls_version: Option<reqwest::tls::Version>,
    pub cert_verification: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_tls_version: Some(reqwest::tls::Version::TLS_1_2),
            cert_verification: true,
        }
    }
}

/// Per-service call timeouts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub similarity: Duration,
    pub caption: Duration,
    pub generation: Duration,
}

impl Timeouts {
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            similarity: timeout,
            caption: timeout,
            generation: timeout,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(Duration::from_secs(30))
    }
}

/// Reference sentences the classifier compares grievance text against
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceSentences {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub neutral: Vec<String>,
}

impl ReferenceSentences {
    pub fn for_label(&self, label: SentimentLabel) -> &[String] {
        match label {
            SentimentLabel::Positive => &self.positive,
            SentimentLabel::Negative => &self.negative,
            SentimentLabel::Neutral => &self.neutral,
        }
    }
}

impl Default for ReferenceSentences {
    fn default() -> Self {
        Self {
            positive: owned(&[
                "I am happy and satisfied with the service",
                "This is excellent and wonderful work",
                "Thank you for resolving my issue quickly",
                "I appreciate the help and support provided",
            ]),
            negative: owned(&[
                "This is terrible and frustrating",
                "I am very angry and upset about this problem",
                "This situation is unacceptable and causing hardship",
                "Nobody is helping me and I am suffering",
                "This has been going on for too long without resolution",
            ]),
            neutral: owned(&[
                "I am reporting a general issue for your attention",
                "This is a routine matter that needs attention",
                "I would like to submit information about a situation",
                "Please look into this matter when possible",
            ]),
        }
    }
}

/// Keyword vocabularies for the three urgency tiers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrgencyKeywords {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl Default for UrgencyKeywords {
    fn default() -> Self {
        Self {
            high: owned(&[
                "emergency", "urgent", "dangerous", "life-threatening", "immediate",
                "critical", "severe", "flooding", "fire", "collapse", "accident",
            ]),
            medium: owned(&[
                "broken", "damaged", "not working", "leaking", "blocked", "delayed",
                "problem", "issue",
            ]),
            low: owned(&[
                "request", "suggestion", "inquiry", "information", "general", "routine",
            ]),
        }
    }
}

/// Urgency cut-offs used when assigning a priority tier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriorityThresholds {
    pub high_urgency: u8,
    pub low_urgency: u8,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        Self {
            high_urgency: 8,
            low_urgency: 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TriageConfig {
    /// Token for the similarity and captioning provider
    pub hf_token: Option<SecureApiKey>,
    /// Key for the text-generation provider
    pub groq_api_key: Option<SecureApiKey>,
    pub similarity_url: String,
    pub caption_base_url: String,
    pub generation_url: String,
    /// Caption models, tried in order
    pub caption_models: Vec<String>,
    pub generation_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeouts: Timeouts,
    /// Images analyzed concurrently within one grievance
    pub image_concurrency: usize,
    pub tls: TlsConfig,
    pub references: ReferenceSentences,
    pub urgency_keywords: UrgencyKeywords,
    pub departments: DepartmentTable,
    pub priority: PriorityThresholds,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            hf_token: None,
            groq_api_key: None,
            similarity_url: DEFAULT_SIMILARITY_URL.to_string(),
            caption_base_url: DEFAULT_CAPTION_BASE_URL.to_string(),
            generation_url: DEFAULT_GENERATION_URL.to_string(),
            caption_models: DEFAULT_CAPTION_MODELS.iter().map(|m| m.to_string()).collect(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            max_tokens: 800,
            temperature: 0.3,
            timeouts: Timeouts::default(),
            image_concurrency: 4,
            tls: TlsConfig::default(),
            references: ReferenceSentences::default(),
            urgency_keywords: UrgencyKeywords::default(),
            departments: DepartmentTable::default(),
            priority: PriorityThresholds::default(),
        }
    }
}

impl TriageConfig {
    /// Build a configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Missing credentials are not an error: the affected stages fall back to
    /// their degraded results.
    pub fn from_env() -> TriageResult<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        config.hf_token = non_empty_var("HF_TOKEN").map(SecureApiKey::new);
        config.groq_api_key = non_empty_var("GROQ_API_KEY").map(SecureApiKey::new);

        if let Some(secs) = non_empty_var("TRIAGE_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                TriageError::ValidationError(format!("TRIAGE_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.timeouts = Timeouts::uniform(Duration::from_secs(secs));
        }

        if let Some(models) = non_empty_var("TRIAGE_CAPTION_MODELS") {
            config.caption_models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(model) = non_empty_var("TRIAGE_GENERATION_MODEL") {
            config.generation_model = model;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_hf_token(mut self, token: impl Into<String>) -> Self {
        self.hf_token = Some(SecureApiKey::new(token));
        self
    }

    pub fn with_groq_api_key(mut self, key: impl Into<String>) -> Self {
        self.groq_api_key = Some(SecureApiKey::new(key));
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_caption_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.caption_models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Check numeric settings and endpoint URLs
    pub fn validate(&self) -> TriageResult<()> {
        validate_range(self.temperature, 0.0, 1.0, "temperature")?;
        validate_range(self.image_concurrency, 1, 64, "image_concurrency")?;
        if self.max_tokens == 0 {
            return Err(TriageError::ValidationError("max_tokens must be greater than 0".into()));
        }
        if self.priority.low_urgency >= self.priority.high_urgency {
            return Err(TriageError::ValidationError(
                "low_urgency threshold must be below high_urgency".into(),
            ));
        }
        for (name, value) in [
            ("similarity_url", &self.similarity_url),
            ("caption_base_url", &self.caption_base_url),
            ("generation_url", &self.generation_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                TriageError::ValidationError(format!("{} is not a valid URL: {}", name, e))
            })?;
        }
        Ok(())
    }

    pub fn department_for(&self, category: Category) -> &str {
        self.departments.department(category)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
