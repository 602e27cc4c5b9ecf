//! # grievance-triage: triage for citizen grievance reports
//!
//! Takes the free text of a grievance plus any attached images and produces a
//! structured triage signal:
//!
//! - sentiment, by similarity against reference sentences (hosted model)
//! - an urgency score from 1 to 10, from keyword tiers (offline)
//! - a technical report per image: a hosted captioning model describes the
//!   picture, then a hosted language model expands the caption into findings
//! - an overall severity folded over the images
//!
//! Every external call has a timeout and a fallback. [`TriageClient::analyze`]
//! always returns a result, even when every service is down or unconfigured.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use grievance_triage::from_env;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads HF_TOKEN and GROQ_API_KEY (a .env file is honoured)
//!     let triage = from_env()?;
//!
//!     let text = "Water main burst on 5th Avenue, street is flooding";
//!     let images: Vec<String> = Vec::new();
//!     let analysis = triage.analyze(text, &images, None).await;
//!
//!     let decision = triage.route(&analysis, text, None);
//!     println!("{} -> {} ({})", analysis.overall_urgency, decision.department, decision.priority);
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod client;
pub mod config;
mod builder;
pub mod services;
pub mod analyzers;
pub mod routing;
pub mod utils;

// Re-export core components
pub use client::TriageClient;
pub use config::{TriageConfig, Timeouts, TlsConfig, ReferenceSentences, UrgencyKeywords, PriorityThresholds};
pub use builder::ChatRequestBuilder;
pub use types::{
    TriageError, TriageResult, SecureApiKey, sanitize_error_message,
    SentimentLabel, SentimentResult, UrgencyScore, Severity, OverallSeverity,
    ImageFindings, ImageAnalysisResult, TextAnalysis, GrievanceAnalysis,
    ChatMessage, ChatRequest, ChatRole,
};
pub use services::{SimilarityService, CaptionService, GenerationService};
pub use analyzers::{
    Analyzer, AnalyzerRegistry,
    SentimentClassifier, UrgencyEstimator, ImageCaptioner, ContextualAnalyzer,
    ImageAnalyzer, GrievanceTriage, validate_submission,
};
pub use routing::{Category, DepartmentTable, PriorityTier, TriageDecision, suggest_category};

pub mod prelude {
    //! Convenient imports for commonly used types and functions
    pub use crate::{TriageClient, TriageConfig, TriageError, TriageResult, from_env};
    pub use crate::{GrievanceAnalysis, ImageAnalysisResult, SentimentLabel, Severity, OverallSeverity, UrgencyScore};
    pub use crate::{Category, PriorityTier, TriageDecision, validate_submission};
}

// Entry point functions
pub fn new_client(config: TriageConfig) -> TriageResult<TriageClient> {
    TriageClient::new(config)
}

pub fn from_env() -> TriageResult<TriageClient> {
    TriageClient::new(TriageConfig::from_env()?)
}
