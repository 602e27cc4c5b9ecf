// Image Contextual Analyzer
//
// Expands a caption (or the placeholder used when captioning failed) into a
// technical report by asking the generation service for a JSON object.

use crate::analyzers::{base::BaseAnalyzer, Analyzer};
use crate::builder::ChatRequestBuilder;
use crate::services::GenerationService;
use crate::types::*;
use crate::utils::json_extractor::extract_json;
use crate::parse_error;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Caption stand-in used when no captioning model produced anything
pub const PLACEHOLDER_CAPTION: &str =
    "Image related to citizen grievance (visual analysis temporarily unavailable)";

pub const NOT_CONFIGURED_REASON: &str = "Unable to perform detailed analysis";
pub const UNAVAILABLE_REASON: &str =
    "Detailed analysis unavailable; assessment based on image caption only";

/// Generation settings for the contextual analyzer
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

pub struct ContextualAnalyzer {
    base: BaseAnalyzer,
    service: Option<Arc<dyn GenerationService>>,
    settings: GenerationSettings,
}

impl ContextualAnalyzer {
    pub fn new(
        service: Option<Arc<dyn GenerationService>>,
        settings: GenerationSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            base: BaseAnalyzer::new("generation", timeout),
            service,
            settings,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    /// Produce findings for one image; never fails.
    pub async fn analyze(&self, caption: &str, context: Option<&str>) -> ImageFindings {
        let Some(service) = &self.service else {
            tracing::warn!("contextual analysis skipped: generation service not configured");
            return fallback_findings(caption, NOT_CONFIGURED_REASON);
        };

        let prompt = build_prompt(caption, context);
        let reply = self.base.guarded(self.request(service.as_ref(), prompt)).await;

        match reply.and_then(|text| parse_findings(&text, caption)) {
            Ok(findings) => findings,
            Err(e) => {
                tracing::warn!(error = %e, "contextual analysis degraded to caption-only result");
                fallback_findings(caption, UNAVAILABLE_REASON)
            }
        }
    }

    async fn request(&self, service: &dyn GenerationService, prompt: String) -> TriageResult<String> {
        ChatRequestBuilder::new(self.settings.model.clone())
            .user_message(prompt)?
            .max_tokens(self.settings.max_tokens)?
            .temperature(self.settings.temperature)?
            .send(service)
            .await
    }
}

impl Analyzer for ContextualAnalyzer {
    fn name(&self) -> &str {
        self.base.name()
    }
}

/// Build the instruction sent to the generation service
pub fn build_prompt(caption: &str, context: Option<&str>) -> String {
    let context_line = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("Complaint Details: {}\n", context),
        None => String::new(),
    };

    format!(
        r#"You are a Senior Municipal Engineer reviewing evidence attached to a citizen grievance for the official record.

Image Evidence: "{caption}"
{context_line}
Write a TECHNICAL, PROFESSIONAL assessment as a single JSON object with exactly these fields:

{{
    "description": "3-4 sentences in engineering terms: infrastructure type, visible damage, structural or safety implications, estimated impact radius.",
    "key_observations": [
        "Specific technical observation with measurements or estimates",
        "Secondary observation",
        "Environmental or safety factor"
    ],
    "identified_problems": [
        "Primary deficiency: [technical term] - [description]",
        "Secondary issue: [technical term] - [impact]"
    ],
    "affected_areas": [
        "Primary impact zone: [area or infrastructure type]",
        "Secondary affected systems: [related infrastructure]"
    ],
    "recommended_actions": [
        "Immediate: [urgent action]",
        "Short-term: [remediation and method]",
        "Long-term: [preventive measure or policy]"
    ],
    "severity": "low | medium | high | critical",
    "severity_reason": "Justification citing safety codes, structural integrity or public health standards"
}}

Prefer terms such as structural integrity, load-bearing capacity, surface degradation, drainage, utility infrastructure, public right-of-way, remediation protocol and preventive maintenance.

Respond ONLY with valid JSON."#
    )
}

#[derive(Debug, Default, Deserialize)]
struct RawFindings {
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    key_observations: Option<Value>,
    #[serde(default)]
    identified_problems: Option<Value>,
    #[serde(default)]
    affected_areas: Option<Value>,
    #[serde(default)]
    recommended_actions: Option<Value>,
    #[serde(default)]
    severity: Option<Value>,
    #[serde(default)]
    severity_reason: Option<Value>,
}

/// Parse a generation reply into findings.
///
/// The JSON body may be fenced or bare. Only an unparseable body is an
/// error; each missing or mistyped field falls back on its own.
pub fn parse_findings(reply: &str, caption: &str) -> TriageResult<ImageFindings> {
    let json = extract_json(reply)?;
    let value: Value = serde_json::from_str(&json)
        .map_err(|e| parse_error!(format!("findings JSON: {}", e), sanitize_error_message(&json)))?;
    if !value.is_object() {
        return Err(parse_error!("findings JSON is not an object"));
    }
    let raw: RawFindings = serde_json::from_value(value)
        .map_err(|e| parse_error!(format!("findings JSON: {}", e)))?;

    Ok(ImageFindings {
        description: text_field(raw.description).unwrap_or_else(|| caption.to_string()),
        key_observations: list_field(raw.key_observations),
        identified_problems: list_field(raw.identified_problems),
        affected_areas: list_field(raw.affected_areas),
        recommended_actions: list_field(raw.recommended_actions),
        severity: text_field(raw.severity)
            .and_then(|s| Severity::parse(&s))
            .unwrap_or(Severity::Medium),
        severity_reason: text_field(raw.severity_reason).unwrap_or_default(),
    })
}

/// Findings used when the generation service is missing or fails
pub fn fallback_findings(caption: &str, reason: &str) -> ImageFindings {
    ImageFindings {
        description: caption.to_string(),
        severity: Severity::Medium,
        severity_reason: reason.to_string(),
        ..ImageFindings::default()
    }
}

fn text_field(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn list_field(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| text_field(Some(item)))
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
