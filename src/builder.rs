// Chat Request Builder

use crate::services::GenerationService;
use crate::types::*;
use crate::utils::{validate_range, StringValidator};

/// Fluent builder for requests to the text-generation service.
pub struct ChatRequestBuilder {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ChatRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a system instruction
    pub fn system(mut self, system: impl Into<String>) -> TriageResult<Self> {
        let content = StringValidator::not_empty(system, "system")?;
        self.messages.push(ChatMessage {
            role: ChatRole::System,
            content,
        });
        Ok(self)
    }

    /// Add a user message
    pub fn user_message(mut self, text: impl Into<String>) -> TriageResult<Self> {
        let content = StringValidator::not_empty(text, "user message")?;
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content,
        });
        Ok(self)
    }

    /// Set the sampling temperature (between 0.0 and 1.0)
    ///
    /// Lower values are more deterministic.
    pub fn temperature(mut self, temperature: f32) -> TriageResult<Self> {
        self.temperature = Some(validate_range(temperature, 0.0, 1.0, "temperature")?);
        Ok(self)
    }

    /// Set the maximum number of tokens to generate
    pub fn max_tokens(mut self, max_tokens: u32) -> TriageResult<Self> {
        if max_tokens == 0 {
            return Err(TriageError::ValidationError("max_tokens must be greater than 0".into()));
        }
        self.max_tokens = Some(max_tokens);
        Ok(self)
    }

    pub fn build(self) -> TriageResult<ChatRequest> {
        if !self.messages.iter().any(|m| m.role == ChatRole::User) {
            return Err(TriageError::ValidationError(
                "At least one user message is required".to_string(),
            ));
        }
        let model = StringValidator::not_empty(self.model, "model")?;

        Ok(ChatRequest {
            model,
            messages: self.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }

    /// Build the request and send it to a generation service
    pub async fn send(self, service: &dyn GenerationService) -> TriageResult<String> {
        let request = self.build()?;
        service.generate(request).await
    }
}
