// Groq chat completions (OpenAI-compatible)

use crate::services::{check_status, GenerationService};
use crate::types::*;
use crate::parse_error;
use async_trait::async_trait;
use reqwest::{header, Client as HttpClient};
use serde::Deserialize;
use std::time::Duration;

const GENERATION_SERVICE: &str = "generation";

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct GroqChat {
    http_client: HttpClient,
    api_key: SecureApiKey,
    url: String,
    timeout: Duration,
}

impl GroqChat {
    pub fn new(
        http_client: HttpClient,
        api_key: SecureApiKey,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            api_key,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl GenerationService for GroqChat {
    async fn generate(&self, request: ChatRequest) -> TriageResult<String> {
        let response = self
            .http_client
            .post(&self.url)
            .header(header::AUTHORIZATION, self.api_key.bearer())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;
        let response = check_status(GENERATION_SERVICE, response).await?;

        let completion = response
            .json::<ChatCompletion>()
            .await
            .map_err(|e| parse_error!(format!("chat completion: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| parse_error!("chat completion contained no content"))
    }
}
