
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::http::HttpClient;
use super::{Generator, ProviderError};
use crate::config::HttpConfig;

const PROVIDER: &str = "groq";

/// Groq's OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct GroqGenerator {
    http: HttpClient,
    base_url: Url,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqGenerator {
    #[inline]
    pub fn new(config: &HttpConfig, base_url: Url, api_key: &str, model: String) -> Self {
        Self {
            http: HttpClient::new(PROVIDER, config),
            base_url,
            api_key: api_key.to_string(),
            model,
            temperature: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Generator for GroqGenerator {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!("Requesting completion from {} ({} chars)", self.model, prompt.len());

        let url = self
            .base_url
            .join("/openai/v1/chat/completions")
            .map_err(|e| ProviderError::malformed(PROVIDER, format!("Failed to build URL: {}", e)))?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };
        let auth = format!("Bearer {}", self.api_key.trim());

        let response: ChatResponse =
            self.http
                .post_json(&url, &[("Authorization", auth.as_str())], &body)?;

        response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "response contained no message"))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
