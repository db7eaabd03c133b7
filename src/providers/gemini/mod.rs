
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::http::HttpClient;
use super::{Embedder, Generator, ProviderError};
use crate::config::HttpConfig;

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Generative Language embeddings (`embedContent`)
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    http: HttpClient,
    base_url: Url,
    api_key: String,
    model: String,
    dimension: usize,
}

/// Google Generative Language text generation (`generateContent`)
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    http: HttpClient,
    base_url: Url,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Accept both "embedding-001" and "models/embedding-001"
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn method_url(base_url: &Url, model: &str, method: &str) -> Result<Url, ProviderError> {
    base_url
        .join(&format!("/v1beta/{}:{}", qualified_model(model), method))
        .map_err(|e| ProviderError::malformed(PROVIDER, format!("Failed to build URL: {}", e)))
}

impl GeminiEmbedder {
    #[inline]
    pub fn new(
        config: &HttpConfig,
        base_url: Url,
        api_key: &str,
        model: String,
        dimension: usize,
    ) -> Self {
        Self {
            http: HttpClient::new(PROVIDER, config),
            base_url,
            api_key: api_key.to_string(),
            model,
            dimension,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_http(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }
}

impl Embedder for GeminiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        debug!("Generating embedding for text (length: {})", text.len());

        let url = method_url(&self.base_url, &self.model, "embedContent")?;
        let model = qualified_model(&self.model);
        let request = EmbedRequest {
            model: &model,
            content: Content {
                role: None,
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
        };

        let response: EmbedResponse =
            self.http
                .post_json(&url, &[(API_KEY_HEADER, self.api_key.as_str())], &request)?;

        let values = response.embedding.values;
        if values.len() != self.dimension {
            return Err(ProviderError::malformed(
                PROVIDER,
                format!(
                    "expected {} dimensions, got {}",
                    self.dimension,
                    values.len()
                ),
            ));
        }

        Ok(values)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }
}

impl GeminiGenerator {
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

    #[inline]
    #[must_use]
    pub fn with_http(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }
}

impl Generator for GeminiGenerator {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!("Requesting completion from {} ({} chars)", self.model, prompt.len());

        let url = method_url(&self.base_url, &self.model, "generateContent")?;
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: self
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let response: GenerateResponse =
            self.http
                .post_json(&url, &[(API_KEY_HEADER, self.api_key.as_str())], &request)?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(ProviderError::malformed(PROVIDER, reason));
        };

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::malformed(
                PROVIDER,
                format!(
                    "empty completion (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
