
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::http::HttpClient;
use super::{Embedder, Generator, ProviderError};
use crate::config::{ConfigError, HttpConfig, OllamaConfig};

const PROVIDER: &str = "ollama";

/// Connection to a local Ollama server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    http: HttpClient,
}

/// Embeddings from a model served by Ollama
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimension: usize,
}

/// Completions from a model served by Ollama
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig, http: &HttpConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: config.ollama_url()?,
            http: HttpClient::new(PROVIDER, http),
        })
    }

    #[inline]
    #[must_use]
    pub fn with_http(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    #[inline]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::malformed(PROVIDER, format!("Failed to build URL: {}", e)))
    }

    /// Test connection to the Ollama server and verify model availability
    #[inline]
    pub fn health_check(&self, model: &str) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        self.ping().context("Server ping failed")?;
        self.validate_model(model)
            .context("Model validation failed")?;

        info!(
            "Health check passed for Ollama server at {} with model {}",
            self.base_url, model
        );
        Ok(())
    }

    /// Ping the Ollama server to check if it's responsive
    #[inline]
    pub fn ping(&self) -> Result<()> {
        self.list_models()
            .map(|_| ())
            .context("Failed to ping Ollama server")
    }

    /// Validate that a model has been pulled on the server
    #[inline]
    pub fn validate_model(&self, model: &str) -> Result<()> {
        debug!("Validating model: {}", model);

        let models = self.list_models().context("Failed to list models")?;

        // Ollama reports untagged models with an explicit ":latest"
        let wanted = if model.contains(':') {
            model.to_string()
        } else {
            format!("{}:latest", model)
        };

        if models.iter().any(|m| m.name == wanted) {
            debug!("Model {} is available", model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                model, available_models
            );
            Err(anyhow::anyhow!(
                "Model '{}' is not available. Available models: {:?}",
                model,
                available_models
            ))
        }
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let url = self.endpoint("/api/tags")?;
        debug!("Fetching available models from {}", url);

        let models_response: ModelsResponse = self.http.get_json(&url, &[])?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = self.endpoint("/api/embed")?;
        let request = EmbedRequest { model, input: text };

        let response: EmbedResponse = self.http.post_json(&url, &[], &request)?;
        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "response contained no embeddings"))
    }

    fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: Option<f32>,
    ) -> Result<String, ProviderError> {
        let url = self.endpoint("/api/generate")?;
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: temperature.map(|temperature| GenerateOptions { temperature }),
        };

        let response: GenerateResponse = self.http.post_json(&url, &[], &request)?;
        Ok(response.response)
    }
}

impl OllamaEmbedder {
    #[inline]
    pub const fn new(client: OllamaClient, model: String, dimension: usize) -> Self {
        Self {
            client,
            model,
            dimension,
        }
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        debug!("Generating embedding for text (length: {})", text.len());

        let embedding = self.client.embed(&self.model, text)?;
        if embedding.len() != self.dimension {
            return Err(ProviderError::malformed(
                PROVIDER,
                format!(
                    "expected {} dimensions, got {}",
                    self.dimension,
                    embedding.len()
                ),
            ));
        }

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }
}

impl OllamaGenerator {
    #[inline]
    pub const fn new(client: OllamaClient, model: String) -> Self {
        Self {
            client,
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

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!("Requesting completion from {} ({} chars)", self.model, prompt.len());
        self.client.generate(&self.model, prompt, self.temperature)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
