// External model providers
// Embedding, generation and translation backends behind small capability traits

pub mod gemini;
pub mod groq;
pub mod http;
pub mod ollama;
pub mod translate;


use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::RecipeError;
use crate::config::{Config, EmbeddingProvider, GenerationProvider, TranslationMode};
use crate::language::Language;

pub use gemini::{GeminiEmbedder, GeminiGenerator};
pub use groq::GroqGenerator;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaGenerator};
pub use translate::GoogleTranslator;

pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";

/// Failure of a call to an external embedding, generation or translation service
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider} quota exceeded: {message}")]
    QuotaExceeded { provider: String, message: String },

    #[error("{provider} rejected the credentials: {message}")]
    Unauthorized { provider: String, message: String },

    #[error("{provider} rejected the request (HTTP {status}): {message}")]
    Rejected {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} is unreachable: {message}")]
    Network { provider: String, message: String },

    #[error("{provider} returned a malformed response: {message}")]
    Malformed { provider: String, message: String },
}

impl ProviderError {
    #[inline]
    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    #[inline]
    pub fn provider(&self) -> &str {
        match self {
            Self::QuotaExceeded { provider, .. }
            | Self::Unauthorized { provider, .. }
            | Self::Rejected { provider, .. }
            | Self::Network { provider, .. }
            | Self::Malformed { provider, .. } => provider,
        }
    }
}

/// Maps text to a fixed-length vector
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    fn model(&self) -> &str;
}

/// Produces a text completion for a prompt
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    fn model(&self) -> &str;
}

/// Translates text between natural languages.
///
/// `source: None` asks the service to detect the source language.
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<String, ProviderError>;
}

/// API credentials read from the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub google_api_key: Option<String>,
    pub groq_api_key: Option<String>,
}

impl Credentials {
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable lookup; blank values count as missing
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            google_api_key: read(GOOGLE_API_KEY_VAR),
            groq_api_key: read(GROQ_API_KEY_VAR),
        }
    }

    fn require<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str, RecipeError> {
        value.map(String::as_str).ok_or_else(|| {
            RecipeError::Configuration(format!(
                "{} is not set; export it or add it to your environment before starting",
                name
            ))
        })
    }

    #[inline]
    pub fn google(&self) -> Result<&str, RecipeError> {
        Self::require(self.google_api_key.as_ref(), GOOGLE_API_KEY_VAR)
    }

    #[inline]
    pub fn groq(&self) -> Result<&str, RecipeError> {
        Self::require(self.groq_api_key.as_ref(), GROQ_API_KEY_VAR)
    }
}

/// Check every credential the configured providers need, before any network call is made
#[inline]
pub fn check_credentials(config: &Config, credentials: &Credentials) -> Result<(), RecipeError> {
    if config.embedding.provider == EmbeddingProvider::Gemini
        || config.generation.provider == GenerationProvider::Gemini
    {
        credentials.google()?;
    }
    if config.generation.provider == GenerationProvider::Groq {
        credentials.groq()?;
    }
    Ok(())
}

/// Construct the embedder selected in the configuration
#[inline]
pub fn build_embedder(
    config: &Config,
    credentials: &Credentials,
) -> Result<Arc<dyn Embedder>, RecipeError> {
    let dimension = config.embedding.dimension as usize;
    let model = config.embedding.model.clone();
    debug!(
        "Using {:?} embeddings with model {} ({} dimensions)",
        config.embedding.provider, model, dimension
    );

    let embedder: Arc<dyn Embedder> = match config.embedding.provider {
        EmbeddingProvider::Gemini => Arc::new(GeminiEmbedder::new(
            &config.http,
            config.endpoints.gemini.clone(),
            credentials.google()?,
            model,
            dimension,
        )),
        EmbeddingProvider::Ollama => {
            let client = OllamaClient::new(&config.ollama, &config.http)?;
            Arc::new(OllamaEmbedder::new(client, model, dimension))
        }
    };
    Ok(embedder)
}

/// Construct the generator selected in the configuration
#[inline]
pub fn build_generator(
    config: &Config,
    credentials: &Credentials,
) -> Result<Arc<dyn Generator>, RecipeError> {
    let model = config.generation.model.clone();
    let temperature = config.generation.temperature;
    debug!(
        "Using {:?} generation with model {}",
        config.generation.provider, model
    );

    let generator: Arc<dyn Generator> = match config.generation.provider {
        GenerationProvider::Gemini => Arc::new(
            GeminiGenerator::new(
                &config.http,
                config.endpoints.gemini.clone(),
                credentials.google()?,
                model,
            )
            .with_temperature(temperature),
        ),
        GenerationProvider::Groq => Arc::new(
            GroqGenerator::new(
                &config.http,
                config.endpoints.groq.clone(),
                credentials.groq()?,
                model,
            )
            .with_temperature(temperature),
        ),
        GenerationProvider::Ollama => {
            let client = OllamaClient::new(&config.ollama, &config.http)?;
            Arc::new(OllamaGenerator::new(client, model).with_temperature(temperature))
        }
    };
    Ok(generator)
}

/// Construct the translator, or `None` when the pipeline never translates
#[inline]
pub fn build_translator(config: &Config) -> Option<Arc<dyn Translator>> {
    match config.translation.mode {
        TranslationMode::Off => None,
        TranslationMode::Pivot | TranslationMode::Prompt => Some(Arc::new(GoogleTranslator::new(
            &config.http,
            config.endpoints.translate.clone(),
        ))),
    }
}
