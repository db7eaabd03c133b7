// Configuration management module
// TOML settings, provider selection and the interactive setup

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, CorpusConfig, EmbeddingConfig, EmbeddingProvider, EndpointConfig,
    GenerationConfig, GenerationProvider, HttpConfig, OllamaConfig, PromptConfig, RetrievalConfig,
    TranslationConfig, TranslationMode, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_TOP_K,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
