use thiserror::Error;

use crate::providers::ProviderError;

pub type Result<T> = std::result::Result<T, RecipeError>;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("No data available: {0}")]
    EmptyCorpus(String),

    #[error(
        "Incompatible index: expected vectors of dimension {expected}, found {found}. Rebuild the index with the current embedding provider"
    )]
    IncompatibleIndex { expected: usize, found: usize },

    #[error("Please enter at least one ingredient")]
    EmptyQuery,

    #[error("Could not read document {path}: {message}")]
    Corpus { path: String, message: String },

    #[error("Index error: {0}")]
    Index(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<config::ConfigError> for RecipeError {
    #[inline]
    fn from(error: config::ConfigError) -> Self {
        Self::Configuration(error.to_string())
    }
}

pub mod answer;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod index;
pub mod language;
pub mod providers;
