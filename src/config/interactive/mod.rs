use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, EmbeddingProvider, GenerationProvider, OllamaConfig, TranslationMode};
use crate::language::Language;
use crate::providers::{Credentials, GOOGLE_API_KEY_VAR, GROQ_API_KEY_VAR};
use crate::providers::http::HttpClient;
use crate::providers::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🍳 Yogurt Chef Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Corpus").bold().yellow());
    configure_corpus(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Models").bold().yellow());
    configure_models(&mut config)?;

    if config.embedding.provider == EmbeddingProvider::Ollama
        || config.generation.provider == GenerationProvider::Ollama
    {
        eprintln!();
        eprintln!("{}", style("Ollama").bold().yellow());
        configure_ollama(&mut config.ollama)?;

        eprintln!("{}", style("Testing Ollama connection...").yellow());
        if test_ollama_connection(&config) {
            eprintln!("{}", style("✓ Ollama connection successful!").green());
        } else {
            eprintln!(
                "{}",
                style("⚠ Warning: Could not reach Ollama or the configured model").yellow()
            );
            eprintln!("You can continue, but make sure Ollama is running before indexing.");
        }
    }

    eprintln!();
    eprintln!("{}", style("Translation").bold().yellow());
    configure_translation(&mut config)?;

    eprintln!();
    report_credentials(&config, &Credentials::from_env());

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config: &Config) {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Corpus:").bold().yellow());
    eprintln!("  Path: {}", style(config.corpus.path.display()).cyan());
    eprintln!(
        "  Keyword filter: {}",
        style(config.corpus.keyword.as_deref().unwrap_or("(none)")).cyan()
    );
    eprintln!(
        "  Chunks: {} chars, {} overlap",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.chunk_overlap).cyan()
    );
    eprintln!("  Index: {}", style(config.index_path().display()).cyan());

    eprintln!();
    eprintln!("{}", style("Models:").bold().yellow());
    eprintln!(
        "  Embeddings: {:?} / {} ({} dimensions, {:?})",
        config.embedding.provider,
        style(&config.embedding.model).cyan(),
        config.embedding.dimension,
        config.embedding.metric
    );
    eprintln!(
        "  Generation: {:?} / {}",
        config.generation.provider,
        style(&config.generation.model).cyan()
    );
    eprintln!("  Top k: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!("{}", style("Translation:").bold().yellow());
    eprintln!("  Mode: {:?}", config.translation.mode);
    eprintln!("  Pivot: {}", style(config.translation.pivot.label()).cyan());
    eprintln!(
        "  Default display language: {}",
        style(config.translation.default_language.label()).cyan()
    );

    if config.embedding.provider == EmbeddingProvider::Ollama
        || config.generation.provider == GenerationProvider::Ollama
    {
        eprintln!();
        match config.ollama_url() {
            Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
            Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
        }
    }

    eprintln!();
    report_credentials(config, &Credentials::from_env());

    eprintln!();
    eprintln!("Config file: {}", style(config.config_file_path().display()).dim());
}

fn load_existing_config(config_dir: &Path) -> Config {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No usable configuration found. Using defaults.").yellow()
            );
            Config::with_base_dir(config_dir)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn configure_corpus(config: &mut Config) -> Result<()> {
    let path: String = Input::new()
        .with_prompt("Recipe PDF, text file or folder")
        .default(config.corpus.path.display().to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Path cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let keyword: String = Input::new()
        .with_prompt("Only index pages containing (leave empty to keep all)")
        .default(config.corpus.keyword.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    config.corpus.path = PathBuf::from(path.trim());
    config.corpus.keyword = Some(keyword.trim().to_string()).filter(|k| !k.is_empty());
    Ok(())
}

fn configure_models(config: &mut Config) -> Result<()> {
    let embedding_providers = [EmbeddingProvider::Gemini, EmbeddingProvider::Ollama];
    let embedding_index = Select::new()
        .with_prompt("Embedding provider")
        .default(
            embedding_providers
                .iter()
                .position(|p| *p == config.embedding.provider)
                .unwrap_or(0),
        )
        .items(&["Gemini (remote)", "Ollama (local)"])
        .interact()?;
    let embedding_provider = embedding_providers[embedding_index];

    if embedding_provider != config.embedding.provider {
        config.embedding.model = match embedding_provider {
            EmbeddingProvider::Gemini => "models/embedding-001".to_string(),
            EmbeddingProvider::Ollama => "nomic-embed-text".to_string(),
        };
    }

    let embedding_model = prompt_model("Embedding model", &config.embedding.model)?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(config.embedding.dimension)
        .validate_with(|input: &u32| -> Result<(), ConfigError> {
            if (8..=4096).contains(input) {
                Ok(())
            } else {
                Err(ConfigError::InvalidEmbeddingDimension(*input))
            }
        })
        .interact_text()?;

    let generation_providers = [
        GenerationProvider::Gemini,
        GenerationProvider::Groq,
        GenerationProvider::Ollama,
    ];
    let generation_index = Select::new()
        .with_prompt("Generation provider")
        .default(
            generation_providers
                .iter()
                .position(|p| *p == config.generation.provider)
                .unwrap_or(0),
        )
        .items(&["Gemini (remote)", "Groq (remote)", "Ollama (local)"])
        .interact()?;
    let generation_provider = generation_providers[generation_index];

    if generation_provider != config.generation.provider {
        config.generation.model = match generation_provider {
            GenerationProvider::Gemini => "gemini-1.5-flash".to_string(),
            GenerationProvider::Groq => "llama-3.1-8b-instant".to_string(),
            GenerationProvider::Ollama => "llama3.2".to_string(),
        };
    }

    let generation_model = prompt_model("Generation model", &config.generation.model)?;

    config.embedding.provider = embedding_provider;
    config.embedding.model = embedding_model;
    config.embedding.dimension = dimension;
    config.generation.provider = generation_provider;
    config.generation.model = generation_model;
    Ok(())
}

fn prompt_model(prompt: &str, current: &str) -> Result<String> {
    let model: String = Input::new()
        .with_prompt(prompt)
        .default(current.to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(model.trim().to_string())
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;

    Ok(())
}

fn configure_translation(config: &mut Config) -> Result<()> {
    let modes = [
        TranslationMode::Pivot,
        TranslationMode::Prompt,
        TranslationMode::Off,
    ];
    let mode_index = Select::new()
        .with_prompt("How should answers reach other languages?")
        .default(
            modes
                .iter()
                .position(|m| *m == config.translation.mode)
                .unwrap_or(0),
        )
        .items(&[
            "Translate query and answer around a Turkish prompt",
            "Ask the model to answer in the chosen language",
            "No translation",
        ])
        .interact()?;

    let labels: Vec<String> = Language::ALL.iter().map(|l| l.label()).collect();
    let language_index = Select::new()
        .with_prompt("Default display language")
        .default(
            Language::ALL
                .iter()
                .position(|l| *l == config.translation.default_language)
                .unwrap_or(0),
        )
        .items(&labels)
        .interact()?;

    config.translation.mode = modes[mode_index];
    config.translation.default_language = Language::ALL[language_index];
    Ok(())
}

fn report_credentials(config: &Config, credentials: &Credentials) {
    let needs_google = config.embedding.provider == EmbeddingProvider::Gemini
        || config.generation.provider == GenerationProvider::Gemini;
    let needs_groq = config.generation.provider == GenerationProvider::Groq;

    for (needed, name, present) in [
        (needs_google, GOOGLE_API_KEY_VAR, credentials.google_api_key.is_some()),
        (needs_groq, GROQ_API_KEY_VAR, credentials.groq_api_key.is_some()),
    ] {
        if !needed {
            continue;
        }
        if present {
            eprintln!("  {} {}", style("✓").green(), name);
        } else {
            eprintln!(
                "  {} {} is not set; startup will fail until it is exported",
                style("✗").red(),
                name
            );
        }
    }
}

fn test_ollama_connection(config: &Config) -> bool {
    let Ok(client) = OllamaClient::new(&config.ollama, &config.http) else {
        return false;
    };
    let client = client.with_http(
        HttpClient::new("ollama", &config.http)
            .with_timeout(Duration::from_secs(5))
            .with_retry_attempts(1),
    );

    let mut models = Vec::new();
    if config.embedding.provider == EmbeddingProvider::Ollama {
        models.push(config.embedding.model.as_str());
    }
    if config.generation.provider == GenerationProvider::Ollama {
        models.push(config.generation.model.as_str());
    }

    models.iter().all(|model| client.health_check(model).is_ok())
}
