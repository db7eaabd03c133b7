use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::{info, warn};

use crate::answer::{Phrase, PromptTemplate, RecipeAssistant};
use crate::config::{Config, EmbeddingProvider, GenerationProvider};
use crate::index::{self, BuildReport, SharedIndex, VectorIndex};
use crate::language::Language;
use crate::providers::{
    self, Credentials, Embedder, GOOGLE_API_KEY_VAR, GROQ_API_KEY_VAR, Generator, Translator,
};

/// Provider handles and the lazily built index, created once per process
pub struct Pipeline {
    config: Config,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    translator: Option<Arc<dyn Translator>>,
    index: SharedIndex,
}

impl Pipeline {
    /// Build every provider handle, refusing to start without the credentials they need
    #[inline]
    pub fn from_config(config: Config, credentials: &Credentials) -> crate::Result<Self> {
        providers::check_credentials(&config, credentials)?;

        Ok(Self {
            embedder: providers::build_embedder(&config, credentials)?,
            generator: providers::build_generator(&config, credentials)?,
            translator: providers::build_translator(&config),
            index: SharedIndex::new(),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load or build the index on first use
    #[inline]
    pub fn index(&self) -> crate::Result<Arc<VectorIndex>> {
        self.index.get_or_try_init(|| {
            let (index, report) =
                VectorIndex::open_or_build(&self.config, self.embedder.as_ref(), false)?;
            if let Some(report) = report {
                print_build_report(&report, &self.config);
            }
            Ok(index)
        })
    }

    /// Assemble an assistant over the shared index
    #[inline]
    pub fn assistant(&self) -> crate::Result<RecipeAssistant> {
        let template = match &self.config.prompt.template {
            Some(template) => PromptTemplate::parse(template)?,
            None => PromptTemplate::default(),
        };

        Ok(RecipeAssistant::new(
            self.index()?,
            Arc::clone(&self.embedder),
            Arc::clone(&self.generator),
        )
        .with_translator(self.translator.clone())
        .with_template(template)
        .with_top_k(self.config.retrieval.top_k)
        .with_pivot(self.config.translation.pivot)
        .with_mode(self.config.translation.mode))
    }
}

fn print_build_report(report: &BuildReport, config: &Config) {
    println!(
        "{} Indexed {} chunks ({} skipped)",
        style("✓").green(),
        report.embedded,
        report.skipped
    );
    println!("  Saved to: {}", config.index_path().display());
}

fn spinner(message: String) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner().with_message(message);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Build (or rebuild) the persisted index
#[inline]
pub fn index_corpus(config_dir: &Path, rebuild: bool) -> Result<()> {
    let config = Config::load(config_dir)?;
    let embedder = providers::build_embedder(&config, &Credentials::from_env())?;

    info!(
        "Indexing {} with {} (rebuild: {})",
        config.corpus.path.display(),
        embedder.model(),
        rebuild
    );

    let (index, report) = VectorIndex::open_or_build(&config, embedder.as_ref(), rebuild)
        .context("Failed to prepare the recipe index")?;

    match report {
        Some(report) => print_build_report(&report, &config),
        None => {
            println!(
                "Index already built: {} chunks from {} ({} dimensions)",
                index.len(),
                index.embedding_model(),
                index.dimension()
            );
            println!("Use --rebuild to index the corpus again.");
        }
    }

    Ok(())
}

/// Answer one ingredient list and exit
#[inline]
pub fn ask(
    config_dir: &Path,
    ingredients: &[String],
    language: Option<Language>,
    show_sources: bool,
) -> Result<()> {
    let config = Config::load(config_dir)?;
    let display = language.unwrap_or(config.translation.default_language);
    let pipeline = Pipeline::from_config(config, &Credentials::from_env())?;
    let assistant = pipeline.assistant()?;

    let query = ingredients.join(" ");
    let bar = spinner(assistant.localize(Phrase::Preparing, display));
    let result = assistant.recommend(&query, display);
    bar.finish_and_clear();

    match result {
        Ok(recommendation) => {
            println!("{}", recommendation.text);
            if show_sources && !recommendation.sources.is_empty() {
                println!();
                println!("{}", style("Sources:").bold());
                for source in &recommendation.sources {
                    println!("  - {}", source);
                }
            }
        }
        Err(e) => {
            warn!("Query failed: {}", e);
            println!("❌ {}", e);
        }
    }

    Ok(())
}

/// Interactive recipe chat in the terminal
#[inline]
pub fn chat(config_dir: &Path, language: Option<Language>) -> Result<()> {
    let config = Config::load(config_dir)?;
    let display = match language {
        Some(language) => language,
        None => select_language(config.translation.default_language)?,
    };

    let pipeline = Pipeline::from_config(config, &Credentials::from_env())?;
    let assistant = pipeline.assistant()?;

    println!();
    println!(
        "{}",
        style(assistant.localize(Phrase::Title, display)).bold().cyan()
    );
    println!("{}", assistant.localize(Phrase::Subtitle, display));
    println!("{}", style("Empty line or 'exit' to quit.").dim());
    println!();

    let placeholder = assistant.localize(Phrase::InputPlaceholder, display);
    let preparing = assistant.localize(Phrase::Preparing, display);
    let mut history: Vec<(String, String)> = Vec::new();

    loop {
        let query: String = Input::new()
            .with_prompt(&placeholder)
            .allow_empty(true)
            .interact_text()?;
        let query = query.trim();
        if query.is_empty() || query.eq_ignore_ascii_case("exit") {
            break;
        }

        let bar = spinner(preparing.clone());
        let answer = assistant.respond(query, display);
        bar.finish_and_clear();

        println!();
        println!("{}", answer);
        println!();
        history.push((query.to_string(), answer));
    }

    info!("Chat ended after {} questions", history.len());
    Ok(())
}

fn select_language(default: Language) -> Result<Language> {
    let labels: Vec<String> = Language::ALL.iter().map(|l| l.label()).collect();
    let selected = Select::new()
        .with_prompt("🌐 Dil / Language")
        .items(&labels)
        .default(
            Language::ALL
                .iter()
                .position(|l| *l == default)
                .unwrap_or_default(),
        )
        .interact()?;

    Ok(Language::ALL.get(selected).copied().unwrap_or(default))
}

/// Show configuration summary, credential state and the persisted index
#[inline]
pub fn show_status(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).unwrap_or_else(|e| {
        warn!("Falling back to default configuration: {:#}", e);
        Config::with_base_dir(config_dir)
    });

    println!("📊 Yogurt Chef Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("📚 Corpus:");
    if config.corpus.path.exists() {
        println!("   ✅ {}", config.corpus.path.display());
    } else {
        println!("   ❌ {} (not found)", config.corpus.path.display());
    }
    if let Some(keyword) = &config.corpus.keyword {
        println!("   Keyword filter: {}", keyword);
    }

    println!();
    println!("🔑 Credentials:");
    let credentials = Credentials::from_env();
    let uses_google = config.embedding.provider == EmbeddingProvider::Gemini
        || config.generation.provider == GenerationProvider::Gemini;
    let uses_groq = config.generation.provider == GenerationProvider::Groq;
    for (name, needed, present) in [
        (GOOGLE_API_KEY_VAR, uses_google, credentials.google().is_ok()),
        (GROQ_API_KEY_VAR, uses_groq, credentials.groq().is_ok()),
    ] {
        let state = match (needed, present) {
            (_, true) => "✅ set",
            (true, false) => "❌ missing (required)",
            (false, false) => "➖ not set (unused)",
        };
        println!("   {}: {}", name, state);
    }

    println!();
    println!("🔍 Index:");
    let index_dir = config.index_path();
    match index::read_manifest(&index_dir) {
        Ok(manifest) => {
            println!("   ✅ {}", index_dir.display());
            println!("   Chunks: {}", manifest.chunk_count);
            println!(
                "   Embeddings: {} ({} dimensions, {})",
                manifest.embedding_model, manifest.dimension, manifest.metric
            );
            println!("   Built: {}", manifest.created_at);
            if manifest.dimension != config.embedding.dimension as usize {
                println!(
                    "   ⚠️  Configured dimension is {}; run 'yogurt-chef index --rebuild'",
                    config.embedding.dimension
                );
            }
        }
        Err(e) => println!("   ❌ {}", e),
    }

    println!();
    println!("🤖 Models:");
    println!(
        "   Embeddings: {:?} / {}",
        config.embedding.provider, config.embedding.model
    );
    println!(
        "   Generation: {:?} / {}",
        config.generation.provider, config.generation.model
    );
    println!(
        "   Translation: {:?} (pivot {})",
        config.translation.mode,
        config.translation.pivot.label()
    );

    Ok(())
}

/// Print the supported display languages
#[inline]
pub fn list_languages(config_dir: &Path) {
    let default = Config::load(config_dir)
        .map(|config| config.translation.default_language)
        .unwrap_or_default();

    println!(
        "Display languages: {}",
        Language::ALL.iter().map(|l| l.code()).join(", ")
    );
    println!();
    for language in Language::ALL {
        let marker = if language == default { " (default)" } else { "" };
        println!(
            "  {}  {:<10} {}{}",
            language.code(),
            language.native_name(),
            language.english_name(),
            marker
        );
    }
}
