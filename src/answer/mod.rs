// Answer module
// Retrieval, prompting, generation and translation for a single query

pub mod prompt;


use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_TOP_K, TranslationMode};
use crate::corpus::Source;
use crate::index::{SearchHit, VectorIndex};
use crate::language::Language;
use crate::providers::{Embedder, Generator, Translator};
use crate::{RecipeError, Result};

pub use prompt::PromptTemplate;

/// Language of the fixed interface phrases
pub const UI_LANGUAGE: Language = Language::Turkish;

/// Fixed phrases shown around the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    Title,
    Subtitle,
    InputPlaceholder,
    Preparing,
}

impl Phrase {
    #[inline]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Title => "👨‍🍳 Yoğurtlu Mutfak Rehberi",
            Self::Subtitle => "Malzeme girişinize göre yoğurtlu tarifler önerilir",
            Self::InputPlaceholder => "Malzemelerinizi yazın...",
            Self::Preparing => "Tarif hazırlanıyor...",
        }
    }
}

/// A generated answer with the chunks it was grounded on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub text: String,
    /// Language `text` is written in
    pub language: Language,
    /// Distinct sources of the retrieved context, most relevant first
    pub sources: Vec<Source>,
}

/// Recipe question answering over a built index.
///
/// Every handle is shared and read-only, so one assistant can serve any
/// number of queries.
pub struct RecipeAssistant {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    translator: Option<Arc<dyn Translator>>,
    template: PromptTemplate,
    top_k: usize,
    pivot: Language,
    mode: TranslationMode,
}

impl RecipeAssistant {
    #[inline]
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            index,
            embedder,
            generator,
            translator: None,
            template: PromptTemplate::default(),
            top_k: DEFAULT_TOP_K,
            pivot: Language::default(),
            mode: TranslationMode::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_translator(mut self, translator: Option<Arc<dyn Translator>>) -> Self {
        self.translator = translator;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_pivot(mut self, pivot: Language) -> Self {
        self.pivot = pivot;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: TranslationMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[inline]
    pub fn pivot(&self) -> Language {
        self.pivot
    }

    /// Machine translation runs only in pivot mode with a translator
    fn pivot_translator(&self) -> Option<&dyn Translator> {
        match self.mode {
            TranslationMode::Pivot => self.translator.as_deref(),
            TranslationMode::Prompt | TranslationMode::Off => None,
        }
    }

    /// Embed `query` and return the closest chunks
    #[inline]
    pub fn retrieve(&self, query: &str) -> Result<Vec<SearchHit>> {
        let vector = self.embedder.embed(query)?;
        let hits = self.index.search(&vector, self.top_k)?;
        debug!(
            "Retrieved {} chunks: {}",
            hits.len(),
            hits.iter()
                .map(|hit| format!("{} ({:.3})", hit.chunk.source, hit.score))
                .join(", ")
        );
        Ok(hits)
    }

    /// Answer an ingredient list in the `display` language.
    ///
    /// In pivot mode the query is translated into the pivot language (source
    /// detected by the service) and the answer back into `display` when the
    /// two differ. In prompt mode the model is asked to answer in `display`.
    #[inline]
    pub fn recommend(&self, query: &str, display: Language) -> Result<Recommendation> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecipeError::EmptyQuery);
        }

        let question = match self.pivot_translator() {
            Some(translator) => translator.translate(query, None, self.pivot)?,
            None => query.to_string(),
        };

        let hits = self.retrieve(&question)?;
        let context = hits.iter().map(|hit| hit.chunk.text.as_str()).join("\n");

        let instruction = match self.mode {
            TranslationMode::Prompt => Some(display),
            TranslationMode::Pivot | TranslationMode::Off => None,
        };
        let prompt = self.template.render(&context, &question, instruction);

        info!(
            "Generating with {} ({} context chunks, {} prompt chars)",
            self.generator.model(),
            hits.len(),
            prompt.chars().count()
        );
        let answer = self.generator.generate(&prompt)?;

        let (text, language) = match (self.mode, self.pivot_translator()) {
            (TranslationMode::Prompt, _) => (answer, display),
            (_, Some(translator)) if display != self.pivot => (
                translator.translate(&answer, Some(self.pivot), display)?,
                display,
            ),
            _ => (answer, self.pivot),
        };

        Ok(Recommendation {
            text,
            language,
            sources: hits.into_iter().map(|hit| hit.chunk.source).unique().collect(),
        })
    }

    /// Like [`recommend`](Self::recommend), but any failure becomes the
    /// displayed answer so the session can continue.
    #[inline]
    pub fn respond(&self, query: &str, display: Language) -> String {
        match self.recommend(query, display) {
            Ok(recommendation) => recommendation.text,
            Err(e) => {
                error!("Failed to answer '{}': {}", query, e);
                format!("❌ {}", e)
            }
        }
    }

    /// Translate an interface phrase, falling back to the Turkish original
    #[inline]
    pub fn localize(&self, phrase: Phrase, display: Language) -> String {
        let text = phrase.text();
        let Some(translator) = self.translator.as_deref() else {
            return text.to_string();
        };
        if display == UI_LANGUAGE {
            return text.to_string();
        }

        match translator.translate(text, Some(UI_LANGUAGE), display) {
            Ok(translated) if !translated.trim().is_empty() => translated,
            Ok(_) => text.to_string(),
            Err(e) => {
                warn!("Keeping untranslated phrase {:?}: {}", phrase, e);
                text.to_string()
            }
        }
    }
}
