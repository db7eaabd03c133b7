// Vector index module
// Flat exact nearest-neighbour search over embedded chunks, persisted as JSON

mod shared;

#[cfg(test)]
mod tests;

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::corpus::{self, Chunk};
use crate::providers::{Embedder, ProviderError};
use crate::{RecipeError, Result};

pub use shared::SharedIndex;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ENTRIES_FILE: &str = "entries.json";
pub const FORMAT_VERSION: u32 = 1;

/// Similarity measure used to rank stored vectors against a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    L2,
}

impl Metric {
    /// Higher is more similar for both metrics
    #[inline]
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::L2 => -euclidean_distance(a, b),
        }
    }
}

impl fmt::Display for Metric {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::L2 => write!(f, "l2"),
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0_f32, 0.0_f32, 0.0_f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// One stored chunk with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// On-disk description of a persisted index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub dimension: usize,
    pub metric: Metric,
    pub embedding_model: String,
    pub chunk_count: usize,
    /// RFC 3339 timestamp of the build
    pub created_at: String,
}

/// Outcome of embedding a corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub embedded: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// In-memory vector index. Every stored vector has exactly `dimension`
/// components and entries keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    metric: Metric,
    embedding_model: String,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    #[inline]
    pub fn new(dimension: usize, metric: Metric, embedding_model: impl Into<String>) -> Self {
        Self {
            dimension,
            metric,
            embedding_model: embedding_model.into(),
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry, rejecting vectors of the wrong length
    #[inline]
    pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        self.check_dimension(vector.len())?;
        self.entries.push(IndexEntry { chunk, vector });
        Ok(())
    }

    fn check_dimension(&self, found: usize) -> Result<()> {
        if found != self.dimension {
            return Err(RecipeError::IncompatibleIndex {
                expected: self.dimension,
                found,
            });
        }
        Ok(())
    }

    /// Embed every chunk and collect the successes.
    ///
    /// A chunk that fails to embed is logged and counted as skipped; the build
    /// only fails when nothing at all could be embedded.
    #[inline]
    pub fn build<I>(chunks: I, embedder: &dyn Embedder, metric: Metric) -> Result<(Self, BuildReport)>
    where
        I: IntoIterator<Item = Chunk>,
    {
        let chunks = chunks.into_iter();
        let bar = progress_bar(chunks.size_hint().0 as u64);
        let mut index = Self::new(embedder.dimension(), metric, embedder.model());
        let mut report = BuildReport::default();
        let mut last_error: Option<ProviderError> = None;

        for chunk in chunks {
            bar.set_message(chunk.source.to_string());
            match embedder.embed(&chunk.text) {
                Ok(vector) => {
                    let preview = chunk.preview(60);
                    match index.insert(chunk, vector) {
                        Ok(()) => report.embedded += 1,
                        Err(e) => {
                            warn!("Skipping chunk '{}': {}", preview, e);
                            report.skipped += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Failed to embed chunk '{}' from {}: {}",
                        chunk.preview(60),
                        chunk.source,
                        e
                    );
                    report.skipped += 1;
                    last_error = Some(e);
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        if index.is_empty() {
            let reason = match last_error {
                Some(e) if report.skipped > 0 => format!(
                    "none of the {} chunks could be embedded (last error: {})",
                    report.skipped, e
                ),
                _ if report.skipped > 0 => {
                    format!("none of the {} chunks could be embedded", report.skipped)
                }
                _ => "there are no chunks to index".to_string(),
            };
            return Err(RecipeError::EmptyCorpus(reason));
        }

        info!(
            "Embedded {} chunks with {} ({} skipped)",
            report.embedded, index.embedding_model, report.skipped
        );
        Ok((index, report))
    }

    /// Rank stored chunks against `query`, most similar first.
    ///
    /// Returns at most `k` hits; equal scores keep insertion order.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.check_dimension(query.len())?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let score = self.metric.score(query, &entry.vector);
                (position, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        // Stable sort so ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchHit {
                chunk: self.entries[position].chunk.clone(),
                score,
            })
            .collect())
    }

    #[inline]
    pub fn manifest(&self) -> IndexManifest {
        IndexManifest {
            format_version: FORMAT_VERSION,
            dimension: self.dimension,
            metric: self.metric,
            embedding_model: self.embedding_model.clone(),
            chunk_count: self.entries.len(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Write `entries.json` then `manifest.json` into `dir`, creating it if needed
    #[inline]
    pub fn persist(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let entries = serde_json::to_vec(&self.entries)
            .map_err(|e| RecipeError::Index(format!("Failed to serialize entries: {}", e)))?;
        fs::write(dir.join(ENTRIES_FILE), entries)?;

        let manifest = serde_json::to_string_pretty(&self.manifest())
            .map_err(|e| RecipeError::Index(format!("Failed to serialize manifest: {}", e)))?;
        fs::write(dir.join(MANIFEST_FILE), manifest)?;

        info!("Persisted {} entries to {}", self.entries.len(), dir.display());
        Ok(())
    }

    /// Load a persisted index, refusing one built for another vector length
    #[inline]
    pub fn load(dir: &Path, expected_dimension: usize) -> Result<Self> {
        let manifest = read_manifest(dir)?;
        if manifest.dimension != expected_dimension {
            return Err(RecipeError::IncompatibleIndex {
                expected: expected_dimension,
                found: manifest.dimension,
            });
        }

        let path = dir.join(ENTRIES_FILE);
        let raw = fs::read(&path)
            .map_err(|e| RecipeError::Index(format!("Failed to read {}: {}", path.display(), e)))?;
        let entries: Vec<IndexEntry> = serde_json::from_slice(&raw)
            .map_err(|e| RecipeError::Index(format!("Failed to parse {}: {}", path.display(), e)))?;

        if let Some(entry) = entries
            .iter()
            .find(|entry| entry.vector.len() != expected_dimension)
        {
            return Err(RecipeError::IncompatibleIndex {
                expected: expected_dimension,
                found: entry.vector.len(),
            });
        }

        if entries.len() != manifest.chunk_count {
            return Err(RecipeError::Index(format!(
                "Manifest lists {} chunks but {} were found in {}",
                manifest.chunk_count,
                entries.len(),
                path.display()
            )));
        }

        debug!(
            "Loaded {} entries built with {} on {}",
            entries.len(),
            manifest.embedding_model,
            manifest.created_at
        );

        Ok(Self {
            dimension: manifest.dimension,
            metric: manifest.metric,
            embedding_model: manifest.embedding_model,
            entries,
        })
    }

    /// Load the persisted index for `config`, or build and persist a new one.
    ///
    /// Returns the build report when a build happened.
    #[inline]
    pub fn open_or_build(
        config: &Config,
        embedder: &dyn Embedder,
        rebuild: bool,
    ) -> Result<(Self, Option<BuildReport>)> {
        let dir = config.index_path();

        if !rebuild && dir.join(MANIFEST_FILE).exists() {
            let index = Self::load(&dir, embedder.dimension())?;
            if index.embedding_model != embedder.model() {
                warn!(
                    "Index at {} was built with {} but {} is configured; results may be poor",
                    dir.display(),
                    index.embedding_model,
                    embedder.model()
                );
            }
            if index.metric != config.embedding.metric {
                warn!(
                    "Index uses the {} metric; rebuild to switch to {}",
                    index.metric, config.embedding.metric
                );
            }
            info!("Loaded index with {} chunks from {}", index.len(), dir.display());
            return Ok((index, None));
        }

        let keyword = config.corpus.keyword.as_deref();
        let documents = corpus::load_documents(&config.corpus.path, keyword)?;
        if documents.is_empty() {
            return Err(RecipeError::EmptyCorpus(match keyword {
                Some(keyword) => format!(
                    "no document in {} mentions '{}'",
                    config.corpus.path.display(),
                    keyword
                ),
                None => format!("no readable document in {}", config.corpus.path.display()),
            }));
        }

        let chunks = corpus::split_documents(&documents, &config.chunking);
        let (index, report) = Self::build(chunks, embedder, config.embedding.metric)?;
        index.persist(&dir)?;

        Ok((index, Some(report)))
    }
}

/// Read only the manifest of a persisted index
#[inline]
pub fn read_manifest(dir: &Path) -> Result<IndexManifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Err(RecipeError::Index(format!(
            "No index found at {}; run the index command first",
            dir.display()
        )));
    }

    let raw = fs::read_to_string(&path)?;
    let manifest: IndexManifest = serde_json::from_str(&raw)
        .map_err(|e| RecipeError::Index(format!("Failed to parse {}: {}", path.display(), e)))?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(RecipeError::Index(format!(
            "Unsupported index format version {} (expected {})",
            manifest.format_version, FORMAT_VERSION
        )));
    }

    Ok(manifest)
}

fn progress_bar(length: u64) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(length);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding {msg}") {
        bar.set_style(style);
    }
    bar
}
