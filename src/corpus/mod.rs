// Corpus module
// Loads recipe documents from disk and splits them into overlapping chunks

pub mod chunking;
mod pdf;


use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{RecipeError, Result};

pub use chunking::{Chunk, ChunkingConfig, Chunks, reassemble, split, split_documents};

/// Where a piece of text came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub path: PathBuf,
    /// 1-based page number for paged formats
    pub page: Option<u32>,
}

impl Source {
    #[inline]
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            page: None,
        }
    }

    #[inline]
    pub fn page<P: AsRef<Path>>(path: P, page: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            page: Some(page),
        }
    }
}

impl fmt::Display for Source {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} (page {})", self.path.display(), page),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// Raw text of one page or one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub source: Source,
}

impl Document {
    #[inline]
    pub fn new(text: impl Into<String>, source: Source) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    /// Case-insensitive substring test, Unicode aware
    #[inline]
    pub fn mentions(&self, keyword: &str) -> bool {
        self.text.to_lowercase().contains(&keyword.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Pdf,
    Text,
}

fn file_kind(path: &Path) -> Option<FileKind> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some(FileKind::Pdf),
        "txt" | "md" => Some(FileKind::Text),
        _ => None,
    }
}

/// Load every supported document under `path` (a file or a folder).
///
/// When `keyword` is set only documents mentioning it are kept. An empty
/// result is not an error here; the index build reports it.
#[inline]
pub fn load_documents(path: &Path, keyword: Option<&str>) -> Result<Vec<Document>> {
    if !path.exists() {
        return Err(RecipeError::Configuration(format!(
            "Corpus path not found: {}",
            path.display()
        )));
    }

    let documents = if path.is_dir() {
        load_folder(path)
    } else {
        load_file(path)?
    };

    let total = documents.len();
    let documents = match keyword {
        Some(keyword) => filter_by_keyword(documents, keyword),
        None => documents,
    };

    info!(
        "Loaded {} documents from {} ({} kept after filtering)",
        total,
        path.display(),
        documents.len()
    );

    Ok(documents)
}

/// Keep documents that mention `keyword`
#[inline]
pub fn filter_by_keyword(documents: Vec<Document>, keyword: &str) -> Vec<Document> {
    documents
        .into_iter()
        .filter(|document| {
            let keep = document.mentions(keyword);
            if !keep {
                debug!("Skipping {}: does not mention '{}'", document.source, keyword);
            }
            keep
        })
        .collect()
}

fn load_folder(folder: &Path) -> Vec<Document> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", folder.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
    {
        let path = entry.path();
        if file_kind(path).is_none() {
            debug!("Skipping unsupported file: {}", path.display());
            continue;
        }

        // One broken file should not hide the rest of the folder
        match load_file(path) {
            Ok(loaded) => documents.extend(loaded),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    documents
}

fn load_file(path: &Path) -> Result<Vec<Document>> {
    match file_kind(path) {
        Some(FileKind::Pdf) => pdf::read_pages(path),
        Some(FileKind::Text) => {
            let text = fs::read_to_string(path).map_err(|e| RecipeError::Corpus {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            Ok(vec![Document::new(text, Source::file(path))])
        }
        None => Err(RecipeError::Corpus {
            path: path.display().to_string(),
            message: "unsupported file type (expected .pdf, .txt or .md)".to_string(),
        }),
    }
}
