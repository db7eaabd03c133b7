use std::path::Path;

use lopdf::Document as PdfDocument;
use tracing::{debug, warn};

use super::{Document, Source};
use crate::{RecipeError, Result};

/// Extract the text of every page, one `Document` per page.
/// Pages whose text cannot be extracted are logged and skipped.
pub(super) fn read_pages(path: &Path) -> Result<Vec<Document>> {
    let pdf = PdfDocument::load(path).map_err(|e| RecipeError::Corpus {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let pages = pdf.get_pages();
    debug!("Reading {} pages from {}", pages.len(), path.display());

    let mut documents = Vec::with_capacity(pages.len());
    for page_number in pages.keys() {
        match pdf.extract_text(&[*page_number]) {
            Ok(text) => documents.push(Document::new(text, Source::page(path, *page_number))),
            Err(e) => warn!(
                "Failed to extract text from page {} of {}: {}",
                page_number,
                path.display(),
                e
            ),
        }
    }

    Ok(documents)
}
