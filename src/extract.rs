//! PDF text extraction.
//!
//! Pages are read with pdf-extract. Pages holding only whitespace (scanned
//! images without a text layer, blank separators) are skipped; the remaining
//! pages are joined in order with a single newline.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

/// Errors that can occur during PDF extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to open PDF: {0}")]
    UnreadableDocument(String),

    #[error("PDF has no pages")]
    EmptyDocument,

    #[error("PDF contains no extractable text")]
    NoExtractableText,
}

/// Extract the text of every non-blank page of an in-memory PDF.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractError::UnreadableDocument("malformed PDF structure".to_string()))?
    .map_err(|e| ExtractError::UnreadableDocument(e.to_string()))?;

    tracing::debug!(pages = pages.len(), bytes = bytes.len(), "Parsed PDF");
    join_page_text(pages)
}

/// Join per-page text, skipping whitespace-only pages.
fn join_page_text(pages: Vec<String>) -> Result<String, ExtractError> {
    if pages.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let text_pages: Vec<String> = pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect();

    if text_pages.is_empty() {
        return Err(ExtractError::NoExtractableText);
    }

    Ok(text_pages.join("\n"))
}
