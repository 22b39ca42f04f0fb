//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the blocking
//! thread pool so Tokio workers never stall during parsing.
//!
//! ## Page order is a contract
//!
//! Pages are read strictly in ascending order and their text is
//! concatenated in that order, one space between pages, trimmed at the end.
//! Downstream prompt construction consumes the concatenation as a single
//! reading-order string, so the order is correctness, not presentation.

use crate::error::ExtractError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use tracing::debug;

/// A page-oriented PDF text capability: PDF bytes in, reading-order text out.
///
/// The pipeline only ever sees this trait. Tests inject fakes; production
/// uses [`PdfiumTextExtractor`].
#[async_trait]
pub trait PdfTextEngine: Send + Sync {
    /// Extract all text, pages concatenated in ascending order, trimmed.
    ///
    /// A zero-page document yields an empty string, not an error.
    async fn extract(&self, pdf: &[u8]) -> Result<String, ExtractError>;
}

/// pdfium-backed PDF text extraction.
///
/// The pdfium binding is resolved per call inside the blocking task
/// (`Pdfium::default()`); set `PDFIUM_LIB_PATH` to point at an existing
/// library copy — that path is deployment configuration, not pipeline
/// logic.
pub struct PdfiumTextExtractor;

#[async_trait]
impl PdfTextEngine for PdfiumTextExtractor {
    async fn extract(&self, pdf: &[u8]) -> Result<String, ExtractError> {
        let bytes = pdf.to_vec();

        tokio::task::spawn_blocking(move || extract_blocking(&bytes))
            .await
            .map_err(|e| ExtractError::Internal(format!("PDF task panicked: {e}")))?
    }
}

/// Blocking implementation of page-by-page extraction.
fn extract_blocking(bytes: &[u8]) -> Result<String, ExtractError> {
    let pdfium = Pdfium::default();

    let document =
        pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ExtractError::ExtractionFailed {
                detail: format!("could not open PDF: {e:?}"),
            })?;

    let pages = document.pages();
    debug!("PDF loaded: {} pages", pages.len());

    let mut page_texts = Vec::with_capacity(pages.len() as usize);
    for (index, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| ExtractError::ExtractionFailed {
            detail: format!("could not load text for page {}: {e:?}", index + 1),
        })?;
        page_texts.push(normalize_page_text(&text.all()));
    }

    Ok(join_page_texts(page_texts))
}

/// Join a page's text fragments with single spaces.
fn normalize_page_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accumulate per-page texts in the order given, one space after each,
/// trimmed at the end.
pub(crate) fn join_page_texts<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut accumulated = String::new();
    for page in pages {
        accumulated.push_str(&page);
        accumulated.push(' ');
    }
    accumulated.trim().to_string()
}
