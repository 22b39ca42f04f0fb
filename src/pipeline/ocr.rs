//! Image text extraction via Tesseract.
//!
//! ## Why spawn_blocking?
//!
//! leptess wraps the Tesseract/Leptonica C libraries, which are synchronous
//! and CPU-heavy. `tokio::task::spawn_blocking` moves recognition onto the
//! blocking thread pool so the async workers are never stalled behind a
//! multi-second OCR pass.
//!
//! There is no retry here: an OCR failure is reported once with its cause,
//! and retrying is the caller's decision.

use crate::error::ExtractError;
use async_trait::async_trait;
use leptess::LepTess;
use tracing::debug;

/// An OCR capability: image bytes in, recognized text out.
///
/// The pipeline only ever sees this trait. Tests inject fakes; production
/// uses [`TesseractOcr`].
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in `image`, trimmed. Fails with
    /// [`ExtractError::ExtractionFailed`] on any engine error.
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractError>;
}

/// Tesseract-backed OCR via leptess.
///
/// A fresh Tesseract instance is created per call; the engine keeps
/// per-image state internally and is cheaper to recreate than to guard
/// behind a lock across blocking threads.
pub struct TesseractOcr {
    language: String,
}

impl TesseractOcr {
    /// Create an engine for the given Tesseract language code (e.g. `eng`).
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractError> {
        let language = self.language.clone();
        let bytes = image.to_vec();

        tokio::task::spawn_blocking(move || recognize_blocking(&bytes, &language))
            .await
            .map_err(|e| ExtractError::Internal(format!("OCR task panicked: {e}")))?
    }
}

/// Blocking implementation of text recognition.
fn recognize_blocking(bytes: &[u8], language: &str) -> Result<String, ExtractError> {
    // Reject non-image bytes before Tesseract sees them.
    image::guess_format(bytes).map_err(|e| ExtractError::ExtractionFailed {
        detail: format!("unrecognised image data: {e}"),
    })?;

    let mut tess = LepTess::new(None, language).map_err(|e| ExtractError::ExtractionFailed {
        detail: format!("Tesseract init failed for language '{language}': {e}"),
    })?;

    tess.set_image_from_mem(bytes)
        .map_err(|e| ExtractError::ExtractionFailed {
            detail: format!("Tesseract could not read the image: {e}"),
        })?;

    let text = tess
        .get_utf8_text()
        .map_err(|e| ExtractError::ExtractionFailed {
            detail: format!("Tesseract recognition failed: {e}"),
        })?;

    let text = text.trim().to_string();
    debug!("OCR produced {} bytes of text", text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn garbage_bytes_fail_before_tesseract() {
        let engine = TesseractOcr::new("eng");
        let err = engine.recognize(b"definitely not an image").await.unwrap_err();
        match err {
            ExtractError::ExtractionFailed { detail } => {
                assert!(detail.contains("unrecognised image data"), "got: {detail}");
            }
            other => panic!("expected ExtractionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_input_fails() {
        let engine = TesseractOcr::new("eng");
        assert!(engine.recognize(&[]).await.is_err());
    }
}
