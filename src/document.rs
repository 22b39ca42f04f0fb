//! Submitted documents and content-type classification.
//!
//! A [`Document`] is the raw byte buffer plus the declared MIME type, exactly
//! as a file-upload surface hands it over. Classification looks only at the
//! declared type — any `image/*` routes to OCR, `application/pdf` routes to
//! the PDF text engine, everything else is rejected before extraction.

use crate::error::ExtractError;
use std::path::Path;

/// A document submitted for analysis: raw bytes plus declared content type.
///
/// Owned exclusively by one pipeline run. The bytes are kept for the whole
/// run because the nature fallback re-reads the original image.
#[derive(Debug, Clone)]
pub struct Document {
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Declared MIME type, e.g. `image/png` or `application/pdf`.
    pub content_type: String,
}

impl Document {
    /// Create a document from in-memory bytes and a declared content type.
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Read a document from disk, deriving the content type from the
    /// file extension.
    ///
    /// Unknown extensions map to `application/octet-stream`, which the
    /// classifier then rejects with [`ExtractError::UnsupportedFormat`].
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let bytes =
            tokio::fs::read(path)
                .await
                .map_err(|e| ExtractError::DocumentReadFailed {
                    path: path.display().to_string(),
                    source: e,
                })?;
        Ok(Self::new(bytes, content_type_for(path)))
    }

    /// Classify this document's declared content type.
    pub fn format(&self) -> Result<DocumentFormat, ExtractError> {
        classify(&self.content_type)
    }
}

/// How a document will be routed through text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Any `image/*` type; text comes from OCR.
    Image,
    /// Exactly `application/pdf`; text comes from per-page extraction.
    Pdf,
}

/// Route a declared content type to its extraction path.
///
/// The match is purely on the declared type string; the bytes are not
/// sniffed here. A wrong declaration surfaces later as an engine failure.
pub fn classify(content_type: &str) -> Result<DocumentFormat, ExtractError> {
    if content_type.starts_with("image/") {
        Ok(DocumentFormat::Image)
    } else if content_type == "application/pdf" {
        Ok(DocumentFormat::Pdf)
    } else {
        Err(ExtractError::UnsupportedFormat {
            content_type: content_type.to_string(),
        })
    }
}

/// Map a file extension to the MIME type a browser upload would declare.
fn content_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_image_types() {
        assert_eq!(classify("image/png").unwrap(), DocumentFormat::Image);
        assert_eq!(classify("image/jpeg").unwrap(), DocumentFormat::Image);
        assert_eq!(classify("image/webp").unwrap(), DocumentFormat::Image);
    }

    #[test]
    fn classify_pdf() {
        assert_eq!(classify("application/pdf").unwrap(), DocumentFormat::Pdf);
    }

    #[test]
    fn classify_rejects_everything_else() {
        for ct in ["text/plain", "application/json", "video/mp4", "", "pdf"] {
            let err = classify(ct).unwrap_err();
            assert!(
                matches!(err, ExtractError::UnsupportedFormat { .. }),
                "expected UnsupportedFormat for {ct:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn classify_requires_exact_pdf_type() {
        // Prefix matching applies to image/* only.
        assert!(classify("application/pdf+xml").is_err());
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("doc.pdf")), "application/pdf");
        assert_eq!(
            content_type_for(Path::new("notes.txt")),
            "application/octet-stream"
        );
        assert_eq!(
            content_type_for(Path::new("noext")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn from_path_reads_bytes_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        std::fs::write(&path, b"\x89PNG fake").unwrap();

        let doc = Document::from_path(&path).await.unwrap();
        assert_eq!(doc.content_type, "image/png");
        assert_eq!(doc.bytes, b"\x89PNG fake");
    }

    #[tokio::test]
    async fn from_path_missing_file_errors() {
        let err = Document::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::DocumentReadFailed { .. }));
    }
}
