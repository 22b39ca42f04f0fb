//! # doc2product
//!
//! Extract a structured product record (name, price, color, nature) from a
//! photo, scan, or PDF by chaining text extraction with an LLM completion
//! request.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document (bytes + content type)
//!  │
//!  ├─ 1. Classify  image/* → OCR,  application/pdf → page text
//!  ├─ 2. Extract   Tesseract (leptess) or pdfium, in spawn_blocking
//!  ├─ 3. Prompt    "extract the product name, price, color, …"
//!  ├─ 4. Complete  HTTP chat completion, 5 attempts with 429 backoff
//!  ├─ 5. Parse     labeled Product Name / Price / Color / Nature lines
//!  └─ 6. Fallback  images only: missing Nature re-derived from the image
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2product::{analyze_file, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from OPENAI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let record = analyze_file("receipt.png", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&record)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2product` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! doc2product = { version = "0.1", default-features = false }
//! ```
//!
//! ## Engines
//!
//! OCR runs through Tesseract (the `leptess` bindings; install
//! `tesseract-ocr` and the language data for your documents). PDF text runs
//! through pdfium; set `PDFIUM_LIB_PATH` to point at an existing
//! `libpdfium` copy. Both are deployment concerns — the pipeline sees only
//! the [`pipeline::ocr::OcrEngine`] and [`pipeline::pdf::PdfTextEngine`]
//! traits, which tests replace with fakes.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_document, analyze_file, analyze_sync, Analyzer, PipelineState};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use document::{classify, Document, DocumentFormat};
pub use error::ExtractError;
pub use pipeline::fallback::UNKNOWN_NATURE;
pub use pipeline::llm::{
    ChatMessage, CompletionProvider, CompletionRequest, HttpCompletionClient, RetryPolicy,
};
pub use pipeline::ocr::{OcrEngine, TesseractOcr};
pub use pipeline::pdf::{PdfTextEngine, PdfiumTextExtractor};
pub use record::{Field, ProductRecord};
