//! Pipeline stages for document-to-product-record analysis.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. a different OCR backend) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! document ──▶ ocr | pdf ──▶ llm ──▶ parse ──▶ [fallback]
//! (bytes+type)  (text)      (reply)  (record)  (nature only)
//! ```
//!
//! 1. [`ocr`]      — recognize text in image bytes; runs in
//!    `spawn_blocking` because Tesseract is not async-safe
//! 2. [`pdf`]      — extract per-page text in ascending page order; also
//!    `spawn_blocking` (pdfium)
//! 3. [`llm`]      — drive the completion call with retry/backoff; the only
//!    stage with network I/O
//! 4. [`fallback`] — re-derive a missing "Nature" field from the original
//!    image, degrading to a default instead of failing

pub mod fallback;
pub mod llm;
pub mod ocr;
pub mod pdf;
