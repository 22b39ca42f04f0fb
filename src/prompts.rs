//! Prompts for product-field extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the wording the field parser depends on
//!    (the model answering with `Product Name:` / `Price:` / `Color:` /
//!    `Nature:` lines) is defined in exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live completion endpoint.
//!
//! Callers can override the system message via
//! [`crate::config::ExtractionConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

/// Default system message sent with every completion request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Build the primary extraction prompt from a document's extracted text.
///
/// Asks for the four fields the parser looks for: product name, price,
/// color, and the nature of the product.
pub fn extraction_prompt(text: &str) -> String {
    format!(
        "Based on the following text, extract the product name, price, color, \
         and identify the nature of the product: {text}"
    )
}

/// Build the secondary prompt used when the primary reply omitted a nature.
///
/// The full reply to this prompt becomes the nature value verbatim.
pub fn nature_prompt(ocr_text: &str) -> String {
    format!("Describe the product in this image based on the following text: {ocr_text}")
}
