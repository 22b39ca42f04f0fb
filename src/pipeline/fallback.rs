//! Nature fallback: re-derive a missing "Nature" field from the image.
//!
//! Runs only when the primary reply had no `Nature:` line and the
//! submission was an image. The original bytes go through OCR again, a
//! "describe the product" prompt is sent, and the whole reply becomes the
//! nature value.
//!
//! This is the one place in the pipeline with a degrade-to-default policy:
//! any failure here yields [`UNKNOWN_NATURE`] instead of an error, so a
//! missing nature can never abort an otherwise successful run. PDFs never
//! reach this path — there is no source image to describe.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::pipeline::llm::{ChatMessage, CompletionProvider, CompletionRequest};
use crate::pipeline::ocr::OcrEngine;
use crate::prompts;
use tracing::{debug, warn};

/// Value used when the fallback itself fails.
pub const UNKNOWN_NATURE: &str = "Unknown nature";

/// Derive a nature value from the original image, or [`UNKNOWN_NATURE`].
pub async fn resolve_nature(
    ocr: &dyn OcrEngine,
    provider: &dyn CompletionProvider,
    config: &ExtractionConfig,
    image: &[u8],
) -> String {
    match try_resolve(ocr, provider, config, image).await {
        Ok(nature) => nature,
        Err(e) => {
            warn!("Nature fallback failed ({e}); using \"{UNKNOWN_NATURE}\"");
            UNKNOWN_NATURE.to_string()
        }
    }
}

async fn try_resolve(
    ocr: &dyn OcrEngine,
    provider: &dyn CompletionProvider,
    config: &ExtractionConfig,
    image: &[u8],
) -> Result<String, ExtractError> {
    let text = ocr.recognize(image).await?;
    debug!("Fallback OCR produced {} bytes of text", text.len());

    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(prompts::DEFAULT_SYSTEM_PROMPT);

    let request = CompletionRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(prompts::nature_prompt(&text)),
        ],
        max_tokens: config.fallback_max_tokens,
        temperature: config.temperature,
    };

    // The full reply text, as-is, is the nature value.
    provider.complete(&request).await
}
