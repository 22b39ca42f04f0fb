//! The analysis pipeline: submission in, product record out.
//!
//! ## Sequencing
//!
//! Within one submission every step is strictly sequential — each consumes
//! the previous step's full output:
//!
//! ```text
//! classify ──▶ extract text ──▶ complete ──▶ parse ──▶ [nature fallback]
//! ```
//!
//! The orchestrator walks an explicit state machine
//! (`Idle → Extracting → Analyzing → (FallbackResolving) → Done | Failed`)
//! and holds a single in-flight flag: one pipeline at a time per
//! [`Analyzer`]. A second submission while one is running is rejected with
//! [`ExtractError::AnalysisInProgress`] rather than interleaving state.
//! `Done` and `Failed` are terminal for a submission; the next submission
//! starts the machine over.

use crate::config::ExtractionConfig;
use crate::document::{Document, DocumentFormat};
use crate::error::ExtractError;
use crate::pipeline::fallback;
use crate::pipeline::llm::{
    ChatMessage, CompletionProvider, CompletionRequest, HttpCompletionClient,
};
use crate::pipeline::ocr::{OcrEngine, TesseractOcr};
use crate::pipeline::pdf::{PdfTextEngine, PdfiumTextExtractor};
use crate::prompts;
use crate::record::ProductRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Where a submission currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No submission has run yet.
    Idle,
    /// Text extraction (OCR or PDF) is running.
    Extracting,
    /// The primary completion request is running.
    Analyzing,
    /// The primary reply had no nature; re-deriving it from the image.
    FallbackResolving,
    /// The last submission produced a record.
    Done,
    /// The last submission failed.
    Failed,
}

/// Runs the extraction-and-analysis pipeline for one submission at a time.
///
/// Construct once, submit documents via [`Analyzer::analyze`]. Engines and
/// the completion provider come from the config's injection seams or fall
/// back to the production defaults (Tesseract, pdfium, HTTP client).
pub struct Analyzer {
    config: ExtractionConfig,
    ocr: Arc<dyn OcrEngine>,
    pdf: Arc<dyn PdfTextEngine>,
    provider: Arc<dyn CompletionProvider>,
    in_flight: AtomicBool,
    state: Mutex<PipelineState>,
}

impl Analyzer {
    /// Create an analyzer from a validated config.
    pub fn new(config: ExtractionConfig) -> Self {
        let ocr = config
            .ocr_engine
            .clone()
            .unwrap_or_else(|| Arc::new(TesseractOcr::new(config.ocr_language.clone())));
        let pdf = config
            .pdf_engine
            .clone()
            .unwrap_or_else(|| Arc::new(PdfiumTextExtractor));
        let provider = config
            .provider
            .clone()
            .unwrap_or_else(|| Arc::new(HttpCompletionClient::from_config(&config)));

        Self {
            config,
            ocr,
            pdf,
            provider,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// The state the pipeline is currently in (terminal state of the last
    /// submission once it finished).
    pub fn state(&self) -> PipelineState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_state(&self, next: PipelineState) {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        debug!("Pipeline state: {:?} → {:?}", *guard, next);
        *guard = next;
    }

    /// Run the full pipeline for one submission.
    ///
    /// `None` reports [`ExtractError::NoDocumentSelected`] without starting
    /// a run — no state change, no network. While a run is active, further
    /// submissions are rejected with [`ExtractError::AnalysisInProgress`].
    pub async fn analyze(&self, document: Option<Document>) -> Result<ProductRecord, ExtractError> {
        let Some(document) = document else {
            return Err(ExtractError::NoDocumentSelected);
        };

        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(ExtractError::AnalysisInProgress);
        }

        let result = self.run(document).await;

        if let Err(ref e) = result {
            error!("Analysis failed: {e}");
            self.set_state(PipelineState::Failed);
        }
        // Clearing the flag is the "loading indicator off" moment, on both
        // paths.
        self.in_flight.store(false, Ordering::SeqCst);

        result
    }

    async fn run(&self, document: Document) -> Result<ProductRecord, ExtractError> {
        info!("Starting analysis of a '{}' document", document.content_type);
        self.set_state(PipelineState::Extracting);

        let format = document.format()?;
        let text = match format {
            DocumentFormat::Image => self.ocr.recognize(&document.bytes).await?,
            DocumentFormat::Pdf => self.pdf.extract(&document.bytes).await?,
        };
        debug!("Extracted {} bytes of text", text.len());

        self.set_state(PipelineState::Analyzing);
        let reply = self.provider.complete(&self.primary_request(&text)).await?;
        let mut record = ProductRecord::from_reply(&reply);

        if record.nature.is_none() && format == DocumentFormat::Image {
            self.set_state(PipelineState::FallbackResolving);
            let nature = fallback::resolve_nature(
                self.ocr.as_ref(),
                self.provider.as_ref(),
                &self.config,
                &document.bytes,
            )
            .await;
            // First writer wins: fill only while still empty.
            if record.nature.is_none() {
                record.nature = Some(nature);
            }
        }

        self.set_state(PipelineState::Done);
        info!("Analysis complete");
        Ok(record)
    }

    fn primary_request(&self, text: &str) -> CompletionRequest {
        let system_prompt = self
            .config
            .system_prompt
            .as_deref()
            .unwrap_or(prompts::DEFAULT_SYSTEM_PROMPT);

        CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(prompts::extraction_prompt(text)),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Analyze one document with a fresh pipeline instance.
///
/// This is the primary entry point for the library.
pub async fn analyze_document(
    document: Document,
    config: &ExtractionConfig,
) -> Result<ProductRecord, ExtractError> {
    Analyzer::new(config.clone()).analyze(Some(document)).await
}

/// Read a file from disk and analyze it.
///
/// The content type is derived from the file extension; unsupported
/// extensions are rejected before extraction.
pub async fn analyze_file(
    path: impl AsRef<std::path::Path>,
    config: &ExtractionConfig,
) -> Result<ProductRecord, ExtractError> {
    let document = Document::from_path(path).await?;
    analyze_document(document, config).await
}

/// Synchronous wrapper around [`analyze_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    document: Document,
    config: &ExtractionConfig,
) -> Result<ProductRecord, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(analyze_document(document, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_document_is_local_and_leaves_state_idle() {
        let analyzer = Analyzer::new(ExtractionConfig::default());
        let err = analyzer.analyze(None).await.unwrap_err();
        assert!(matches!(err, ExtractError::NoDocumentSelected));
        assert_eq!(analyzer.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn unsupported_type_fails_before_extraction() {
        let analyzer = Analyzer::new(ExtractionConfig::default());
        let document = Document::new(b"hello".to_vec(), "text/plain");
        let err = analyzer.analyze(Some(document)).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat { .. }));
        assert_eq!(analyzer.state(), PipelineState::Failed);
    }

    #[tokio::test]
    async fn analyzer_is_reusable_after_failure() {
        let analyzer = Analyzer::new(ExtractionConfig::default());
        let bad = Document::new(vec![], "application/zip");
        assert!(analyzer.analyze(Some(bad.clone())).await.is_err());
        // The in-flight flag was cleared; a new submission is accepted
        // (and fails for its own reason, not AnalysisInProgress).
        let err = analyzer.analyze(Some(bad)).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat { .. }));
    }
}
