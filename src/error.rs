//! Error types for the doc2product library.
//!
//! One enum covers the whole pipeline. Two kinds deserve a note:
//!
//! * [`ExtractError::NoDocumentSelected`] — the only error with a distinct,
//!   worded user-facing message. It is raised before the pipeline starts and
//!   never touches the network.
//!
//! * [`ExtractError::RateLimited`] — internal to the completion client. The
//!   retry loop absorbs it; callers only ever see
//!   [`ExtractError::MaxRetriesExceeded`] once the attempt budget is spent.
//!
//! Everything else propagates to the orchestrator, which transitions to
//! `Failed`, logs the detail, and clears the in-flight flag.

use thiserror::Error;

/// All errors returned by the doc2product library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Submission errors ─────────────────────────────────────────────────
    /// Submitted without choosing a document first. Local and non-fatal:
    /// no pipeline run occurs.
    #[error("No document selected. Choose an image or PDF file before submitting.")]
    NoDocumentSelected,

    /// The declared content type is neither `image/*` nor `application/pdf`.
    #[error("Unsupported document type '{content_type}'. Accepted: any image/* or application/pdf.")]
    UnsupportedFormat { content_type: String },

    /// Another submission is already running on this analyzer.
    /// One pipeline at a time; resubmit once the current run finishes.
    #[error("An analysis is already in progress. Wait for it to finish before submitting again.")]
    AnalysisInProgress,

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The OCR or PDF engine failed to produce text.
    #[error("Text extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    // ── Completion errors ─────────────────────────────────────────────────
    /// Completion endpoint returned HTTP 429.
    ///
    /// Absorbed by the client's retry loop; surfaces only if something
    /// bypasses that loop.
    #[error("Rate limited by the completion endpoint")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Every attempt hit a rate limit; the attempt budget is spent.
    #[error("Completion request still rate-limited after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    /// The completion endpoint returned a non-retryable error response.
    #[error("Completion API error (HTTP {status}): {detail}")]
    ApiError { status: u16, detail: String },

    /// The request never produced an HTTP response (DNS, TLS, connection).
    #[error("Completion request failed: {reason}")]
    RequestFailed { reason: String },

    /// The reply parsed as JSON but is missing `choices[0].message.content`.
    #[error("Completion reply missing expected structure: {detail}")]
    UnexpectedResponseShape { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read the submitted file from disk.
    #[error("Failed to read document '{path}': {source}")]
    DocumentReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (blocking task panicked, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}
