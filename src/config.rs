//! Configuration types for document analysis.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share configs across submissions and to inject fake
//! engines in tests.

use crate::error::ExtractError;
use crate::pipeline::llm::{CompletionProvider, DEFAULT_COMPLETIONS_URL};
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::pdf::PdfTextEngine;
use std::fmt;
use std::sync::Arc;

/// Configuration for an analysis run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2product::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-3.5-turbo")
///     .max_attempts(5)
///     .ocr_language("eng")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Completion model identifier. Default: `gpt-3.5-turbo`.
    pub model: String,

    /// Chat-completions endpoint URL.
    ///
    /// Point this at any OpenAI-compatible server; tests point it at a
    /// local mock.
    pub api_url: String,

    /// API key for the completion endpoint.
    ///
    /// If `None`, the `OPENAI_API_KEY` environment variable is consulted
    /// when the HTTP client is built. An absent key is not a startup
    /// error — the first request fails authentication instead.
    pub api_key: Option<String>,

    /// Token limit for the primary extraction request. Default: 150.
    ///
    /// Four short labeled lines fit comfortably; raising this mostly buys
    /// the model room to ramble past what the parser reads.
    pub max_tokens: u32,

    /// Token limit for the nature-fallback request. Default: 100.
    pub fallback_max_tokens: u32,

    /// Sampling temperature for both requests. Default: 0.7.
    pub temperature: f32,

    /// Total completion attempts per request, counting the first. Default: 5.
    ///
    /// Only HTTP 429 consumes attempts; any other failure returns
    /// immediately.
    pub max_attempts: u32,

    /// Wait after a 429 that carries no `retry-after` header, in seconds.
    /// Default: 1.
    pub default_retry_delay_secs: u64,

    /// Tesseract language code passed to the OCR engine. Default: `eng`.
    pub ocr_language: String,

    /// Custom system message. If `None`, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Pre-constructed completion provider. Takes precedence over the
    /// HTTP client assembled from `api_url`/`api_key`.
    pub provider: Option<Arc<dyn CompletionProvider>>,

    /// Pre-constructed OCR engine; defaults to Tesseract via leptess.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Pre-constructed PDF text engine; defaults to pdfium.
    pub pdf_engine: Option<Arc<dyn PdfTextEngine>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            api_url: DEFAULT_COMPLETIONS_URL.to_string(),
            api_key: None,
            max_tokens: 150,
            fallback_max_tokens: 100,
            temperature: 0.7,
            max_attempts: 5,
            default_retry_delay_secs: 1,
            ocr_language: "eng".to_string(),
            system_prompt: None,
            provider: None,
            ocr_engine: None,
            pdf_engine: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_tokens", &self.max_tokens)
            .field("fallback_max_tokens", &self.fallback_max_tokens)
            .field("temperature", &self.temperature)
            .field("max_attempts", &self.max_attempts)
            .field("default_retry_delay_secs", &self.default_retry_delay_secs)
            .field("ocr_language", &self.ocr_language)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn CompletionProvider>"))
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("pdf_engine", &self.pdf_engine.as_ref().map(|_| "<dyn PdfTextEngine>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn fallback_max_tokens(mut self, n: u32) -> Self {
        self.config.fallback_max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn default_retry_delay_secs(mut self, secs: u64) -> Self {
        self.config.default_retry_delay_secs = secs;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn pdf_engine(mut self, engine: Arc<dyn PdfTextEngine>) -> Self {
        self.config.pdf_engine = Some(engine);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(ExtractError::InvalidConfig("Model must not be empty".into()));
        }
        if c.api_url.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "Completion endpoint URL must not be empty".into(),
            ));
        }
        if c.max_attempts == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 || c.fallback_max_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "Token limits must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.model, "gpt-3.5-turbo");
        assert_eq!(c.max_tokens, 150);
        assert_eq!(c.fallback_max_tokens, 100);
        assert_eq!(c.temperature, 0.7);
        assert_eq!(c.max_attempts, 5);
        assert_eq!(c.default_retry_delay_secs, 1);
        assert_eq!(c.ocr_language, "eng");
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ExtractionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = ExtractionConfig::builder().model("").build().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn max_attempts_floor_is_one() {
        let c = ExtractionConfig::builder().max_attempts(0).build().unwrap();
        assert_eq!(c.max_attempts, 1);
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ExtractionConfig::builder().api_key("sk-secret").build().unwrap();
        let s = format!("{c:?}");
        assert!(!s.contains("sk-secret"));
        assert!(s.contains("<redacted>"));
    }
}
