//! CLI binary for doc2product.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the extracted record as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use doc2product::{analyze_file, ExtractionConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a product record from a photo
  doc2product receipt.png

  # From a PDF datasheet
  doc2product datasheet.pdf

  # Compact JSON on stdout, logs on stderr
  doc2product --compact product.jpg

  # Use a different model or an OpenAI-compatible endpoint
  doc2product --model gpt-4o-mini product.jpg
  doc2product --api-url http://localhost:8080/v1/chat/completions product.jpg

  # OCR a non-English document
  doc2product --language fra facture.png

ACCEPTED INPUTS:
  Images (png, jpg/jpeg, gif, webp, bmp, tiff) and PDF files.
  Anything else is rejected before extraction.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          Completion API key (required for real runs)
  PDFIUM_LIB_PATH         Path to an existing libpdfium copy

SETUP:
  1. Install Tesseract:   apt install tesseract-ocr   (or brew install tesseract)
  2. Set API key:         export OPENAI_API_KEY=sk-...
  3. Extract:             doc2product product.png
"#;

/// Extract a structured product record from an image or PDF.
#[derive(Parser, Debug)]
#[command(
    name = "doc2product",
    version,
    about = "Extract product name, price, color, and nature from an image or PDF",
    long_about = "Extract a structured product record from a photo, scan, or PDF. \
Text is recognised locally (Tesseract for images, pdfium for PDFs) and an LLM \
completion turns it into labeled fields, printed as JSON.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image or PDF file to analyze.
    input: PathBuf,

    /// Completion model ID.
    #[arg(long, env = "DOC2PRODUCT_MODEL", default_value = "gpt-3.5-turbo")]
    model: String,

    /// Chat-completions endpoint URL (any OpenAI-compatible server).
    #[arg(long, env = "DOC2PRODUCT_API_URL")]
    api_url: Option<String>,

    /// Tesseract language code for OCR.
    #[arg(long, env = "DOC2PRODUCT_LANGUAGE", default_value = "eng")]
    language: String,

    /// Max completion tokens for the primary extraction request.
    #[arg(long, env = "DOC2PRODUCT_MAX_TOKENS", default_value_t = 150)]
    max_tokens: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "DOC2PRODUCT_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Total completion attempts when rate-limited.
    #[arg(long, env = "DOC2PRODUCT_MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DOC2PRODUCT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Print the record as a single JSON line instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOC2PRODUCT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2PRODUCT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the record itself.
    #[arg(short, long, env = "DOC2PRODUCT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the user's feedback; keep library logs quiet unless
    // asked for more.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;

    // ── Run the pipeline ─────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("Analyzing {}…", cli.input.display()));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = analyze_file(&cli.input, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let record = result.context("Analysis failed")?;

    // ── Print the record ─────────────────────────────────────────────────
    let json = if cli.compact {
        serde_json::to_string(&record)
    } else {
        serde_json::to_string_pretty(&record)
    }
    .context("Failed to serialise record")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(json.as_bytes())
        .context("Failed to write to stdout")?;
    handle.write_all(b"\n").ok();

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .ocr_language(&cli.language)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_attempts(cli.max_attempts);

    if let Some(ref url) = cli.api_url {
        builder = builder.api_url(url);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
