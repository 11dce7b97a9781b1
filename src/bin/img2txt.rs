//! CLI binary for img2txt.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the JSON report.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use img2txt::{
    extract_stream, render_report, ExtractionConfig, FileResult, RecognitionEngine,
    RefinementConfig, TesseractEngine,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic extraction (JSON report on stdout)
  img2txt scan.png

  # Several images — one report entry per input, in order
  img2txt page1.jpg page2.jpg page3.jpg

  # Enable LLM refinement
  img2txt --refine-key $GEMINI_API_KEY whiteboard.png

  # Keep a sibling <basename>_refined.txt next to each input
  img2txt --save receipt.png

OUTPUT:
  A JSON array on stdout, one entry per input path, in input order:
    { "text": "...", "confidence": 87.4, "error": null }
  Per-file failures are embedded in their entry; the process still exits 0.
  Only a missing recognition engine aborts the run.

ENVIRONMENT VARIABLES:
  IMG2TXT_REFINE_KEY       Refinement service API key
  IMG2TXT_REFINE_ENDPOINT  Refinement generateContent endpoint URL

SETUP:
  1. Install Tesseract:   apt install tesseract-ocr tesseract-ocr-vie
  2. Extract:             img2txt scan.png
"#;

/// Default refinement endpoint when only a key is supplied.
const DEFAULT_REFINE_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Extract text from images using multi-pass OCR.
#[derive(Parser, Debug)]
#[command(
    name = "img2txt",
    version,
    about = "Extract text from images using multi-pass OCR",
    long_about = "Extract text from photographed or scanned images using a multi-pass OCR \
pipeline: image normalisation, several recognition configurations scored by length-weighted \
confidence, an adaptive fallback for low-quality captures, and optional LLM refinement.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image files to process (PNG, JPEG, BMP, TIFF).
    inputs: Vec<PathBuf>,

    /// Refinement service API key; enables the refinement stage.
    #[arg(long, env = "IMG2TXT_REFINE_KEY")]
    refine_key: Option<String>,

    /// Refinement generateContent endpoint URL.
    #[arg(long, env = "IMG2TXT_REFINE_ENDPOINT")]
    refine_endpoint: Option<String>,

    /// Per-refinement-call timeout in seconds.
    #[arg(long, env = "IMG2TXT_REFINE_TIMEOUT", default_value_t = 30)]
    refine_timeout: u64,

    /// Quality floor below which the fallback strategy is tried (0–100).
    #[arg(long, env = "IMG2TXT_QUALITY_FLOOR", default_value_t = 60.0)]
    quality_floor: f32,

    /// Write a sibling <basename>_refined.txt next to each input.
    #[arg(long, env = "IMG2TXT_SAVE")]
    save: bool,

    /// Disable the progress bar.
    #[arg(long, env = "IMG2TXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2TXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the report and errors.
    #[arg(short, long, env = "IMG2TXT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Usage check ──────────────────────────────────────────────────────
    // The report contract promises one entry per input; zero inputs is a
    // usage error, not an empty report.
    if cli.inputs.is_empty() {
        eprintln!("usage: img2txt <image>... [--refine-key KEY] [--refine-endpoint URL] [--save]");
        eprintln!("try 'img2txt --help' for details");
        std::process::exit(1);
    }

    // ── Logging setup ────────────────────────────────────────────────────
    // The report goes to stdout; logs go to stderr so piping stays clean.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Locate the recognition engine ────────────────────────────────────
    // The one fatal precondition: without an engine no file can be processed.
    let engine: Arc<dyn RecognitionEngine> =
        Arc::new(TesseractEngine::locate().context("cannot start")?);

    let config = build_config(&cli)?;

    // ── Run the batch ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && cli.inputs.len() > 1;
    let bar = if show_progress {
        let bar = ProgressBar::new(cli.inputs.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let mut stream = extract_stream(cli.inputs.clone(), engine, config, None);
    let mut results: Vec<FileResult> = Vec::with_capacity(cli.inputs.len());
    while let Some(result) = stream.next().await {
        if let Some(ref bar) = bar {
            bar.inc(1);
        }
        results.push(result);
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    // ── Print the report ─────────────────────────────────────────────────
    let report = render_report(&results).context("failed to serialise report")?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(report.as_bytes())
        .context("failed to write to stdout")?;
    handle.write_all(b"\n").ok();

    if !cli.quiet {
        let failed = results.iter().filter(|r| r.error.is_some()).count();
        if failed > 0 {
            eprintln!("{}/{} files failed (see report entries)", failed, results.len());
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .quality_floor(cli.quality_floor)
        .save_artifacts(cli.save);

    if let Some(ref key) = cli.refine_key {
        let endpoint = cli
            .refine_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_REFINE_ENDPOINT.to_string());
        let mut refinement = RefinementConfig::new(key.clone(), endpoint);
        refinement.timeout_secs = cli.refine_timeout.max(1);
        builder = builder.refinement(refinement);
    }

    builder.build().context("invalid configuration")
}
