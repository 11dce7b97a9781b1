//! # img2txt
//!
//! Extract text from images using multi-pass OCR with confidence-weighted
//! selection, adaptive fallback, and optional LLM refinement.
//!
//! ## Why this crate?
//!
//! A single OCR invocation with default settings fails on exactly the images
//! people actually photograph — whiteboards, handwriting, skewed receipts,
//! unevenly lit scans. Instead this crate normalises the image through a
//! fixed matrix-transform pipeline, runs several recognition configurations,
//! scores each pass with a length-weighted confidence metric, escalates to a
//! more aggressive fallback when nothing clears the quality floor, and can
//! blend the result with an independent generative-model rating.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Normalize  grayscale → equalize → deskew → sharpen → binarize → denoise
//!  ├─ 2. Recognize  one engine pass per (mode, language-set) candidate
//!  ├─ 3. Aggregate  length-weighted confidence, best pass wins
//!  ├─ 4. Fallback   2× upscale + Otsu + permissive pass, below the floor
//!  ├─ 5. Refine     optional generative rewrite + independent rating
//!  └─ 6. Report     cleaned text + confidence, per-file errors embedded
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2txt::{extract, ExtractionConfig, RecognitionEngine, TesseractEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The engine is located once, at startup — a missing engine is the
//!     // only fatal error in the system.
//!     let engine: Arc<dyn RecognitionEngine> = Arc::new(TesseractEngine::locate()?);
//!     let config = ExtractionConfig::default();
//!     let result = extract("receipt.png", &engine, &config).await;
//!     println!("{} ({:.0}%)", result.text, result.confidence);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2txt` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! img2txt = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, RefinementConfig};
pub use engine::{PassConfig, RecognitionEngine, RecognitionMode, TesseractEngine, Token};
pub use error::{ExtractError, FileError};
pub use extract::{extract, extract_batch, CancelFlag};
pub use output::{render_report, FileResult, ReportEntry};
pub use stream::{extract_stream, ResultStream};
