//! Recognition-engine abstraction.
//!
//! The pipeline never talks to an OCR backend directly; it goes through the
//! [`RecognitionEngine`] trait. The engine handle is constructed **once** at
//! process start and passed by reference into every pipeline invocation —
//! explicit dependency injection instead of an ambient global, which keeps
//! tests trivial (hand the orchestrator a scripted engine) and makes the
//! "engine missing" failure a startup error rather than a mid-batch surprise.

pub mod tesseract;

pub use tesseract::TesseractEngine;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page-layout hint passed to the recognition engine.
///
/// Engines must support at least a single-line/sparse mode and a full-page
/// mode; the mapping to backend-specific flags lives in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionMode {
    /// Treat the image as one line of text.
    SingleLine,
    /// Find sparse text in no particular order (labels, whiteboards).
    SparseBlock,
    /// Fully automatic page segmentation.
    FullPage,
}

/// One recognition configuration: a layout mode plus an ordered language set.
///
/// Immutable once built; the pipeline tries a fixed list of these in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassConfig {
    pub mode: RecognitionMode,
    /// Language codes in engine notation (e.g. `"vie"`, `"eng"`), combined
    /// in order for backends that accept multi-language hints.
    pub languages: Vec<String>,
}

impl PassConfig {
    pub fn new(mode: RecognitionMode, languages: &[&str]) -> Self {
        Self {
            mode,
            languages: languages.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The `lang1+lang2` form most engines accept.
    pub fn language_spec(&self) -> String {
        self.languages.join("+")
    }
}

impl std::fmt::Display for PassConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}/{}", self.mode, self.language_spec())
    }
}

/// One recognised token with its engine-reported confidence.
///
/// `confidence` is `None` when the engine reported its "not applicable"
/// sentinel for the token (layout rows, unscored glyphs).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    /// Engine confidence in `[0, 100]`, or `None` if unscored.
    pub confidence: Option<f32>,
}

impl Token {
    pub fn new(text: impl Into<String>, confidence: impl Into<Option<f32>>) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.into(),
        }
    }
}

/// Errors from a recognition backend.
///
/// These are isolated to the pass that raised them — a failed configuration
/// is scored zero and the remaining configurations still run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backend binary or model is not installed.
    #[error("engine not available: {0}")]
    NotAvailable(String),

    /// The backend ran but reported failure.
    #[error("recognition failed: {0}")]
    Failed(String),

    /// Scratch-file or subprocess I/O failure.
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image could not be handed to the backend.
    #[error("image handoff failed: {0}")]
    Image(#[from] image::ImageError),
}

/// An OCR backend: turns a normalised image plus one configuration into
/// token-level text with per-token confidences.
pub trait RecognitionEngine: Send + Sync {
    /// Short identifier for logs (e.g. `"tesseract"`).
    fn name(&self) -> &'static str;

    /// Run one recognition pass. Blocking; the pipeline wraps calls in
    /// `spawn_blocking`.
    fn recognize(
        &self,
        image: &image::GrayImage,
        config: &PassConfig,
    ) -> Result<Vec<Token>, EngineError>;
}
