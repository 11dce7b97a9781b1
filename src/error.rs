//! Error types for the img2txt library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the run cannot proceed at all (recognition
//!   engine missing, invalid configuration). Returned as `Err(ExtractError)`
//!   from construction-time entry points.
//!
//! * [`FileError`] — **Non-fatal**: a single input file failed (missing path,
//!   undecodable bytes, nothing recognised) but all other files are fine.
//!   Rendered into [`crate::output::FileResult::error`] so callers can inspect
//!   partial success rather than losing the whole batch to one bad image.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! file failure, log and continue, or collect all errors for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the img2txt library.
///
/// Per-file failures use [`FileError`] and are embedded in
/// [`crate::output::FileResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The recognition engine could not be located or initialised.
    ///
    /// This is a precondition for every file, so it aborts the whole run
    /// before any file is touched.
    #[error(
        "recognition engine unavailable: {0}\n\
         Install Tesseract (e.g. apt install tesseract-ocr) or set the binary\n\
         path explicitly with TesseractEngine::with_binary()."
    )]
    EngineUnavailable(String),

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single input file.
///
/// Converted to a human-readable string in [`crate::output::FileResult`];
/// the batch continues with the remaining files.
#[derive(Debug, Clone, Error)]
pub enum FileError {
    /// The input path does not exist.
    #[error("image not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// The file exists but its bytes cannot be decoded as an image.
    #[error("could not decode image '{path}': {detail}")]
    ImageDecodeError { path: PathBuf, detail: String },

    /// Every primary pass and the fallback produced empty text.
    #[error("no text extracted")]
    NoTextExtracted,

    /// The batch was cancelled before this file started.
    #[error("cancelled before processing started")]
    Cancelled,
}
