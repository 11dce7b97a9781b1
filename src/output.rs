//! Output types: per-file results and the CLI report.
//!
//! [`FileResult`] is the library-level result — one per input image, carrying
//! the extraction flags callers may want to inspect. [`ReportEntry`] is the
//! narrower, stable JSON contract the CLI prints: exactly
//! `{ "text", "confidence", "error" }` per input, in input order.

use serde::Serialize;

use crate::error::FileError;

/// The result of extracting one image.
///
/// Immutable once constructed. Either `error` is `None` and `confidence` is
/// in `[0, 100]`, or `error` is set and `confidence` is 0.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    /// Cleaned extracted text; empty when `error` is set.
    pub text: String,

    /// Final confidence in `[0, 100]`.
    pub confidence: f32,

    /// The primary passes fell below the quality floor and the fallback
    /// attempt supplied this result.
    pub used_fallback: bool,

    /// The refinement service rewrote the text.
    pub used_refinement: bool,

    /// Wall-clock processing time for this file.
    pub duration_ms: u64,

    /// Human-readable failure description, if the file failed.
    pub error: Option<String>,
}

impl FileResult {
    /// A failed result for `err`, with confidence pinned to zero.
    pub fn from_error(err: &FileError, duration_ms: u64) -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            used_fallback: false,
            used_refinement: false,
            duration_ms,
            error: Some(err.to_string()),
        }
    }

    /// The stable CLI report entry for this result.
    pub fn report_entry(&self) -> ReportEntry {
        ReportEntry {
            text: if self.error.is_some() {
                None
            } else {
                Some(self.text.clone())
            },
            confidence: self.confidence,
            error: self.error.clone(),
        }
    }
}

/// One entry of the CLI JSON report.
///
/// `text` is `null` for failed files so consumers can distinguish "no text"
/// from "empty text" without parsing the error string.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub text: Option<String>,
    pub confidence: f32,
    pub error: Option<String>,
}

/// Render the batch report: a pretty-printed JSON array, one entry per input
/// in input order, per-file errors embedded.
pub fn render_report(results: &[FileResult]) -> serde_json::Result<String> {
    let entries: Vec<ReportEntry> = results.iter().map(FileResult::report_entry).collect();
    serde_json::to_string_pretty(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn error_result_has_zero_confidence_and_no_text() {
        let err = FileError::InputNotFound {
            path: PathBuf::from("missing.png"),
        };
        let result = FileResult::from_error(&err, 3);
        assert_eq!(result.confidence, 0.0);
        assert!(result.text.is_empty());
        assert!(result.error.as_deref().unwrap().contains("missing.png"));
    }

    #[test]
    fn report_entry_nulls_text_on_error() {
        let result = FileResult::from_error(&FileError::NoTextExtracted, 0);
        let entry = result.report_entry();
        assert!(entry.text.is_none());
        assert!(entry.error.is_some());
    }

    #[test]
    fn report_is_an_array_in_input_order() {
        let ok = FileResult {
            text: "hello".into(),
            confidence: 95.0,
            used_fallback: false,
            used_refinement: false,
            duration_ms: 10,
            error: None,
        };
        let bad = FileResult::from_error(&FileError::NoTextExtracted, 1);

        let json = render_report(&[ok, bad]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["text"], "hello");
        assert_eq!(entries[0]["confidence"], 95.0);
        assert_eq!(entries[0]["error"], serde_json::Value::Null);
        assert_eq!(entries[1]["text"], serde_json::Value::Null);
        assert_eq!(entries[1]["confidence"], 0.0);
    }
}
