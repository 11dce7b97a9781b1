//! Tesseract backend: subprocess invocation with TSV confidence output.
//!
//! ## Why a subprocess?
//!
//! Linking libtesseract ties the build to a system C++ toolchain and a
//! specific API version. Shelling out to the `tesseract` binary keeps the
//! crate pure Rust, works with whatever distribution package is installed,
//! and the TSV output format has been stable for years. The cost — one
//! process spawn and a scratch PNG per pass — is negligible next to the
//! recognition work itself.
//!
//! ## TSV contract
//!
//! `tesseract <img> stdout ... tsv` emits one row per layout element. Word
//! rows have `level == 5`; column 11 (`conf`) is the word confidence in
//! `[0, 100]`, with `-1` as the "not applicable" sentinel that we map to
//! `Token::confidence = None`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::GrayImage;
use tracing::debug;

use super::{EngineError, PassConfig, RecognitionEngine, RecognitionMode, Token};
use crate::error::ExtractError;

/// Conventional install locations probed before falling back to `$PATH`.
const BINARY_CANDIDATES: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// Handle to a located Tesseract binary.
///
/// Construct once via [`TesseractEngine::locate`] at startup and share
/// behind an `Arc<dyn RecognitionEngine>`.
pub struct TesseractEngine {
    binary: PathBuf,
}

impl TesseractEngine {
    /// Probe the conventional install paths, then `$PATH`, and verify the
    /// binary answers `--version`.
    ///
    /// # Errors
    /// [`ExtractError::EngineUnavailable`] when no working binary is found —
    /// fatal, since recognition is a precondition for every file.
    pub fn locate() -> Result<Self, ExtractError> {
        for candidate in BINARY_CANDIDATES {
            let path = Path::new(candidate);
            if path.exists() && probe(path) {
                debug!("using tesseract at {}", path.display());
                return Ok(Self {
                    binary: path.to_path_buf(),
                });
            }
        }

        // Fall back to PATH resolution.
        let path = PathBuf::from("tesseract");
        if probe(&path) {
            debug!("using tesseract from $PATH");
            return Ok(Self { binary: path });
        }

        Err(ExtractError::EngineUnavailable(
            "no tesseract binary found".into(),
        ))
    }

    /// Use an explicit binary path (tests, exotic installs).
    pub fn with_binary(binary: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        let binary = binary.into();
        if probe(&binary) {
            Ok(Self { binary })
        } else {
            Err(ExtractError::EngineUnavailable(format!(
                "'{}' did not answer --version",
                binary.display()
            )))
        }
    }
}

/// True if `<binary> --version` runs successfully.
fn probe(binary: &Path) -> bool {
    Command::new(binary)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &GrayImage,
        config: &PassConfig,
    ) -> Result<Vec<Token>, EngineError> {
        // Tesseract wants a file path; hand it a scratch PNG that is removed
        // when `scratch` drops, even on the error paths.
        let scratch = tempfile::Builder::new()
            .prefix("img2txt-pass-")
            .suffix(".png")
            .tempfile()?;
        image.save(scratch.path())?;

        let output = Command::new(&self.binary)
            .arg(scratch.path())
            .arg("stdout")
            .args(["-l", &config.language_spec()])
            .args(["--psm", psm_flag(config.mode)])
            .args(["--oem", "1"])
            .arg("tsv")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::NotAvailable(format!(
                        "'{}' disappeared after startup",
                        self.binary.display()
                    ))
                } else {
                    EngineError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tokens = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(config = %config, tokens = tokens.len(), "pass complete");
        Ok(tokens)
    }
}

/// Map the layout mode onto Tesseract's `--psm` values.
fn psm_flag(mode: RecognitionMode) -> &'static str {
    match mode {
        RecognitionMode::SingleLine => "7",
        RecognitionMode::SparseBlock => "11",
        RecognitionMode::FullPage => "3",
    }
}

/// Parse Tesseract TSV output into word tokens.
///
/// Rows with `level != 5` are layout structure, not words; their `-1`
/// confidence would otherwise pollute aggregation. Word rows with a
/// negative confidence are kept as unscored tokens so diagnostics can
/// still see them.
pub(crate) fn parse_tsv(tsv: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }
        let confidence = cols[10]
            .parse::<f32>()
            .ok()
            .filter(|c| *c >= 0.0)
            .map(|c| c.min(100.0));
        tokens.push(Token::new(text, confidence));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word_row(conf: &str, text: &str) -> String {
        format!("5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t{conf}\t{text}")
    }

    #[test]
    fn parses_word_rows_with_confidence() {
        let tsv = format!("{HEADER}\n{}\n{}", word_row("96.5", "hello"), word_row("88", "world"));
        let tokens = parse_tsv(&tsv);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[0].confidence, Some(96.5));
        assert_eq!(tokens[1].confidence, Some(88.0));
    }

    #[test]
    fn sentinel_confidence_becomes_unscored() {
        let tsv = format!("{HEADER}\n{}", word_row("-1", "ghost"));
        let tokens = parse_tsv(&tsv);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].confidence, None);
    }

    #[test]
    fn layout_rows_are_skipped() {
        let tsv = format!(
            "{HEADER}\n1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t\n4\t1\t1\t1\t1\t0\t0\t0\t50\t10\t-1\t\n{}",
            word_row("75", "word")
        );
        let tokens = parse_tsv(&tsv);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "word");
    }

    #[test]
    fn empty_word_text_is_dropped() {
        let tsv = format!("{HEADER}\n{}", word_row("80", "   "));
        assert!(parse_tsv(&tsv).is_empty());
    }

    #[test]
    fn confidence_is_capped_at_100() {
        let tsv = format!("{HEADER}\n{}", word_row("101.2", "spiky"));
        let tokens = parse_tsv(&tsv);
        assert_eq!(tokens[0].confidence, Some(100.0));
    }

    #[test]
    fn psm_flags_cover_all_modes() {
        assert_eq!(psm_flag(RecognitionMode::SingleLine), "7");
        assert_eq!(psm_flag(RecognitionMode::SparseBlock), "11");
        assert_eq!(psm_flag(RecognitionMode::FullPage), "3");
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let tsv = format!("{HEADER}\nnot a tsv row at all\n5\t1\t1");
        assert!(parse_tsv(&tsv).is_empty());
    }
}
