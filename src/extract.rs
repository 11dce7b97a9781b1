//! Orchestration: run one image through the full pipeline, and batches of
//! images through it in order.
//!
//! ## Error posture
//!
//! [`extract`] never returns `Err`. Anything that goes wrong with a single
//! file — missing path, undecodable bytes, nothing recognised — lands in the
//! returned [`FileResult`] with a human-readable `error` and confidence 0,
//! so a batch always produces exactly one entry per input, in input order.
//! The only fatal condition in the system is an absent recognition engine,
//! and that is rejected at engine construction, before any file is touched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::engine::RecognitionEngine;
use crate::error::FileError;
use crate::output::FileResult;
use crate::pipeline::{aggregate, cleanup, fallback, normalize, recognize, refine};

/// Shared cancellation flag for batch runs.
///
/// Setting it aborts the files that have not started yet; completed results
/// are unaffected and cancelled entries carry an error like any other
/// per-file failure.
pub type CancelFlag = Arc<AtomicBool>;

/// Extract text from one image file.
///
/// This is the primary entry point for the library. The engine handle is
/// constructed once at process start (see
/// [`TesseractEngine::locate`](crate::engine::TesseractEngine::locate)) and
/// shared across calls.
pub async fn extract(
    input: impl AsRef<Path>,
    engine: &Arc<dyn RecognitionEngine>,
    config: &ExtractionConfig,
) -> FileResult {
    let start = Instant::now();
    let path = input.as_ref();
    info!("extracting: {}", path.display());

    // ── Step 1: Load image ───────────────────────────────────────────────
    let image = match load_image(path) {
        Ok(image) => image,
        Err(e) => return FileResult::from_error(&e, elapsed_ms(start)),
    };

    // ── Step 2: Normalise ────────────────────────────────────────────────
    let normalized = {
        let image = image.clone();
        match tokio::task::spawn_blocking(move || normalize::normalize(&image)).await {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(error = %e, "normalisation task panicked");
                return FileResult::from_error(&FileError::NoTextExtracted, elapsed_ms(start));
            }
        }
    };

    // ── Step 3: Recognition passes ───────────────────────────────────────
    debug!(
        engine = engine.name(),
        candidates = config.candidates.len(),
        "running recognition passes"
    );
    let passes =
        recognize::run_passes(engine, &normalized, &config.candidates, config.noise_floor).await;

    // ── Step 4: Pick the best pass ───────────────────────────────────────
    let best = aggregate::select_best(&passes);
    let (mut text, mut confidence) = match best {
        Some(pass) => {
            debug!(config = %pass.config, aggregate = pass.aggregate, "best primary pass");
            (pass.text.clone(), pass.aggregate)
        }
        None => (String::new(), 0.0),
    };

    // ── Step 5: Fallback below the quality floor ─────────────────────────
    let mut used_fallback = false;
    if confidence < config.quality_floor {
        match fallback::fallback(engine, &image, config).await {
            Ok((fb_text, fb_score)) => {
                text = fb_text;
                confidence = fb_score;
                used_fallback = true;
            }
            Err(e) => return FileResult::from_error(&e, elapsed_ms(start)),
        }
    }

    // ── Step 6: Optional refinement blending ─────────────────────────────
    let mut used_refinement = false;
    if let Some(ref refinement) = config.refinement {
        match refine::RefineClient::new(refinement) {
            Ok(client) => {
                if let Some(rewritten) = client.refine(&text).await {
                    text = rewritten;
                    used_refinement = true;
                }
                confidence = refine::blend(confidence, client.rate(&text).await);
            }
            Err(e) => warn!(error = %e, "refinement client unavailable"),
        }
    }

    // ── Step 7: Clean and report ─────────────────────────────────────────
    let text = cleanup::clean_text(&text);

    if config.save_artifacts {
        write_artifact(path, &text).await;
    }

    let duration_ms = elapsed_ms(start);
    info!(
        confidence,
        used_fallback, used_refinement, duration_ms, "extraction complete"
    );

    FileResult {
        text,
        confidence: confidence.clamp(0.0, 100.0),
        used_fallback,
        used_refinement,
        duration_ms,
        error: None,
    }
}

/// Extract a list of files, preserving input order in the output.
///
/// Files are independent; a failure in one never aborts the rest. When
/// `cancel` is set mid-run, the remaining files are skipped with a
/// cancellation error while already-completed results stay intact.
pub async fn extract_batch(
    paths: &[PathBuf],
    engine: &Arc<dyn RecognitionEngine>,
    config: &ExtractionConfig,
    cancel: Option<&CancelFlag>,
) -> Vec<FileResult> {
    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            results.push(FileResult::from_error(&FileError::Cancelled, 0));
            continue;
        }
        results.push(extract(path, engine, config).await);
    }
    results
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Load and decode the input image.
fn load_image(path: &Path) -> Result<DynamicImage, FileError> {
    if !path.exists() {
        return Err(FileError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    image::open(path).map_err(|e| FileError::ImageDecodeError {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Deterministic sibling artifact path: `<dir>/<basename>_refined.txt`.
pub(crate) fn artifact_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_refined.txt"))
}

/// Best-effort artifact write; failures are logged, never fatal.
async fn write_artifact(input: &Path, text: &str) {
    let path = artifact_path(input);
    match tokio::fs::write(&path, text).await {
        Ok(()) => debug!("wrote artifact: {}", path.display()),
        Err(e) => warn!(error = %e, "failed to write artifact {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_path_is_a_sibling_with_suffix() {
        let p = artifact_path(Path::new("/data/scans/receipt.png"));
        assert_eq!(p, Path::new("/data/scans/receipt_refined.txt"));
    }

    #[test]
    fn artifact_path_survives_extensionless_input() {
        let p = artifact_path(Path::new("scan"));
        assert_eq!(p, Path::new("scan_refined.txt"));
    }

    #[test]
    fn load_image_reports_missing_path() {
        let err = load_image(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, FileError::InputNotFound { .. }));
    }

    #[test]
    fn load_image_reports_undecodable_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"this is not a png").unwrap();
        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, FileError::ImageDecodeError { .. }));
    }
}
