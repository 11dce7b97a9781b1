//! Configuration types for text extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::engine::{PassConfig, RecognitionMode};
use crate::error::ExtractError;

/// Configuration for an extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use img2txt::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .quality_floor(70.0)
///     .save_artifacts(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Candidate recognition configurations, tried in this order for every
    /// image. Order matters: ties in aggregate confidence keep the earlier
    /// candidate, so put the most trusted configuration first.
    pub candidates: Vec<PassConfig>,

    /// Permissive configuration used by the fallback attempt.
    pub fallback_config: PassConfig,

    /// Minimum aggregate confidence a primary pass must reach before the
    /// result is accepted without fallback. Range: 0–100. Default: 60.
    ///
    /// Below this floor the image is re-normalised more aggressively
    /// (upscaled, globally thresholded) and recognised once more. 60 is
    /// where Tesseract output stops being mostly usable on degraded scans.
    pub quality_floor: f32,

    /// Hard per-token noise floor. Default: 20.
    ///
    /// Tokens scored below this are artefacts of binarisation speckle far
    /// more often than real words; they are excluded from aggregation but
    /// kept in the pass result for diagnostics.
    pub noise_floor: f32,

    /// Optional refinement-service settings. `None` disables the refinement
    /// stage entirely.
    pub refinement: Option<RefinementConfig>,

    /// Write a sibling `<basename>_refined.txt` next to each input file.
    /// Default: false. A convenience, not required for correctness —
    /// a failed write is logged and the result still returned.
    pub save_artifacts: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            fallback_config: PassConfig::new(RecognitionMode::FullPage, &["eng"]),
            quality_floor: 60.0,
            noise_floor: 20.0,
            refinement: None,
            save_artifacts: false,
        }
    }
}

/// The default candidate list: mixed Vietnamese+English sparse text first,
/// then Vietnamese-only sparse, then an English full-page sweep.
fn default_candidates() -> Vec<PassConfig> {
    vec![
        PassConfig::new(RecognitionMode::SparseBlock, &["vie", "eng"]),
        PassConfig::new(RecognitionMode::SparseBlock, &["vie"]),
        PassConfig::new(RecognitionMode::FullPage, &["eng"]),
    ]
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Settings for the optional generative refinement stage.
#[derive(Debug, Clone)]
pub struct RefinementConfig {
    /// API credential for the refinement service.
    pub api_key: String,

    /// `generateContent`-style endpoint URL.
    pub endpoint: String,

    /// Per-call timeout in seconds. Default: 30.
    ///
    /// The refinement calls are the only network I/O in the pipeline; a slow
    /// or unreachable service must degrade to the pre-refinement result, not
    /// hang the batch.
    pub timeout_secs: u64,
}

impl RefinementConfig {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            timeout_secs: 30,
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Replace the candidate configuration list. Order is preserved.
    pub fn candidates(mut self, candidates: Vec<PassConfig>) -> Self {
        self.config.candidates = candidates;
        self
    }

    pub fn fallback_config(mut self, config: PassConfig) -> Self {
        self.config.fallback_config = config;
        self
    }

    pub fn quality_floor(mut self, floor: f32) -> Self {
        self.config.quality_floor = floor.clamp(0.0, 100.0);
        self
    }

    pub fn noise_floor(mut self, floor: f32) -> Self {
        self.config.noise_floor = floor.clamp(0.0, 100.0);
        self
    }

    pub fn refinement(mut self, refinement: RefinementConfig) -> Self {
        self.config.refinement = Some(refinement);
        self
    }

    pub fn refinement_timeout_secs(mut self, secs: u64) -> Self {
        if let Some(ref mut r) = self.config.refinement {
            r.timeout_secs = secs.max(1);
        }
        self
    }

    pub fn save_artifacts(mut self, v: bool) -> Self {
        self.config.save_artifacts = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.candidates.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "at least one candidate configuration is required".into(),
            ));
        }
        if let Some(bad) = c
            .candidates
            .iter()
            .chain(std::iter::once(&c.fallback_config))
            .find(|p| p.languages.is_empty())
        {
            return Err(ExtractError::InvalidConfig(format!(
                "configuration {bad} has an empty language set"
            )));
        }
        if let Some(ref r) = c.refinement {
            if r.api_key.is_empty() || r.endpoint.is_empty() {
                return Err(ExtractError::InvalidConfig(
                    "refinement requires both an API key and an endpoint".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
