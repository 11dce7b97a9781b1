//! Recognition passes: one engine invocation per candidate configuration.
//!
//! The candidate passes are logically independent — they share only the
//! read-only normalised image — so they are fanned out on the blocking
//! thread pool and collected together. A failed configuration is scored
//! zero and logged; it never takes the other configurations down with it.

use std::sync::Arc;

use futures::future::join_all;
use image::GrayImage;
use tracing::warn;

use crate::engine::{PassConfig, RecognitionEngine, Token};
use crate::pipeline::aggregate;

/// The outcome of one recognition pass.
#[derive(Debug, Clone)]
pub struct PassResult {
    /// The configuration that produced this pass.
    pub config: PassConfig,
    /// Everything the engine emitted, unfiltered — diagnostics only, never
    /// reported downstream without cleaning.
    pub raw_text: String,
    /// Token-level output including unscored and sub-floor tokens.
    pub tokens: Vec<Token>,
    /// Text assembled from the tokens that passed the noise floor.
    pub text: String,
    /// Length-weighted mean confidence of the included tokens.
    pub aggregate: f32,
}

impl PassResult {
    /// A zero-scored result for a configuration whose engine call failed.
    fn failed(config: PassConfig) -> Self {
        Self {
            config,
            raw_text: String::new(),
            tokens: Vec::new(),
            text: String::new(),
            aggregate: 0.0,
        }
    }
}

/// Run one pass synchronously. Engine errors are absorbed into a
/// zero-scored result here, at the narrowest possible scope.
pub fn run_pass(
    engine: &dyn RecognitionEngine,
    image: &GrayImage,
    config: PassConfig,
    noise_floor: f32,
) -> PassResult {
    match engine.recognize(image, &config) {
        Ok(tokens) => {
            let (text, aggregate) = aggregate::aggregate(&tokens, noise_floor);
            let raw_text = tokens
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            PassResult {
                config,
                raw_text,
                tokens,
                text,
                aggregate,
            }
        }
        Err(e) => {
            warn!(config = %config, error = %e, "recognition pass failed; scoring zero");
            PassResult::failed(config)
        }
    }
}

/// Run every candidate configuration against the normalised image,
/// concurrently, returning results in candidate order.
pub async fn run_passes(
    engine: &Arc<dyn RecognitionEngine>,
    image: &GrayImage,
    candidates: &[PassConfig],
    noise_floor: f32,
) -> Vec<PassResult> {
    let tasks = candidates.iter().cloned().map(|config| {
        let engine = Arc::clone(engine);
        let image = image.clone();
        tokio::task::spawn_blocking(move || run_pass(engine.as_ref(), &image, config, noise_floor))
    });

    join_all(tasks)
        .await
        .into_iter()
        .zip(candidates.iter())
        .map(|(joined, config)| {
            joined.unwrap_or_else(|e| {
                warn!(config = %config, error = %e, "pass task panicked; scoring zero");
                PassResult::failed(config.clone())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, RecognitionMode};
    use image::Luma;

    struct FixedEngine {
        tokens: Vec<Token>,
    }

    impl RecognitionEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn recognize(
            &self,
            _image: &GrayImage,
            _config: &PassConfig,
        ) -> Result<Vec<Token>, EngineError> {
            Ok(self.tokens.clone())
        }
    }

    struct BrokenEngine;

    impl RecognitionEngine for BrokenEngine {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn recognize(
            &self,
            _image: &GrayImage,
            _config: &PassConfig,
        ) -> Result<Vec<Token>, EngineError> {
            Err(EngineError::Failed("scripted failure".into()))
        }
    }

    fn blank() -> GrayImage {
        GrayImage::from_pixel(8, 8, Luma([255]))
    }

    fn cfg() -> PassConfig {
        PassConfig::new(RecognitionMode::FullPage, &["eng"])
    }

    #[test]
    fn pass_keeps_noise_tokens_for_diagnostics_but_not_for_text() {
        let engine = FixedEngine {
            tokens: vec![Token::new("real", 85.0), Token::new("x", 5.0)],
        };
        let result = run_pass(&engine, &blank(), cfg(), 20.0);
        assert_eq!(result.tokens.len(), 2, "diagnostic tokens retained");
        assert_eq!(result.text, "real");
        assert_eq!(result.raw_text, "real x");
        assert_eq!(result.aggregate, 85.0);
    }

    #[test]
    fn failed_engine_scores_zero_without_propagating() {
        let result = run_pass(&BrokenEngine, &blank(), cfg(), 20.0);
        assert_eq!(result.aggregate, 0.0);
        assert!(result.text.is_empty());
        assert!(result.tokens.is_empty());
    }

    #[tokio::test]
    async fn passes_come_back_in_candidate_order() {
        let engine: Arc<dyn RecognitionEngine> = Arc::new(FixedEngine {
            tokens: vec![Token::new("word", 70.0)],
        });
        let candidates = vec![
            PassConfig::new(RecognitionMode::SparseBlock, &["vie", "eng"]),
            PassConfig::new(RecognitionMode::FullPage, &["eng"]),
        ];
        let results = run_passes(&engine, &blank(), &candidates, 20.0).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].config, candidates[0]);
        assert_eq!(results[1].config, candidates[1]);
    }

    #[tokio::test]
    async fn one_broken_pass_does_not_block_the_others() {
        // A broken engine still yields one zero-scored result per candidate.
        let engine: Arc<dyn RecognitionEngine> = Arc::new(BrokenEngine);
        let candidates = vec![cfg(), cfg(), cfg()];
        let results = run_passes(&engine, &blank(), &candidates, 20.0).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.aggregate == 0.0));
    }
}
