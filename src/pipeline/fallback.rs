//! Fallback strategy: a last recognition attempt when every primary pass
//! falls below the quality floor.
//!
//! The primary normalisation is tuned for reasonably sized, reasonably lit
//! scans; small or faint captures can come out of adaptive binarisation as
//! confetti. The fallback trades subtlety for robustness: upscale 2×
//! (CatmullRom — sharper than bilinear without the ringing Lanczos puts on
//! text edges), reduce to grayscale, and apply a single global Otsu
//! threshold, then recognise once with a permissive configuration.

use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use tracing::{info, warn};

use crate::config::ExtractionConfig;
use crate::engine::RecognitionEngine;
use crate::error::FileError;
use crate::pipeline::recognize;

/// Confidence reported for a successful fallback extraction.
///
/// The fallback path exists because token confidences were already judged
/// unreliable for this image, so its result carries a fixed mid-scale score
/// rather than a re-aggregated one.
pub const FALLBACK_CONFIDENCE: f32 = 50.0;

/// Alternate normalisation + one permissive pass against the original image.
///
/// Returns the fallback text and [`FALLBACK_CONFIDENCE`]; empty fallback
/// output is the `NoTextExtracted` recoverable error.
pub async fn fallback(
    engine: &Arc<dyn RecognitionEngine>,
    original: &DynamicImage,
    config: &ExtractionConfig,
) -> Result<(String, f32), FileError> {
    info!("primary passes below quality floor; trying fallback");

    let binary = {
        let original = original.clone();
        tokio::task::spawn_blocking(move || fallback_normalize(&original))
            .await
            .map_err(|e| {
                warn!(error = %e, "fallback normalisation task panicked");
                FileError::NoTextExtracted
            })?
    };

    let pass = {
        let engine = Arc::clone(engine);
        let fallback_config = config.fallback_config.clone();
        let noise_floor = config.noise_floor;
        tokio::task::spawn_blocking(move || {
            recognize::run_pass(engine.as_ref(), &binary, fallback_config, noise_floor)
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "fallback recognition task panicked");
            FileError::NoTextExtracted
        })?
    };

    // The fallback is deliberately permissive: take everything the engine
    // saw, not just tokens that cleared the noise floor.
    let text = pass.raw_text.trim().to_string();
    if text.is_empty() {
        return Err(FileError::NoTextExtracted);
    }
    Ok((text, FALLBACK_CONFIDENCE))
}

/// The alternate normalisation: 2× upscale, grayscale, global Otsu binarise.
pub(crate) fn fallback_normalize(image: &DynamicImage) -> GrayImage {
    let (width, height) = (image.width().max(1), image.height().max(1));
    let upscaled = image.resize_exact(width * 2, height * 2, FilterType::CatmullRom);
    let gray = upscaled.to_luma8();
    let level = otsu_level(&gray);
    threshold(&gray, level, ThresholdType::Binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, PassConfig, Token};
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

    fn source_image() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 10, Luma([200])))
    }

    #[test]
    fn fallback_normalize_doubles_dimensions_and_binarizes() {
        let out = fallback_normalize(&source_image());
        assert_eq!(out.dimensions(), (40, 20));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[tokio::test]
    async fn nonempty_fallback_text_gets_the_fixed_score() {
        let engine: Arc<dyn RecognitionEngine> = Arc::new(FixedEngine {
            tokens: vec![Token::new("rescued", 30.0), Token::new("text", None)],
        });
        let config = ExtractionConfig::default();
        let (text, score) = fallback(&engine, &source_image(), &config).await.unwrap();
        // Permissive: unscored and low-confidence tokens are all kept.
        assert_eq!(text, "rescued text");
        assert_eq!(score, FALLBACK_CONFIDENCE);
    }

    #[tokio::test]
    async fn empty_fallback_is_no_text_extracted() {
        let engine: Arc<dyn RecognitionEngine> = Arc::new(FixedEngine { tokens: vec![] });
        let config = ExtractionConfig::default();
        let result = fallback(&engine, &source_image(), &config).await;
        assert!(matches!(result, Err(FileError::NoTextExtracted)));
    }
}
