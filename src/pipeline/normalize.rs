//! Image normalisation: the ordered transform pipeline run before any
//! recognition attempt.
//!
//! ## Why an explicit stage list?
//!
//! Every stage is a pure `fn(&GrayImage) -> Result<GrayImage, StageError>`
//! and the pipeline is literally a slice of named stage functions. That
//! makes the load-bearing default order visible in one place, lets tests
//! exercise stages in isolation against golden fixtures, and lets callers
//! run a custom stage order through [`normalize_with`].
//!
//! ## Failure policy
//!
//! A stage that cannot do its job (no foreground to estimate skew from, a
//! degenerate image) returns `Err(StageError)` and the pipeline passes the
//! stage's **input** through unchanged — one weak stage must not abort the
//! whole extraction. The recovery rule is part of the contract, not an
//! accidental catch-all.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::{filter3x3, median_filter};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use thiserror::Error;
use tracing::warn;

/// A normalisation stage failed; the pipeline passes its input through.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("image has no pixels")]
    EmptyImage,

    #[error("not enough foreground pixels to estimate skew")]
    NoForeground,
}

/// A named normalisation stage.
pub type Stage = (&'static str, fn(&GrayImage) -> Result<GrayImage, StageError>);

/// The default stage order. Load-bearing: equalisation must precede skew
/// estimation (which needs contrast), binarisation must precede denoising
/// (which removes its speckle), and polarity must be settled before the
/// thresholder assumes dark-on-light input.
pub const DEFAULT_STAGES: &[Stage] = &[
    ("equalize", equalize_tiles),
    ("deskew", deskew),
    ("sharpen", sharpen),
    ("polarity", normalize_polarity),
    ("binarize", binarize),
    ("denoise", denoise),
];

/// Intensity below which a pixel counts as ink for skew estimation.
const INK_THRESHOLD: u8 = 128;

/// Mean intensity above which the image is considered light-on-dark inverted.
const BRIGHT_MEAN: f32 = 180.0;

/// Half-window (in pixels) for local-mean binarisation; 15 gives the 31 px
/// neighbourhood that suits typical text stroke widths at scan resolution.
const BINARIZE_RADIUS: u32 = 15;

/// Normalise an image with the default stage order.
///
/// Channel reduction (colour → single intensity channel) always runs first;
/// the remaining stages follow [`DEFAULT_STAGES`].
pub fn normalize(image: &DynamicImage) -> GrayImage {
    normalize_with(image, DEFAULT_STAGES)
}

/// Normalise an image with a caller-supplied stage order.
pub fn normalize_with(image: &DynamicImage, stages: &[Stage]) -> GrayImage {
    let mut current = image.to_luma8();
    for (name, stage) in stages {
        match stage(&current) {
            Ok(next) => current = next,
            Err(e) => warn!(stage = name, error = %e, "stage failed; passing input through"),
        }
    }
    current
}

// ── Stage: tile-wise histogram equalisation ──────────────────────────────

/// Tiles used per axis for local equalisation.
const EQUALIZE_GRID: u32 = 8;

/// Equalise contrast per tile to compensate uneven lighting.
///
/// Each tile gets its own cumulative-histogram mapping, so a shadowed corner
/// is stretched independently of a well-lit centre.
fn equalize_tiles(image: &GrayImage) -> Result<GrayImage, StageError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(StageError::EmptyImage);
    }

    let tile_w = width.div_ceil(EQUALIZE_GRID);
    let tile_h = height.div_ceil(EQUALIZE_GRID);
    let mut out = image.clone();

    for ty in 0..EQUALIZE_GRID {
        for tx in 0..EQUALIZE_GRID {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            if x0 >= width || y0 >= height {
                continue;
            }
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut histogram = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    histogram[image.get_pixel(x, y)[0] as usize] += 1;
                }
            }

            let total = ((x1 - x0) * (y1 - y0)) as f32;
            let mut lut = [0u8; 256];
            let mut cumulative = 0u32;
            for (value, count) in histogram.iter().enumerate() {
                cumulative += count;
                lut[value] = ((cumulative as f32 / total) * 255.0).round() as u8;
            }

            for y in y0..y1 {
                for x in x0..x1 {
                    let v = image.get_pixel(x, y)[0];
                    out.put_pixel(x, y, Luma([lut[v as usize]]));
                }
            }
        }
    }

    Ok(out)
}

// ── Stage: deskew ────────────────────────────────────────────────────────

/// Counter-rotate the dominant text-block angle.
///
/// The angle comes from the minimum-area rectangle over (subsampled) ink
/// pixel coordinates; the long edge of that rectangle follows the dominant
/// text direction. Estimation failure is an `Err`, which the pipeline turns
/// into pass-through.
fn deskew(image: &GrayImage) -> Result<GrayImage, StageError> {
    let angle = estimate_skew_degrees(image)?;
    if angle.abs() < 0.1 {
        return Ok(image.clone());
    }
    Ok(rotate_about_center(
        image,
        -angle.to_radians(),
        Interpolation::Bilinear,
        Luma([255u8]),
    ))
}

/// Estimate skew in degrees, normalised to `(-45, 45]`.
pub(crate) fn estimate_skew_degrees(image: &GrayImage) -> Result<f32, StageError> {
    let (width, height) = image.dimensions();
    let mut points: Vec<Point<i32>> = Vec::new();
    // Every second pixel is plenty for a rectangle fit and quarters the cost.
    for y in (0..height).step_by(2) {
        for x in (0..width).step_by(2) {
            if image.get_pixel(x, y)[0] < INK_THRESHOLD {
                points.push(Point::new(x as i32, y as i32));
            }
        }
    }
    if points.len() < 16 {
        return Err(StageError::NoForeground);
    }

    let rect = min_area_rect(&points);
    let edge_a = (
        (rect[1].x - rect[0].x) as f32,
        (rect[1].y - rect[0].y) as f32,
    );
    let edge_b = (
        (rect[2].x - rect[1].x) as f32,
        (rect[2].y - rect[1].y) as f32,
    );
    let (dx, dy) = if edge_a.0.hypot(edge_a.1) >= edge_b.0.hypot(edge_b.1) {
        edge_a
    } else {
        edge_b
    };

    let mut angle = dy.atan2(dx).to_degrees();
    while angle > 45.0 {
        angle -= 90.0;
    }
    while angle <= -45.0 {
        angle += 90.0;
    }
    Ok(angle)
}

// ── Stage: sharpen ───────────────────────────────────────────────────────

/// Centre-weighted edge-sharpening kernel.
const SHARPEN_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

fn sharpen(image: &GrayImage) -> Result<GrayImage, StageError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(StageError::EmptyImage);
    }
    Ok(filter3x3::<Luma<u8>, f32, u8>(image, &SHARPEN_KERNEL))
}

// ── Stage: polarity ──────────────────────────────────────────────────────

/// Invert light-on-dark images; the recogniser expects dark-on-light.
fn normalize_polarity(image: &GrayImage) -> Result<GrayImage, StageError> {
    let pixel_count = image.width() as u64 * image.height() as u64;
    if pixel_count == 0 {
        return Err(StageError::EmptyImage);
    }
    let sum: u64 = image.pixels().map(|p| p[0] as u64).sum();
    let mean = sum as f32 / pixel_count as f32;
    if mean <= BRIGHT_MEAN {
        return Ok(image.clone());
    }
    let mut inverted = image.clone();
    image::imageops::invert(&mut inverted);
    Ok(inverted)
}

// ── Stage: binarize ──────────────────────────────────────────────────────

/// Local-mean thresholding, inverted so text strokes land in the high class.
fn binarize(image: &GrayImage) -> Result<GrayImage, StageError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(StageError::EmptyImage);
    }
    let mut thresholded = adaptive_threshold(image, BINARIZE_RADIUS);
    image::imageops::invert(&mut thresholded);
    Ok(thresholded)
}

// ── Stage: denoise ───────────────────────────────────────────────────────

/// Median smoothing removes the isolated speckle binarisation leaves behind.
fn denoise(image: &GrayImage) -> Result<GrayImage, StageError> {
    if image.width() < 3 || image.height() < 3 {
        return Err(StageError::EmptyImage);
    }
    Ok(median_filter(image, 1, 1))
}

// ── Tests ────────────────────────────────────────────────────────────────
