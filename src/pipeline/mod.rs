//! Pipeline stages for image-to-text extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets us swap an
//! implementation (a different normalisation order, another engine backend)
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ recognize ──▶ aggregate ──▶ [fallback] ──▶ [refine] ──▶ cleanup
//! (matrix ops)  (engine ×N)   (best pass)   (below floor)  (optional)   (glyphs)
//! ```
//!
//! 1. [`normalize`]  — deterministic matrix transforms producing a
//!    recognition-ready image
//! 2. [`recognize`]  — one engine pass per candidate configuration,
//!    failures isolated per pass
//! 3. [`aggregate`]  — length-weighted confidence scoring and best-pass
//!    selection
//! 4. [`fallback`]   — alternate normalisation + one permissive pass when
//!    nothing clears the quality floor
//! 5. [`refine`]     — optional generative rewrite/re-score; the only stage
//!    with network I/O
//! 6. [`cleanup`]    — deterministic text fixes (whitespace, glyphs) before
//!    anything is reported

pub mod aggregate;
pub mod cleanup;
pub mod fallback;
pub mod normalize;
pub mod recognize;
pub mod refine;
