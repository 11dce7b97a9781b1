//! Refinement blending: optional generative rewrite and re-scoring of the
//! chosen text.
//!
//! This stage is intentionally thin — prompt content lives in
//! [`crate::prompts`] so it can change without touching the transport or
//! error handling here.
//!
//! ## Failure policy
//!
//! The refinement service is an optional collaborator. Network errors,
//! non-2xx statuses, and malformed bodies all degrade to "refinement
//! unavailable": the pipeline keeps the pre-refinement text and score and
//! moves on. Nothing in this module can fail an extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RefinementConfig;
use crate::error::ExtractError;
use crate::prompts;

/// HTTP client for a `generateContent`-style refinement service.
pub struct RefineClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RefineClient {
    /// Build a client with the configured per-call timeout.
    pub fn new(config: &RefinementConfig) -> Result<Self, ExtractError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("refinement client: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Rewrite the text. Returns `Some(new_text)` only when the call
    /// succeeded and produced non-empty content different from the input;
    /// every other outcome is `None` (keep the original).
    pub async fn refine(&self, text: &str) -> Option<String> {
        let reply = match self.generate(&prompts::refine_prompt(text)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "refinement rewrite unavailable; keeping original text");
                return None;
            }
        };
        let reply = reply.trim();
        if reply.is_empty() || reply == text {
            debug!("refinement returned nothing new");
            return None;
        }
        Some(reply.to_string())
    }

    /// Ask for an independent 0–100 quality rating. `None` when the call
    /// fails or the reply does not contain a number.
    pub async fn rate(&self, text: &str) -> Option<f32> {
        let reply = match self.generate(&prompts::rate_prompt(text)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "refinement rating unavailable; keeping recognition score");
                return None;
            }
        };
        parse_rating(&reply)
    }

    /// One prompt → generated-text exchange.
    async fn generate(&self, prompt: &str) -> Result<String, RefineError> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefineError::Status(status.as_u16()));
        }

        let value: Value = response.json().await?;
        parse_generate_response(&value).ok_or(RefineError::MalformedBody)
    }
}

/// Pull the generated text out of a `generateContent` response body.
pub(crate) fn parse_generate_response(value: &Value) -> Option<String> {
    value["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
}

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(\.\d+)?").unwrap());

/// Extract the first number from a rating reply, clamped to `[0, 100]`.
///
/// Models asked for "a single number" still occasionally reply with prose
/// around it ("I'd say 85."), so we take the first numeric run.
pub(crate) fn parse_rating(reply: &str) -> Option<f32> {
    let m = RE_NUMBER.find(reply)?;
    let value: f32 = m.as_str().parse().ok()?;
    Some(value.clamp(0.0, 100.0))
}

/// Blend the recognition-derived score with an optional refinement rating.
///
/// The documented rule is the unweighted arithmetic mean. Whether a
/// length-aware weighting would track real accuracy better is an open
/// tunable; it is not changed silently here.
pub fn blend(recognition: f32, rating: Option<f32>) -> f32 {
    match rating {
        Some(r) => (recognition + r) / 2.0,
        None => recognition,
    }
}

#[derive(Debug, thiserror::Error)]
enum RefineError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {0}")]
    Status(u16),

    #[error("response body did not contain generated text")]
    MalformedBody,
}
