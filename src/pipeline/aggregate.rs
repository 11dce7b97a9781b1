//! Confidence aggregation: reduce token confidences to one score per pass
//! and pick the best pass.
//!
//! ## Why length-weighted?
//!
//! A plain mean lets many short high-confidence artefacts (punctuation,
//! stray strokes) outvote one long garbled word. Weighting each token by its
//! character count means a correctly recognised ten-letter word carries ten
//! times the weight of a stray comma, which tracks how much of the *text*
//! each token actually explains.

use crate::engine::Token;
use crate::pipeline::recognize::PassResult;

/// Aggregate a token set into `(text, score)`.
///
/// Tokens are included only when they carry a real confidence at or above
/// `noise_floor`; everything else stays out of both the text and the score.
/// The score is `Σ(confidence × len) / Σ(len)`, or 0 for an empty weight —
/// in which case the text is empty too.
pub fn aggregate(tokens: &[Token], noise_floor: f32) -> (String, f32) {
    let mut sum = 0.0f64;
    let mut weight = 0.0f64;
    let mut parts: Vec<&str> = Vec::new();

    for token in tokens {
        let Some(confidence) = token.confidence else {
            continue;
        };
        if confidence < noise_floor {
            continue;
        }
        let len = token.text.chars().count();
        if len == 0 {
            continue;
        }
        sum += confidence as f64 * len as f64;
        weight += len as f64;
        parts.push(&token.text);
    }

    if weight == 0.0 {
        (String::new(), 0.0)
    } else {
        (parts.join(" "), (sum / weight) as f32)
    }
}

/// Select the best pass: strictly greatest aggregate wins, ties keep the
/// earlier candidate so the configuration order stays deterministic.
pub fn select_best(passes: &[PassResult]) -> Option<&PassResult> {
    let mut best: Option<&PassResult> = None;
    for pass in passes {
        match best {
            Some(current) if pass.aggregate > current.aggregate => best = Some(pass),
            None => best = Some(pass),
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PassConfig, RecognitionMode};

    fn pass(aggregate: f32, text: &str) -> PassResult {
        PassResult {
            config: PassConfig::new(RecognitionMode::FullPage, &["eng"]),
            raw_text: text.to_string(),
            tokens: vec![],
            text: text.to_string(),
            aggregate,
        }
    }

    #[test]
    fn single_token_score_equals_its_confidence() {
        let tokens = [Token::new("quick", 90.0)];
        let (text, score) = aggregate(&tokens, 20.0);
        assert_eq!(text, "quick");
        assert_eq!(score, 90.0);
    }

    #[test]
    fn longer_tokens_carry_more_weight() {
        // "a" at 100 and "longword" at 50:
        // (100*1 + 50*8) / 9 = 55.55…, nowhere near the plain mean of 75.
        let tokens = [Token::new("a", 100.0), Token::new("longword", 50.0)];
        let (_, score) = aggregate(&tokens, 20.0);
        assert!((score - 500.0 / 9.0).abs() < 0.01, "got {score}");
    }

    #[test]
    fn empty_token_set_scores_zero_with_empty_text() {
        let (text, score) = aggregate(&[], 20.0);
        assert!(text.is_empty());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn all_noise_tokens_score_zero_with_empty_text() {
        let tokens = [
            Token::new("zz", 5.0),
            Token::new("q", 19.9),
            Token::new("xx", 12.0),
        ];
        let (text, score) = aggregate(&tokens, 20.0);
        assert!(text.is_empty());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn unscored_tokens_are_excluded() {
        let tokens = [Token::new("ghost", None), Token::new("real", 80.0)];
        let (text, score) = aggregate(&tokens, 20.0);
        assert_eq!(text, "real");
        assert_eq!(score, 80.0);
    }

    #[test]
    fn noise_floor_boundary_is_inclusive() {
        let tokens = [Token::new("edge", 20.0)];
        let (text, score) = aggregate(&tokens, 20.0);
        assert_eq!(text, "edge");
        assert_eq!(score, 20.0);
    }

    #[test]
    fn multi_byte_text_weighs_by_chars_not_bytes() {
        // "tiếng" is 5 chars but 7 bytes; equal-length ASCII must balance it.
        let tokens = [Token::new("tiếng", 40.0), Token::new("abcde", 80.0)];
        let (_, score) = aggregate(&tokens, 20.0);
        assert!((score - 60.0).abs() < 0.01, "got {score}");
    }

    #[test]
    fn best_pass_is_strictly_greatest() {
        let passes = [pass(40.0, "a"), pass(72.5, "b"), pass(60.0, "c")];
        assert_eq!(select_best(&passes).unwrap().text, "b");
    }

    #[test]
    fn ties_keep_the_earlier_candidate() {
        let passes = [pass(60.0, "first"), pass(60.0, "second")];
        assert_eq!(select_best(&passes).unwrap().text, "first");
    }

    #[test]
    fn no_passes_means_no_best() {
        assert!(select_best(&[]).is_none());
    }
}
