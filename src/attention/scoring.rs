//! Attention scoring
//!
//! Heuristic score on a 0-100 scale built from a base of 50 plus three
//! bonus terms (fixation count, fixation duration, saccade count) of up to
//! 25 each, minus a blink-rate penalty of up to 25.

use serde::{Deserialize, Serialize};

const BASE_SCORE: f64 = 50.0;
const TERM_WEIGHT: f64 = 25.0;

/// Windowed features feeding the score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttentionFeatures {
    pub fixation_count: usize,
    /// Mean fixation duration (ms)
    pub avg_fixation_duration: f64,
    pub saccade_count: usize,
    /// Blinks per minute
    pub blink_rate: f64,
}

/// Partial credit for a value outside its optimal band:
/// `25 * (1 - min(1, |target - value| / scale))`
fn partial_credit(value: f64, target: f64, scale: f64) -> f64 {
    TERM_WEIGHT * (1.0 - ((target - value).abs() / scale).min(1.0))
}

fn fixation_count_term(count: usize) -> f64 {
    match count {
        3..=5 => TERM_WEIGHT,
        0 => 0.0,
        n => partial_credit(n as f64, 4.0, 4.0),
    }
}

fn fixation_duration_term(avg_ms: f64) -> f64 {
    if (200.0..=400.0).contains(&avg_ms) {
        TERM_WEIGHT
    } else if avg_ms > 0.0 {
        partial_credit(avg_ms, 300.0, 300.0)
    } else {
        0.0
    }
}

fn saccade_count_term(count: usize) -> f64 {
    match count {
        2..=4 => TERM_WEIGHT,
        n => partial_credit(n as f64, 3.0, 3.0),
    }
}

/// Penalty (as a non-negative amount) for blinking too rarely or too often
fn blink_rate_penalty(rate: f64) -> f64 {
    if rate < 8.0 {
        TERM_WEIGHT * (1.0 - rate.max(0.0) / 8.0)
    } else if rate > 25.0 {
        TERM_WEIGHT * ((rate - 25.0) / 15.0).min(1.0)
    } else {
        0.0
    }
}

/// Raw attention score, clamped to [0, 100]
///
/// Non-finite features contribute nothing.
pub fn attention_score(features: &AttentionFeatures) -> f64 {
    let duration = if features.avg_fixation_duration.is_finite() {
        features.avg_fixation_duration
    } else {
        0.0
    };
    let blink_rate = if features.blink_rate.is_finite() {
        features.blink_rate
    } else {
        0.0
    };

    let score = BASE_SCORE
        + fixation_count_term(features.fixation_count)
        + fixation_duration_term(duration)
        + saccade_count_term(features.saccade_count)
        - blink_rate_penalty(blink_rate);

    score.clamp(0.0, 100.0)
}

/// Mean of the trailing `window` scores, rounded to an integer in [0, 100]
///
/// Returns `None` for an empty history.
pub fn smoothed_score<I>(scores: I, window: usize) -> Option<u8>
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: DoubleEndedIterator,
{
    let recent: Vec<f64> = scores.into_iter().rev().take(window.max(1)).collect();
    if recent.is_empty() {
        return None;
    }
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    Some(mean.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn features(
        fixations: usize,
        duration: f64,
        saccades: usize,
        blink_rate: f64,
    ) -> AttentionFeatures {
        AttentionFeatures {
            fixation_count: fixations,
            avg_fixation_duration: duration,
            saccade_count: saccades,
            blink_rate,
        }
    }

    #[test]
    fn test_optimal_features_saturate() {
        // 50 + 25 + 25 + 25 clamps at 100
        assert_eq!(attention_score(&features(4, 300.0, 3, 15.0)), 100.0);
    }

    #[test]
    fn test_empty_window_with_no_blinks() {
        // 50 + 0 + 0 + 0 - 25
        assert_eq!(attention_score(&features(0, 0.0, 0, 0.0)), 25.0);
    }

    #[test]
    fn test_partial_credit_terms() {
        // Two fixations: 25 * (1 - 2/4) = 12.5
        assert_eq!(fixation_count_term(2), 12.5);
        // 150ms average: 25 * (1 - 150/300) = 12.5
        assert_eq!(fixation_duration_term(150.0), 12.5);
        // One saccade: 25 * (1 - 2/3)
        assert!((saccade_count_term(1) - 25.0 / 3.0).abs() < 1e-12);
        assert_eq!(saccade_count_term(10), 0.0);
    }

    #[test]
    fn test_blink_penalty() {
        assert_eq!(blink_rate_penalty(0.0), 25.0);
        assert_eq!(blink_rate_penalty(4.0), 12.5);
        assert_eq!(blink_rate_penalty(15.0), 0.0);
        assert_eq!(blink_rate_penalty(32.5), 12.5);
        assert_eq!(blink_rate_penalty(100.0), 25.0);
    }

    #[test]
    fn test_smoothing_uses_last_entries() {
        let history = vec![0.0, 0.0, 50.0, 60.0, 70.0, 80.0, 90.0];
        assert_eq!(smoothed_score(history, 5), Some(70));
        assert_eq!(smoothed_score(vec![42.4], 5), Some(42));
        assert_eq!(smoothed_score(Vec::new(), 5), None);
    }

    proptest! {
        #[test]
        fn prop_score_is_bounded(
            fixations in 0usize..50,
            duration in -1.0e4f64..1.0e5,
            saccades in 0usize..50,
            blink_rate in -10.0f64..1.0e3,
        ) {
            let score = attention_score(&features(fixations, duration, saccades, blink_rate));
            prop_assert!((0.0..=100.0).contains(&score));
        }

        #[test]
        fn prop_smoothed_score_is_bounded(
            scores in prop::collection::vec(0.0f64..=100.0, 1..40),
            window in 1usize..10,
        ) {
            let smoothed = smoothed_score(scores, window).unwrap();
            prop_assert!(smoothed <= 100);
        }
    }
}
