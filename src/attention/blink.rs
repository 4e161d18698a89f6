//! Blink counting
//!
//! A blink is counted when the mean openness of both eyes drops below the
//! threshold and the previous counted blink is older than the refractory
//! window, so one long closure never counts twice.

use crate::types::{BlinkState, EyeSample};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct BlinkDetector {
    threshold: f64,
    refractory_ms: f64,
    state: BlinkState,
}

impl BlinkDetector {
    pub fn new(threshold: f64, refractory_ms: f64) -> Self {
        Self {
            threshold,
            refractory_ms,
            state: BlinkState::default(),
        }
    }

    /// Feed one sample; returns true when a new blink was counted
    ///
    /// Samples without a face are skipped. A located eye without an
    /// openness value reads as closed.
    pub fn observe(&mut self, sample: &EyeSample) -> bool {
        if !sample.has_face() {
            return false;
        }

        let openness = sample.average_openness();
        if !openness.is_finite() || openness >= self.threshold {
            return false;
        }

        let clear_of_refractory = self.state.blink_count == 0
            || sample.t - self.state.last_blink_time > self.refractory_ms;
        if !clear_of_refractory {
            return false;
        }

        self.state.blink_count += 1;
        self.state.last_blink_time = sample.t;
        trace!(t = sample.t, count = self.state.blink_count, "blink");
        true
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    pub fn blink_count(&self) -> u32 {
        self.state.blink_count
    }

    pub fn reset(&mut self) {
        self.state = BlinkState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EyeState, Point3};

    fn sample(openness: f64, t: f64) -> EyeSample {
        let eye = EyeState {
            openness,
            ..EyeState::open(Point3::ZERO, Point3::ZERO)
        };
        EyeSample::new(eye, eye, t)
    }

    fn detector() -> BlinkDetector {
        BlinkDetector::new(0.2, 500.0)
    }

    #[test]
    fn test_dips_inside_refractory_count_once() {
        let mut blinks = detector();
        assert!(blinks.observe(&sample(0.1, 1000.0)));
        assert!(!blinks.observe(&sample(0.1, 1300.0)));
        assert_eq!(blinks.blink_count(), 1);
    }

    #[test]
    fn test_dips_outside_refractory_count_twice() {
        let mut blinks = detector();
        blinks.observe(&sample(0.1, 1000.0));
        blinks.observe(&sample(1.0, 1200.0));
        blinks.observe(&sample(0.1, 1600.0));
        assert_eq!(blinks.blink_count(), 2);
        assert_eq!(blinks.state().last_blink_time, 1600.0);
    }

    #[test]
    fn test_prolonged_closure_counts_once() {
        let mut blinks = detector();
        for i in 0..15 {
            blinks.observe(&sample(0.0, i as f64 * 33.0));
        }
        assert_eq!(blinks.blink_count(), 1);
    }

    #[test]
    fn test_open_eyes_never_blink() {
        let mut blinks = detector();
        blinks.observe(&sample(0.2, 0.0));
        blinks.observe(&sample(0.9, 1000.0));
        assert_eq!(blinks.blink_count(), 0);
    }

    #[test]
    fn test_missing_face_is_skipped() {
        let mut blinks = detector();
        assert!(!blinks.observe(&EyeSample::absent(1000.0)));
        assert_eq!(blinks.blink_count(), 0);
    }

    #[test]
    fn test_reset() {
        let mut blinks = detector();
        blinks.observe(&sample(0.1, 1000.0));
        blinks.reset();
        assert_eq!(blinks.state(), BlinkState::default());
    }
}
