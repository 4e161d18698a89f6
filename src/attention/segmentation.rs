//! Fixation and saccade segmentation
//!
//! Movement is the mean 3-D displacement of the left iris across the last
//! three buffered samples. Above the saccade threshold the latest sample is a
//! saccade; otherwise it extends the current fixation or opens a new one.

use crate::buffer::SampleBuffer;
use crate::types::{EyeSample, Fixation, Saccade};
use tracing::trace;

/// Samples inspected per segmentation step
const SEGMENT_SPAN: usize = 3;

/// Outcome of one segmentation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementEvent {
    Saccade(Saccade),
    FixationStarted { start_time: f64 },
    FixationExtended { duration: f64 },
}

#[derive(Debug, Clone)]
pub struct MovementSegmenter {
    saccade_threshold: f64,
    fixation_gap_ms: f64,
    fixations: SampleBuffer<Fixation>,
    saccades: SampleBuffer<Saccade>,
}

impl MovementSegmenter {
    pub fn new(
        saccade_threshold: f64,
        fixation_gap_ms: f64,
        max_fixations: usize,
        max_saccades: usize,
    ) -> Self {
        Self {
            saccade_threshold,
            fixation_gap_ms,
            fixations: SampleBuffer::new(max_fixations),
            saccades: SampleBuffer::new(max_saccades),
        }
    }

    /// Mean left-iris displacement over consecutive pairs of `samples`
    ///
    /// Pairs missing either iris are skipped; `None` when no pair remains.
    pub fn mean_movement<'a>(samples: impl IntoIterator<Item = &'a EyeSample>) -> Option<f64> {
        let irises: Vec<_> = samples.into_iter().map(|s| s.left_eye.iris).collect();
        let distances: Vec<f64> = irises
            .windows(2)
            .filter_map(|pair| match (pair[0], pair[1]) {
                (Some(a), Some(b)) => Some(a.distance(&b)),
                _ => None,
            })
            .collect();

        if distances.is_empty() {
            return None;
        }
        Some(distances.iter().sum::<f64>() / distances.len() as f64)
    }

    /// Segment the newest sample of `buffer`
    pub fn observe(&mut self, buffer: &SampleBuffer<EyeSample>) -> Option<MovementEvent> {
        if buffer.len() < SEGMENT_SPAN {
            return None;
        }
        let latest = buffer.latest()?;
        let movement = Self::mean_movement(buffer.last_n(SEGMENT_SPAN))?;
        if !movement.is_finite() {
            return None;
        }

        if movement > self.saccade_threshold {
            let saccade = Saccade {
                timestamp: latest.t,
                magnitude: movement,
            };
            self.saccades.push(saccade);
            trace!(t = latest.t, magnitude = movement, "saccade");
            return Some(MovementEvent::Saccade(saccade));
        }

        let iris = latest.left_eye.iris;
        if let Some(current) = self.fixations.latest_mut() {
            if latest.t - current.end_time < self.fixation_gap_ms {
                current.extend(latest.t, iris);
                return Some(MovementEvent::FixationExtended {
                    duration: current.duration,
                });
            }
        }

        let iris = iris?;
        self.fixations.push(Fixation::start(latest.t, iris));
        trace!(t = latest.t, "fixation started");
        Some(MovementEvent::FixationStarted {
            start_time: latest.t,
        })
    }

    pub fn fixations(&self) -> &SampleBuffer<Fixation> {
        &self.fixations
    }

    pub fn saccades(&self) -> &SampleBuffer<Saccade> {
        &self.saccades
    }

    pub fn reset(&mut self) {
        self.fixations.clear();
        self.saccades.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EyeState, Point3};

    fn sample_at(x: f64, t: f64) -> EyeSample {
        let eye = EyeState::open(Point3::ZERO, Point3::new(x, 0.0, 0.0));
        EyeSample::new(eye, eye, t)
    }

    fn feed(
        segmenter: &mut MovementSegmenter,
        buffer: &mut SampleBuffer<EyeSample>,
        sample: EyeSample,
    ) -> Option<MovementEvent> {
        buffer.push(sample);
        segmenter.observe(buffer)
    }

    fn segmenter() -> MovementSegmenter {
        MovementSegmenter::new(0.01, 100.0, 20, 20)
    }

    #[test]
    fn test_small_movement_creates_fixation() {
        let mut segmenter = segmenter();
        let mut buffer = SampleBuffer::new(300);

        feed(&mut segmenter, &mut buffer, sample_at(0.0, 0.0));
        feed(&mut segmenter, &mut buffer, sample_at(0.001, 33.0));
        let event = feed(&mut segmenter, &mut buffer, sample_at(0.002, 66.0));

        assert_eq!(event, Some(MovementEvent::FixationStarted { start_time: 66.0 }));
        assert_eq!(segmenter.fixations().len(), 1);
        assert!(segmenter.saccades().is_empty());

        let event = feed(&mut segmenter, &mut buffer, sample_at(0.002, 99.0));
        assert_eq!(event, Some(MovementEvent::FixationExtended { duration: 33.0 }));
        assert_eq!(segmenter.fixations().len(), 1);
        assert_eq!(segmenter.fixations().latest().unwrap().positions.len(), 2);
    }

    #[test]
    fn test_large_movement_records_saccade() {
        let mut segmenter = segmenter();
        let mut buffer = SampleBuffer::new(300);

        feed(&mut segmenter, &mut buffer, sample_at(0.0, 0.0));
        feed(&mut segmenter, &mut buffer, sample_at(0.5, 33.0));
        let event = feed(&mut segmenter, &mut buffer, sample_at(1.0, 66.0));

        match event {
            Some(MovementEvent::Saccade(saccade)) => {
                assert_eq!(saccade.timestamp, 66.0);
                assert!((saccade.magnitude - 0.5).abs() < 1e-12);
            }
            other => panic!("expected saccade, got {other:?}"),
        }
        assert!(segmenter.fixations().is_empty());
        assert_eq!(segmenter.saccades().len(), 1);
    }

    #[test]
    fn test_gap_opens_new_fixation() {
        let mut segmenter = segmenter();
        let mut buffer = SampleBuffer::new(300);
        for t in [0.0, 33.0, 66.0] {
            feed(&mut segmenter, &mut buffer, sample_at(0.0, t));
        }
        let event = feed(&mut segmenter, &mut buffer, sample_at(0.0, 500.0));
        assert_eq!(event, Some(MovementEvent::FixationStarted { start_time: 500.0 }));
        assert_eq!(segmenter.fixations().len(), 2);
    }

    #[test]
    fn test_needs_three_samples() {
        let mut segmenter = segmenter();
        let mut buffer = SampleBuffer::new(300);
        assert_eq!(feed(&mut segmenter, &mut buffer, sample_at(0.0, 0.0)), None);
        assert_eq!(feed(&mut segmenter, &mut buffer, sample_at(0.0, 33.0)), None);
    }

    #[test]
    fn test_missing_iris_never_yields_nan_or_fixation() {
        let mut segmenter = segmenter();
        let mut buffer = SampleBuffer::new(300);
        for t in [0.0, 33.0, 66.0] {
            assert_eq!(feed(&mut segmenter, &mut buffer, EyeSample::absent(t)), None);
        }
        assert!(segmenter.fixations().is_empty());

        // One valid pair is enough to measure movement, but no iris on the
        // newest sample means no fixation is opened
        let mut buffer = SampleBuffer::new(300);
        feed(&mut segmenter, &mut buffer, sample_at(0.0, 0.0));
        feed(&mut segmenter, &mut buffer, sample_at(0.0, 33.0));
        assert_eq!(feed(&mut segmenter, &mut buffer, EyeSample::absent(66.0)), None);
        assert!(segmenter.fixations().is_empty());
    }

    #[test]
    fn test_histories_are_bounded() {
        let mut segmenter = MovementSegmenter::new(0.01, 100.0, 3, 3);
        let mut buffer = SampleBuffer::new(300);
        for i in 0..20 {
            let x = if i % 2 == 0 { 0.0 } else { 1.0 };
            feed(&mut segmenter, &mut buffer, sample_at(x, i as f64 * 33.0));
        }
        assert_eq!(segmenter.saccades().len(), 3);
        assert_eq!(segmenter.saccades().latest().unwrap().timestamp, 19.0 * 33.0);
    }

    #[test]
    fn test_mean_movement_skips_incomplete_pairs() {
        let samples = [sample_at(0.0, 0.0), EyeSample::absent(33.0), sample_at(0.3, 66.0)];
        assert_eq!(MovementSegmenter::mean_movement(&samples), None);

        let samples = [sample_at(0.0, 0.0), sample_at(0.2, 33.0), EyeSample::absent(66.0)];
        let movement = MovementSegmenter::mean_movement(&samples).unwrap();
        assert!((movement - 0.2).abs() < 1e-12);
    }
}
