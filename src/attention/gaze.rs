//! Gaze direction
//!
//! Weak heuristic: the mean eye-center → iris-center offset of both eyes,
//! normalized to a unit vector.

use crate::types::{EyeSample, EyeState, Vector3};

fn iris_offset(eye: &EyeState) -> Option<Vector3> {
    match (eye.center, eye.iris) {
        (Some(center), Some(iris)) => Some(iris.sub(&center)),
        _ => None,
    }
}

/// Gaze direction for one sample
///
/// Uses the landmark offsets when both eyes expose center and iris, else the
/// producer-supplied direction. A zero-length offset yields the zero vector.
/// `None` when neither is available.
pub fn estimate_gaze(sample: &EyeSample) -> Option<Vector3> {
    let from_landmarks = iris_offset(&sample.left_eye)
        .zip(iris_offset(&sample.right_eye))
        .map(|(left, right)| left.add(&right).scale(0.5));

    from_landmarks
        .or(sample.gaze_direction)
        .map(|direction| direction.normalized())
}
