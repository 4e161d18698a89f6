//! Signal conditioning and pulse-peak detection
//!
//! Conditioning for the rPPG path:
//! - Green-channel extraction
//! - Zero-mean, unit-variance normalization
//! - Moving-average high-pass approximation of the 0.75-4 Hz band
//! - Peak detection with an amplitude floor and an exclusion window
//! - Peak spacing to beats per minute

use crate::types::ColorSample;

/// Extract the green channel series
///
/// Green carries the strongest blood-volume signal in skin reflectance and
/// is the least sensitive of the three channels to ambient light changes.
pub fn green_channel<'a>(samples: impl IntoIterator<Item = &'a ColorSample>) -> Vec<f64> {
    samples.into_iter().map(|s| s.g).collect()
}

/// Normalize to zero mean and unit variance (population formulas)
///
/// A zero-variance or non-finite series maps to all zeros.
pub fn normalize(signal: &[f64]) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }

    let n = signal.len() as f64;
    let mean = signal.iter().sum::<f64>() / n;
    let variance = signal.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if !std_dev.is_finite() || std_dev <= 0.0 || !mean.is_finite() {
        return vec![0.0; signal.len()];
    }

    signal.iter().map(|x| (x - mean) / std_dev).collect()
}

/// Half-width of the moving-average window for a given low cutoff
///
/// Formula: `round(fs / low_cutoff * 2)` samples on each side
pub fn highpass_half_width(sampling_frequency_hz: f64, low_cutoff_hz: f64) -> usize {
    if !(low_cutoff_hz > 0.0 && sampling_frequency_hz > 0.0) {
        return 0;
    }
    (sampling_frequency_hz / low_cutoff_hz * 2.0).round() as usize
}

/// Subtract a centred moving average from the signal
///
/// Removes slow drift (below the low cutoff) while keeping faster oscillation,
/// approximating a band-pass over the heart-rate band. The averaging window
/// is clipped at the signal edges.
pub fn moving_average_highpass(signal: &[f64], half_width: usize) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }

    // Prefix sums keep this linear in the signal length
    let mut prefix = Vec::with_capacity(signal.len() + 1);
    prefix.push(0.0);
    for value in signal {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + value);
    }

    let last_index = signal.len() - 1;
    signal
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let start = i.saturating_sub(half_width);
            let end = i.saturating_add(half_width).min(last_index);
            let count = (end - start + 1) as f64;
            let average = (prefix[end + 1] - prefix[start]) / count;
            value - average
        })
        .collect()
}

/// Find pulse peaks
///
/// A sample is a candidate when it is strictly greater than both neighbours
/// and above `amplitude_floor`. Candidates closer than `min_distance` samples
/// to the previously accepted peak replace it only when higher.
pub fn find_peaks(signal: &[f64], amplitude_floor: f64, min_distance: usize) -> Vec<usize> {
    let mut peaks: Vec<usize> = Vec::new();
    if signal.len() < 3 {
        return peaks;
    }

    for i in 1..signal.len() - 1 {
        let value = signal[i];
        if !(value > signal[i - 1] && value > signal[i + 1]) || value <= amplitude_floor {
            continue;
        }

        match peaks.last_mut() {
            Some(last) if i - *last < min_distance => {
                if value > signal[*last] {
                    *last = i;
                }
            }
            _ => peaks.push(i),
        }
    }

    peaks
}

/// Minimum peak spacing in samples: `floor(min_spacing_sec * fs)`
pub fn min_peak_distance(sampling_frequency_hz: f64, min_spacing_sec: f64) -> usize {
    (sampling_frequency_hz * min_spacing_sec).floor().max(0.0) as usize
}

/// Beats per minute from peak capture times (ms)
///
/// Formula: `60 / mean(inter-peak interval in seconds)`. Returns `None` with
/// fewer than two peaks or a non-positive mean interval.
pub fn bpm_from_peak_times(peak_times_ms: &[f64]) -> Option<f64> {
    if peak_times_ms.len() < 2 {
        return None;
    }

    let intervals: Vec<f64> = peak_times_ms
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / 1000.0)
        .collect();
    let mean_interval = intervals.iter().sum::<f64>() / intervals.len() as f64;

    if !mean_interval.is_finite() || mean_interval <= 0.0 {
        return None;
    }

    Some(60.0 / mean_interval)
}
