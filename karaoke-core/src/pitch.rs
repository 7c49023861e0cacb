//! # Pitch Detection Module
//!
//! Time-domain autocorrelation pitch detection tuned for the singing voice.
//! Two correlation strategies are provided behind a single entry point: a
//! dot-product autocorrelation that picks the global best lag, and a
//! normalized-difference correlation that commits to the first lag whose
//! correlation starts falling after crossing a quality threshold. The two
//! disagree on ambiguous input; [`Strategy::NormalizedDifference`] is the
//! engine default.
//!
//! ## Features
//! - RMS silence gate, so quiet frames report "no pitch" instead of noise
//! - Lag search bounded to the supported vocal band (80-1000 Hz)
//! - Defensive clamping for short frames
//! - Pure functions of the input frame, no side effects

/// Lowest fundamental the lag search will consider, in Hz.
pub const MIN_FREQUENCY_HZ: f32 = 80.0;

/// Highest fundamental the lag search will consider, in Hz.
pub const MAX_FREQUENCY_HZ: f32 = 1000.0;

/// Frames with RMS energy below this are treated as silence.
/// Empirical value for a [-1, 1]-normalized signal.
pub const SILENCE_RMS_THRESHOLD: f32 = 0.01;

/// Minimum normalized-difference correlation before a lag is trusted.
const DIFFERENCE_CORRELATION_THRESHOLD: f32 = 0.9;

/// A fundamental-frequency estimate for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// The detected frequency in Hz.
    pub frequency_hz: f32,
    /// How much the frame resembled itself at the detected lag (0.0 to 1.0).
    pub confidence: f32,
}

/// Lag-scoring strategy for [`detect_pitch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Sum of `x[i] * x[i + lag]`; the lag with the globally largest positive
    /// correlation wins.
    DotProduct,
    /// `1 - mean(|x[i] - x[i + lag]|)`; the search returns as soon as the
    /// correlation starts decreasing after exceeding the 0.9 threshold,
    /// rather than scanning for a global maximum.
    #[default]
    NormalizedDifference,
}

/// Root-mean-square energy of a frame. Zero for an empty frame.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|&s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Estimates the fundamental frequency of one frame of time-domain samples.
///
/// Returns `None` when the frame is too quiet to trust (RMS below
/// [`SILENCE_RMS_THRESHOLD`]) or when no lag in the vocal band qualifies.
/// The lag window covers 80-1000 Hz and is clamped to half the frame length,
/// so frames of any size are accepted without panicking.
///
/// Callers are responsible for discarding results outside their own accepted
/// band; the estimator itself is only bound by its search range.
///
/// # Arguments
/// * `samples` - One frame of time-domain audio, nominally in [-1, 1]
/// * `sample_rate` - Capture rate in Hz
/// * `strategy` - Lag-scoring strategy, see [`Strategy`]
pub fn detect_pitch(samples: &[f32], sample_rate: u32, strategy: Strategy) -> Option<PitchEstimate> {
    if samples.is_empty() || sample_rate == 0 {
        return None;
    }

    // --- Noise gate ---
    if rms(samples) < SILENCE_RMS_THRESHOLD {
        return None;
    }

    // --- Lag window for the supported vocal band, clamped to the frame ---
    let min_lag = ((sample_rate as f32 / MAX_FREQUENCY_HZ) as usize).max(1);
    let max_lag = ((sample_rate as f32 / MIN_FREQUENCY_HZ) as usize).min(samples.len() / 2);
    if min_lag >= max_lag {
        return None;
    }

    match strategy {
        Strategy::DotProduct => detect_dot_product(samples, sample_rate, min_lag, max_lag),
        Strategy::NormalizedDifference => {
            detect_normalized_difference(samples, sample_rate, min_lag, max_lag)
        }
    }
}

/// Dot-product autocorrelation with global peak-picking.
fn detect_dot_product(
    samples: &[f32],
    sample_rate: u32,
    min_lag: usize,
    max_lag: usize,
) -> Option<PitchEstimate> {
    let mut best_lag = None;
    let mut best_correlation = 0.0f32;

    for lag in min_lag..=max_lag {
        let mut correlation = 0.0f32;
        for i in 0..samples.len() - lag {
            correlation += samples[i] * samples[i + lag];
        }
        if correlation > best_correlation {
            best_correlation = correlation;
            best_lag = Some(lag);
        }
    }

    let lag = best_lag?;

    // Normalize by the frame energy so confidence lands in [0, 1].
    let energy: f32 = samples.iter().map(|&s| s * s).sum();
    let confidence = if energy > 0.0 {
        (best_correlation / energy).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(PitchEstimate {
        frequency_hz: sample_rate as f32 / lag as f32,
        confidence,
    })
}

/// Normalized mean-absolute-difference correlation with first-descent
/// boundary detection.
///
/// The lag is recorded while the correlation is rising above the threshold;
/// the search commits as soon as the correlation falls again. This returns
/// the first qualifying periodicity rather than the strongest one, which is
/// what keeps the detector on the fundamental instead of a louder harmonic.
fn detect_normalized_difference(
    samples: &[f32],
    sample_rate: u32,
    min_lag: usize,
    max_lag: usize,
) -> Option<PitchEstimate> {
    let window = samples.len() / 2;
    let mut best_lag = None;
    let mut best_correlation = 0.0f32;
    let mut last_correlation = 1.0f32;

    for lag in min_lag..=max_lag {
        let mut difference = 0.0f32;
        for i in 0..window {
            difference += (samples[i] - samples[i + lag]).abs();
        }
        let correlation = 1.0 - difference / window as f32;

        if correlation > DIFFERENCE_CORRELATION_THRESHOLD && correlation > last_correlation {
            best_correlation = correlation;
            best_lag = Some(lag);
        } else if best_correlation > DIFFERENCE_CORRELATION_THRESHOLD
            && correlation < last_correlation
        {
            // Past the peak: commit to the lag found on the way up.
            break;
        }
        last_correlation = correlation;
    }

    let lag = best_lag?;

    Some(PitchEstimate {
        frequency_hz: sample_rate as f32 / lag as f32,
        confidence: best_correlation.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    fn sine(frequency: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * frequency * i as f32 / SAMPLE_RATE as f32).sin()
            })
            .collect()
    }

    fn assert_close(detected: f32, expected: f32) {
        let relative = (detected - expected).abs() / expected;
        assert!(
            relative < 0.02,
            "detected {detected} Hz, expected {expected} Hz ({:.1}% off)",
            relative * 100.0
        );
    }

    #[test]
    fn silence_yields_no_pitch() {
        let frame = vec![0.0f32; 2048];
        assert!(detect_pitch(&frame, SAMPLE_RATE, Strategy::DotProduct).is_none());
        assert!(detect_pitch(&frame, SAMPLE_RATE, Strategy::NormalizedDifference).is_none());
    }

    #[test]
    fn sub_threshold_noise_yields_no_pitch() {
        let frame = sine(440.0, 0.005, 2048);
        assert!(detect_pitch(&frame, SAMPLE_RATE, Strategy::NormalizedDifference).is_none());
    }

    #[test]
    fn sine_440_dot_product() {
        let frame = sine(440.0, 0.5, 2048);
        let estimate = detect_pitch(&frame, SAMPLE_RATE, Strategy::DotProduct).unwrap();
        assert_close(estimate.frequency_hz, 440.0);
        assert!(estimate.confidence > 0.5);
    }

    #[test]
    fn sine_440_normalized_difference() {
        let frame = sine(440.0, 0.5, 2048);
        let estimate = detect_pitch(&frame, SAMPLE_RATE, Strategy::NormalizedDifference).unwrap();
        assert_close(estimate.frequency_hz, 440.0);
        assert!(estimate.confidence > DIFFERENCE_CORRELATION_THRESHOLD);
    }

    #[test]
    fn sine_low_and_high_band_edges() {
        for frequency in [100.0, 220.0, 660.0, 880.0] {
            let frame = sine(frequency, 0.5, 4096);
            let estimate = detect_pitch(&frame, SAMPLE_RATE, Strategy::DotProduct).unwrap();
            assert_close(estimate.frequency_hz, frequency);
        }
    }

    #[test]
    fn short_frame_does_not_panic() {
        let frame = sine(440.0, 0.5, 64);
        // 64 samples cannot hold a full 80 Hz period; the clamped search
        // window is empty and the detector reports no pitch.
        assert!(detect_pitch(&frame, SAMPLE_RATE, Strategy::NormalizedDifference).is_none());
    }

    #[test]
    fn empty_frame_does_not_panic() {
        assert!(detect_pitch(&[], SAMPLE_RATE, Strategy::DotProduct).is_none());
    }

    #[test]
    fn rms_of_known_signal() {
        let frame = vec![0.5f32; 1024];
        assert!((rms(&frame) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }
}
