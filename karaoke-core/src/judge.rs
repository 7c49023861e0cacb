//! # Accuracy Judgement Module
//!
//! Compares a detected pitch against the due target and classifies the match
//! two ways: a continuous accuracy percentage from cents deviation, and a
//! discrete quality tier from pitch-class distance on the chromatic circle.
//! The two are deliberately separate signals; the tier drives coarse visual
//! feedback while the percentage feeds the session scorer.

use crate::note;
use serde::Serialize;

/// Deviation at or beyond which accuracy bottoms out at zero.
pub const MAX_DEVIATION_CENTS: i32 = 50;

/// Default tolerance for the on-target check.
pub const DEFAULT_TOLERANCE_CENTS: i32 = 25;

/// Discrete quality tier. Ordered worst to best so that `max` picks the
/// better of two tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Miss,
    Close,
    Good,
}

/// One time-aligned comparison of sung pitch against target pitch. The
/// single record type shared by the live-feedback and session-scoring
/// consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Judgement {
    pub time: f32,
    pub target_hz: f32,
    pub actual_hz: f32,
    /// 0 to 100, from cents deviation.
    pub accuracy: u8,
    pub tier: Tier,
}

/// Accuracy percentage from the cents deviation between the sung and target
/// pitches.
///
/// Each frequency contributes its own offset from its nearest semitone, so
/// singing the right note in a different octave still scores full accuracy.
/// Deviation of [`MAX_DEVIATION_CENTS`] or more scores zero; zero deviation
/// scores 100.
pub fn accuracy(actual_hz: f32, target_hz: f32) -> u8 {
    let deviation = (note::cents_offset(actual_hz) - note::cents_offset(target_hz)).abs();
    if deviation >= MAX_DEVIATION_CENTS {
        return 0;
    }
    ((1.0 - deviation as f32 / MAX_DEVIATION_CENTS as f32) * 100.0).round() as u8
}

/// Quality tier from pitch-class distance on the chromatic circle.
///
/// Same semitone class is a hit, one semitone either direction (distance 1
/// or 11, since the circle wraps at 12) is close, anything else is a miss.
/// A pitch outside the nameable band is a miss.
pub fn tier(actual_hz: f32, target_hz: f32) -> Tier {
    let (Some(actual), Some(target)) = (note::pitch_class(actual_hz), note::pitch_class(target_hz))
    else {
        return Tier::Miss;
    };
    let distance = (actual - target).abs();
    if distance == 0 {
        Tier::Good
    } else if distance == 1 || distance == 11 {
        Tier::Close
    } else {
        Tier::Miss
    }
}

/// Builds the full judgement record for one comparison.
pub fn judge(time: f32, target_hz: f32, actual_hz: f32) -> Judgement {
    Judgement {
        time,
        target_hz,
        actual_hz,
        accuracy: accuracy(actual_hz, target_hz),
        tier: tier(actual_hz, target_hz),
    }
}

/// Keeps the better of a stored tier and a new candidate. A recorded tier
/// only ever improves while its target is due.
pub fn upgrade(current: Option<Tier>, candidate: Tier) -> Tier {
    match current {
        Some(existing) => existing.max(candidate),
        None => candidate,
    }
}

/// Whether a sung pitch is within tolerance of the target, in cents.
pub fn pitch_on_target(actual_hz: f32, target_hz: f32, tolerance_cents: i32) -> bool {
    let deviation = (note::cents_offset(actual_hz) - note::cents_offset(target_hz)).abs();
    deviation <= tolerance_cents
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A frequency a given number of cents above a reference.
    fn detuned(hz: f32, cents: f32) -> f32 {
        hz * (cents / 1200.0).exp2()
    }

    #[test]
    fn perfect_pitch_is_full_accuracy() {
        assert_eq!(accuracy(440.0, 440.0), 100);
        assert_eq!(accuracy(261.63, 261.63), 100);
    }

    #[test]
    fn octave_folding_keeps_full_accuracy() {
        // Same semitone class an octave up: zero cents deviation either way.
        assert_eq!(accuracy(880.0, 440.0), 100);
    }

    #[test]
    fn accuracy_is_monotonic_in_deviation() {
        let target = 440.0;
        let mut last = 100;
        for cents in [0.0, 5.0, 10.0, 20.0, 30.0, 40.0, 49.0] {
            let value = accuracy(detuned(target, cents), target);
            assert!(
                value <= last,
                "accuracy rose from {last} to {value} at {cents} cents"
            );
            last = value;
        }
    }

    #[test]
    fn accuracy_boundary_values() {
        let target = 440.0;
        assert_eq!(accuracy(target, target), 100);
        // 50 cents or more of deviation scores zero. +50 cents from A4 folds
        // to -50 on the A# side, a 50-cent gap.
        assert_eq!(accuracy(detuned(target, 50.1), target), 0);
        assert_eq!(accuracy(detuned(target, 25.0), target), 50);
    }

    #[test]
    fn tier_by_semitone_circle() {
        assert_eq!(tier(440.0, 440.0), Tier::Good); // A vs A
        assert_eq!(tier(466.16, 440.0), Tier::Close); // A# vs A
        assert_eq!(tier(415.30, 440.0), Tier::Close); // G# vs A
        assert_eq!(tier(523.25, 440.0), Tier::Miss); // C vs A
        // The circle wraps: B against C is distance 11, still close.
        assert_eq!(tier(493.88, 261.63), Tier::Close);
        // Out-of-band input cannot be named, so it cannot be a hit.
        assert_eq!(tier(2500.0, 440.0), Tier::Miss);
    }

    #[test]
    fn tier_ignores_octave() {
        assert_eq!(tier(880.0, 440.0), Tier::Good);
        assert_eq!(tier(220.0, 440.0), Tier::Good);
    }

    #[test]
    fn upgrade_never_downgrades() {
        assert_eq!(upgrade(None, Tier::Miss), Tier::Miss);
        assert_eq!(upgrade(Some(Tier::Miss), Tier::Good), Tier::Good);
        assert_eq!(upgrade(Some(Tier::Good), Tier::Miss), Tier::Good);
        assert_eq!(upgrade(Some(Tier::Close), Tier::Miss), Tier::Close);
        assert_eq!(upgrade(Some(Tier::Close), Tier::Good), Tier::Good);
    }

    #[test]
    fn on_target_tolerance() {
        assert!(pitch_on_target(440.0, 440.0, DEFAULT_TOLERANCE_CENTS));
        assert!(pitch_on_target(
            detuned(440.0, 20.0),
            440.0,
            DEFAULT_TOLERANCE_CENTS
        ));
        assert!(!pitch_on_target(
            detuned(440.0, 30.0),
            440.0,
            DEFAULT_TOLERANCE_CENTS
        ));
    }

    #[test]
    fn judgement_record_is_consistent() {
        let j = judge(1.5, 440.0, 466.16);
        assert_eq!(j.time, 1.5);
        assert_eq!(j.tier, Tier::Close);
        assert_eq!(j.accuracy, accuracy(466.16, 440.0));
    }
}
