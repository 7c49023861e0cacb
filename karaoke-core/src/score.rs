//! # Session Scoring Module
//!
//! Aggregates the stream of per-instant accuracy judgements collected during
//! a practice session into the final session score: hit/miss counts, combo
//! tracking, percentage score with combo and perfect bonuses, letter grade,
//! and points. Pure aggregation; calling it twice on the same judgement list
//! yields an identical score.

use crate::judge::Judgement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Judgements at or above this accuracy count as hits.
pub const HIT_ACCURACY: u8 = 50;

/// Judgements at or above this accuracy additionally count as perfect.
pub const PERFECT_ACCURACY: u8 = 95;

/// Letter grade for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Grade for a score percentage. Thresholds are inclusive lower bounds.
    pub fn from_percentage(score: f32) -> Grade {
        if score >= 95.0 {
            Grade::S
        } else if score >= 85.0 {
            Grade::A
        } else if score >= 75.0 {
            Grade::B
        } else if score >= 65.0 {
            Grade::C
        } else if score >= 50.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{letter}")
    }
}

/// The full result of a scored practice session. This field set is the
/// contract consumed by persistence and leaderboard collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScore {
    pub score_percentage: f32,
    pub notes_hit: u32,
    pub notes_missed: u32,
    pub perfect_notes: u32,
    pub average_pitch_accuracy: f32,
    pub max_combo: u32,
    pub grade: Grade,
    pub points: u32,
}

impl SessionScore {
    /// The defined result for a session with no judgements at all.
    pub fn empty() -> SessionScore {
        SessionScore {
            score_percentage: 0.0,
            notes_hit: 0,
            notes_missed: 0,
            perfect_notes: 0,
            average_pitch_accuracy: 0.0,
            max_combo: 0,
            grade: Grade::F,
            points: 0,
        }
    }
}

/// Rounds to two decimal places, half away from zero.
fn round_hundredths(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Scores a session from its collected judgements and duration.
///
/// A judgement with accuracy >= [`HIT_ACCURACY`] is a hit and extends the
/// running combo; >= [`PERFECT_ACCURACY`] additionally counts as perfect;
/// anything lower is a miss and resets the combo. The percentage score
/// weighs hit rate at 70% and average accuracy at 30%, then applies a combo
/// bonus (up to 20%) and a perfect bonus (up to 10%), capped at 100.
///
/// An empty judgement list yields the all-zero grade-F score rather than
/// dividing by zero.
pub fn session_score(judgements: &[Judgement], duration_seconds: f32) -> SessionScore {
    if judgements.is_empty() {
        return SessionScore::empty();
    }

    let total_accuracy: f32 = judgements.iter().map(|j| j.accuracy as f32).sum();
    let average_accuracy = total_accuracy / judgements.len() as f32;

    let mut notes_hit = 0u32;
    let mut notes_missed = 0u32;
    let mut perfect_notes = 0u32;
    let mut current_combo = 0u32;
    let mut max_combo = 0u32;

    for judgement in judgements {
        if judgement.accuracy >= HIT_ACCURACY {
            notes_hit += 1;
            current_combo += 1;
            max_combo = max_combo.max(current_combo);

            if judgement.accuracy >= PERFECT_ACCURACY {
                perfect_notes += 1;
            }
        } else {
            notes_missed += 1;
            current_combo = 0;
        }
    }

    let hit_rate = notes_hit as f32 / (notes_hit + notes_missed) as f32;
    let combo_bonus = (max_combo as f32 / 50.0).min(0.2); // up to 20% bonus
    let perfect_bonus = perfect_notes as f32 / judgements.len() as f32 * 0.1; // up to 10% bonus

    let score_percentage = ((hit_rate * 0.7 // 70% from hit rate
        + average_accuracy / 100.0 * 0.3) // 30% from accuracy
        * 100.0
        * (1.0 + combo_bonus + perfect_bonus))
        .min(100.0);

    let grade = Grade::from_percentage(score_percentage);

    let base_points = (score_percentage * 10.0).round() as u32;
    let combo_points = max_combo * 5;
    let perfect_points = perfect_notes * 10;
    let duration_bonus = (duration_seconds / 60.0).round() as u32; // 1 point per minute

    SessionScore {
        score_percentage: round_hundredths(score_percentage),
        notes_hit,
        notes_missed,
        perfect_notes,
        average_pitch_accuracy: round_hundredths(average_accuracy),
        max_combo,
        grade,
        points: base_points + combo_points + perfect_points + duration_bonus,
    }
}
