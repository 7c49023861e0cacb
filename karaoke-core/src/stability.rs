//! Tone-stability feedback from a rolling window of recent pitch estimates.
//! Advisory smoothing aid for the UI; not part of the scoring formula.

use std::collections::VecDeque;

/// How many recent estimates the window holds.
pub const HISTORY_CAPACITY: usize = 30;

/// Minimum samples before stability is reported at all.
pub const MIN_SAMPLES: usize = 10;

/// Fixed-capacity FIFO of recent detected frequencies.
#[derive(Debug, Clone, Default)]
pub struct PitchHistory {
    samples: VecDeque<f32>,
}

impl PitchHistory {
    pub fn new() -> PitchHistory {
        PitchHistory {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Records a detected frequency, evicting the oldest once the window is
    /// full.
    pub fn push(&mut self, frequency_hz: f32) {
        if self.samples.len() == HISTORY_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(frequency_hz);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Stability score from 0 to 100; lower variance means a steadier tone.
    ///
    /// Fewer than [`MIN_SAMPLES`] samples yields 0: not enough data, not an
    /// error.
    pub fn stability(&self) -> f32 {
        if self.samples.len() < MIN_SAMPLES {
            return 0.0;
        }

        let count = self.samples.len() as f32;
        let mean = self.samples.iter().sum::<f32>() / count;
        let variance = self
            .samples
            .iter()
            .map(|f| (f - mean) * (f - mean))
            .sum::<f32>()
            / count;

        (100.0 - variance.sqrt()).max(0.0).round()
    }
}
