//! # Target Timeline Module
//!
//! Target sequencing for a practice session: an ordered list of
//! non-overlapping target events (one per lyric line), and the lookup that
//! answers "which target is due right now". When a song carries no timing
//! annotations the timeline is synthesized, either by splitting the track
//! duration evenly across the lines, or by first locating the singing region
//! from audio energy and splitting only that.

use crate::audio::FRAME_SIZE;
use crate::note;
use crate::pitch::{self, Strategy};
use log::debug;

/// Bucket width for the energy scan, in seconds.
pub const ENERGY_FRAME_SECONDS: f32 = 0.2;

/// Fraction of peak energy above which a bucket counts as singing.
pub const ENERGY_THRESHOLD_RATIO: f32 = 0.3;

/// Shortest singing region the energy scan will report, in seconds.
pub const MIN_SINGING_SECONDS: f32 = 4.0;

/// A chord root with its MIDI pitch, used as a target for a lyric segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordRoot {
    pub name: &'static str,
    pub midi: i32,
}

/// The chord vocabulary the guesser chooses from.
pub const CHORD_ROOTS: [ChordRoot; 10] = [
    ChordRoot { name: "C", midi: 60 },
    ChordRoot { name: "D", midi: 62 },
    ChordRoot { name: "E", midi: 64 },
    ChordRoot { name: "F", midi: 65 },
    ChordRoot { name: "G", midi: 67 },
    ChordRoot { name: "A", midi: 69 },
    ChordRoot { name: "B", midi: 71 },
    ChordRoot { name: "Am", midi: 69 },
    ChordRoot { name: "Em", midi: 64 },
    ChordRoot { name: "Dm", midi: 62 },
];

/// Picks the chord root whose MIDI pitch is nearest to a detected frequency.
/// Defaults to C when there is no pitch to go on.
pub fn guess_chord(pitch_hz: Option<f32>) -> ChordRoot {
    let Some(hz) = pitch_hz else {
        return CHORD_ROOTS[0];
    };
    let midi = note::hz_to_midi(hz);
    let mut best = CHORD_ROOTS[0];
    let mut best_distance = f32::INFINITY;
    for chord in CHORD_ROOTS {
        let distance = (chord.midi as f32 - midi).abs();
        if distance < best_distance {
            best_distance = distance;
            best = chord;
        }
    }
    best
}

/// One scoring target: a half-open time window and the pitch the singer
/// should land on during it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEvent {
    pub id: usize,
    pub start_time: f32,
    pub end_time: f32,
    pub chord: ChordRoot,
    /// The lyric line (or chord label) this window belongs to.
    pub label: String,
}

impl TargetEvent {
    /// Half-open membership: `[start_time, end_time)`.
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start_time && time < self.end_time
    }

    /// The target frequency for accuracy judgement, from the chord root.
    pub fn target_hz(&self) -> f32 {
        note::midi_to_hz(self.chord.midi as f32)
    }
}

/// An ordered sequence of non-overlapping target events, immutable for the
/// session once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    events: Vec<TargetEvent>,
}

impl Timeline {
    /// Builds a timeline from pre-computed events, ordering them by start
    /// time. Events are assumed non-overlapping by construction of the
    /// source annotations.
    pub fn new(mut events: Vec<TargetEvent>) -> Timeline {
        events.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Timeline { events }
    }

    pub fn events(&self) -> &[TargetEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The event whose window contains the given playback time, or `None`
    /// between phrases. At most one event is due at any timestamp.
    pub fn due(&self, time: f32) -> Option<&TargetEvent> {
        self.events.iter().find(|event| event.contains(time))
    }

    /// Fallback synthesis when no timing annotations exist: the total
    /// duration divided evenly across the lyric lines. Every segment gets a
    /// C target, matching the neutral default of the source annotations.
    pub fn even_split(lines: &[String], total_duration: f32) -> Timeline {
        let count = lines.len().max(1);
        let slot = total_duration / count as f32;
        let events = lines
            .iter()
            .enumerate()
            .map(|(i, line)| TargetEvent {
                id: i + 1,
                start_time: i as f32 * slot,
                end_time: (i + 1) as f32 * slot,
                chord: CHORD_ROOTS[0],
                label: line.clone(),
            })
            .collect();
        Timeline { events }
    }

    /// Energy-guided synthesis: locate the sub-range of the track where
    /// anything audible is happening, and distribute the lyric lines evenly
    /// across that region only. Falls back to [`Timeline::even_split`] when
    /// the track is silent or there are no lines.
    ///
    /// The scan buckets the track into [`ENERGY_FRAME_SECONDS`] frames,
    /// computes RMS per bucket, and keeps buckets above
    /// [`ENERGY_THRESHOLD_RATIO`] of the peak. The singing region spans the
    /// first through last kept bucket, widened to [`MIN_SINGING_SECONDS`].
    /// Each synthesized segment then gets a chord guessed from the audio
    /// around its center.
    pub fn from_audio_energy(
        samples: &[f32],
        sample_rate: u32,
        lines: &[String],
        total_duration: f32,
    ) -> Timeline {
        let frame_size = (sample_rate as f32 * ENERGY_FRAME_SECONDS) as usize;
        if frame_size == 0 || samples.is_empty() || lines.is_empty() {
            return Timeline::even_split(lines, total_duration);
        }

        let energies: Vec<f32> = samples
            .chunks(frame_size)
            .map(|chunk| pitch::rms(chunk))
            .collect();
        let peak = energies.iter().cloned().fold(0.0f32, f32::max);
        let threshold = peak * ENERGY_THRESHOLD_RATIO;

        let active: Vec<usize> = energies
            .iter()
            .enumerate()
            .filter(|&(_, &e)| e > threshold)
            .map(|(i, _)| i)
            .collect();

        if active.is_empty() {
            return Timeline::even_split(lines, total_duration);
        }

        let first_time = *active.first().unwrap() as f32 * ENERGY_FRAME_SECONDS;
        let last_time = *active.last().unwrap() as f32 * ENERGY_FRAME_SECONDS;
        let singing_duration = (last_time - first_time).max(MIN_SINGING_SECONDS);
        let slot = singing_duration / lines.len() as f32;
        debug!(
            "singing region {:.1}s..{:.1}s across {} lines",
            first_time,
            first_time + singing_duration,
            lines.len()
        );

        let events = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let start_time = first_time + i as f32 * slot;
                let end_time = first_time + (i + 1) as f32 * slot;
                let center = (start_time + end_time) / 2.0;
                let chord = guess_chord(segment_pitch(samples, sample_rate, center));
                TargetEvent {
                    id: i + 1,
                    start_time,
                    end_time,
                    chord,
                    label: line.clone(),
                }
            })
            .collect();

        Timeline { events }
    }
}

/// Detects the dominant pitch in a [`FRAME_SIZE`]-sample window centered on
/// a point in the track. Regions past either edge are zero-padded.
fn segment_pitch(samples: &[f32], sample_rate: u32, center_seconds: f32) -> Option<f32> {
    let center = (center_seconds * sample_rate as f32) as i64;
    let mut window = vec![0.0f32; FRAME_SIZE];
    for (i, slot) in window.iter_mut().enumerate() {
        let index = center + i as i64 - (FRAME_SIZE / 2) as i64;
        if index >= 0 && (index as usize) < samples.len() {
            *slot = samples[index as usize];
        }
    }
    pitch::detect_pitch(&window, sample_rate, Strategy::NormalizedDifference)
        .map(|estimate| estimate.frequency_hz)
}
