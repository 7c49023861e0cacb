//! # Musical Note Mapping Module
//!
//! Conversions between frequency and musical pitch for the karaoke engine.
//! Handles note naming, MIDI numbers, cents-offset measurement, and the
//! vocal-range helpers the practice UI relies on. All calculations use equal
//! temperament with A4 = 440 Hz.
//!
//! ## Features
//! - Frequency to note name / octave / MIDI number
//! - Cents offset from the nearest equal-tempered semitone
//! - Reverse lookup from note names like "A4" or "C#3"
//! - Vocal range classification (Bass through High Soprano)

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;

/// The chromatic scale starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Concert pitch reference.
pub const A4_HZ: f32 = 440.0;

/// Frequencies below this cannot be named; treated as unknown.
pub const MIN_NAMED_HZ: f32 = 16.0;

/// Frequencies above this cannot be named; treated as unknown.
pub const MAX_NAMED_HZ: f32 = 2000.0;

/// C0 derived from A4 = 440 Hz: A4 is 4.75 octaves above C0.
static C0_HZ: Lazy<f32> = Lazy::new(|| A4_HZ * (-4.75f32).exp2());

/// Represents a single musical note with its name, octave, and reference
/// frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Semitone class, one of [`NOTE_NAMES`].
    pub name: &'static str,
    /// Octave number, where octaves change at C.
    pub octave: i32,
    /// MIDI note number (A4 = 69).
    pub midi: i32,
    /// Equal-tempered reference frequency in Hz.
    pub frequency: f32,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

/// Statically computed equal-temperament notes from C0 to B8.
///
/// Computed once at startup; index `i` is `i` semitones above C0.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    (0..108)
        .map(|i| {
            let frequency = *C0_HZ * (i as f32 / 12.0).exp2();
            Note {
                name: NOTE_NAMES[i % 12],
                octave: (i / 12) as i32,
                // C0 is MIDI 12.
                midi: i as i32 + 12,
                frequency,
            }
        })
        .collect()
});

/// Static map for note-name-to-table-index lookups ("A4" -> 57).
static NOTE_INDEX: Lazy<BTreeMap<String, usize>> = Lazy::new(|| {
    NOTES
        .iter()
        .enumerate()
        .map(|(i, note)| (note.to_string(), i))
        .collect()
});

/// Maps a frequency to the nearest equal-tempered note.
///
/// Returns `None` outside the nameable band of [`MIN_NAMED_HZ`] to
/// [`MAX_NAMED_HZ`]; out-of-band input is unknown, not an error.
pub fn frequency_to_note(hz: f32) -> Option<Note> {
    if !hz.is_finite() || hz < MIN_NAMED_HZ || hz > MAX_NAMED_HZ {
        return None;
    }
    let half_steps = 12.0 * (hz / *C0_HZ).log2();
    let index = (half_steps.round() as i64).clamp(0, NOTES.len() as i64 - 1) as usize;
    Some(NOTES[index].clone())
}

/// Cents deviation of a frequency from its nearest equal-tempered semitone.
///
/// Always in (-50, +50] for in-band input; out-of-band input reports 0.
pub fn cents_offset(hz: f32) -> i32 {
    if !hz.is_finite() || hz < MIN_NAMED_HZ || hz > MAX_NAMED_HZ {
        return 0;
    }
    let half_steps = 12.0 * (hz / *C0_HZ).log2();
    let nearest = half_steps.round();
    ((half_steps - nearest) * 100.0).round() as i32
}

/// Cents deviation of a frequency from an explicit reference frequency.
///
/// Positive values are sharp of the reference, negative flat;
/// 100 cents = 1 semitone, 1200 cents = 1 octave.
pub fn cents_deviation(hz: f32, reference_hz: f32) -> f32 {
    1200.0 * (hz / reference_hz).log2()
}

/// Semitone class (0 = C, 11 = B) of the nearest note, for pitch-circle
/// arithmetic. `None` outside the nameable band.
pub fn pitch_class(hz: f32) -> Option<i32> {
    frequency_to_note(hz).map(|note| note.midi.rem_euclid(12))
}

/// Fractional MIDI number for a frequency (A4 = 69).
pub fn hz_to_midi(hz: f32) -> f32 {
    69.0 + 12.0 * (hz / A4_HZ).log2()
}

/// Frequency of a (possibly fractional) MIDI number.
pub fn midi_to_hz(midi: f32) -> f32 {
    A4_HZ * ((midi - 69.0) / 12.0).exp2()
}

/// Rounded semitone interval between two frequencies; positive when the
/// first is higher.
pub fn semitone_difference(hz_a: f32, hz_b: f32) -> i32 {
    (12.0 * (hz_a / hz_b).log2()).round() as i32
}

/// Looks up the reference frequency for a note name like "A4" or "C#3".
pub fn note_frequency(name: &str) -> Option<f32> {
    NOTE_INDEX.get(name).map(|&i| NOTES[i].frequency)
}

/// Typical singing range.
pub fn is_vocal_range(hz: f32) -> bool {
    (80.0..=1000.0).contains(&hz)
}

/// Minimum input level before a detected pitch counts as singing rather
/// than incidental noise.
pub const MIN_SINGING_LEVEL: f32 = 0.02;

/// Whether a detected pitch at a given input level counts as singing.
pub fn is_singing(frequency_hz: Option<f32>, audio_level: f32) -> bool {
    match frequency_hz {
        Some(hz) if audio_level >= MIN_SINGING_LEVEL => is_vocal_range(hz),
        _ => false,
    }
}

/// Rough voice-part classification for display.
pub fn vocal_range_category(hz: f32) -> &'static str {
    if hz < 130.0 {
        "Bass"
    } else if hz < 196.0 {
        "Tenor"
    } else if hz < 262.0 {
        "Alto"
    } else if hz < 392.0 {
        "Soprano"
    } else {
        "High Soprano"
    }
}
