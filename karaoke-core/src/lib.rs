// karaoke-core/src/lib.rs

//! The core logic for the karaoke practice tool.
//! This crate is responsible for microphone capture, pitch detection,
//! note mapping, target sequencing, and session scoring. It is
//! completely headless and contains no UI code.

pub mod audio;
pub mod judge;
pub mod note;
pub mod pitch;
pub mod score;
pub mod session;
pub mod stability;
pub mod timeline;

/// Represents the live feedback for a single analysed audio frame.
///
/// Every field is immediately readable after the frame is processed; there
/// is no buffering delay beyond the frame itself.
#[derive(Debug, Clone)]
pub struct FrameFeedback {
    /// The detected frequency in Hz, if the frame held a usable pitch.
    pub detected_frequency: Option<f32>,
    /// Confidence of the detection (0.0 to 1.0).
    pub confidence: Option<f32>,
    /// Deviation from the nearest equal-tempered semitone, in cents.
    pub cents_offset: Option<i32>,
    /// The nearest musical note.
    pub note: Option<note::Note>,
    /// Tone stability over the recent pitch history (0 to 100).
    pub stability: f32,
}
