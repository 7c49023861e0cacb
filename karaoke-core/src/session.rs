//! # Practice Session Module
//!
//! Per-session state for a practice run: collects the judgement stream for
//! the scorer, tracks per-event quality tiers for segment feedback, and
//! produces the live per-frame feedback the presentation layer reads. Two
//! consumers share the accuracy judge here: a continuous per-frame path that
//! feeds the session scorer, and a committed per-event path that seals each
//! target's tier at most once when playback crosses its end boundary.

use crate::FrameFeedback;
use crate::audio::SampleFrame;
use crate::judge::{self, Judgement, Tier};
use crate::note;
use crate::pitch::{self, Strategy};
use crate::score::{self, SessionScore};
use crate::stability::PitchHistory;
use crate::timeline::Timeline;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// How long after an event's end boundary a crossing is still recognized,
/// in seconds. Detection happens on the frame cadence, so the crossing is
/// observed within a tolerance window rather than exactly at the boundary.
pub const BOUNDARY_TOLERANCE_SECONDS: f32 = 0.25;

/// Accepted band for live tracking; detections outside it are downgraded to
/// "no pitch" for the frame.
pub const LIVE_MIN_HZ: f32 = 50.0;
pub const LIVE_MAX_HZ: f32 = 1000.0;

/// Accumulator state for one practice session.
///
/// Created empty at session start, finalized exactly once by
/// [`PracticeSession::finish`]. Owned exclusively by the session controller;
/// the pitch history is only mutated from [`PracticeSession::analyze_frame`].
#[derive(Debug)]
pub struct PracticeSession {
    timeline: Timeline,
    strategy: Strategy,
    judgements: Vec<Judgement>,
    /// Best tier seen per event while it was due. Upgrade-only.
    event_tiers: BTreeMap<usize, Tier>,
    /// Events whose tier has been sealed by a boundary crossing.
    scored: BTreeSet<usize>,
    history: PitchHistory,
    last_pitch: Option<f32>,
}

impl PracticeSession {
    pub fn new(timeline: Timeline) -> PracticeSession {
        PracticeSession::with_strategy(timeline, Strategy::default())
    }

    pub fn with_strategy(timeline: Timeline, strategy: Strategy) -> PracticeSession {
        PracticeSession {
            timeline,
            strategy,
            judgements: Vec::new(),
            event_tiers: BTreeMap::new(),
            scored: BTreeSet::new(),
            history: PitchHistory::new(),
            last_pitch: None,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn judgements(&self) -> &[Judgement] {
        &self.judgements
    }

    /// The (possibly still unsealed) tier recorded for an event.
    pub fn event_tier(&self, id: usize) -> Option<Tier> {
        self.event_tiers.get(&id).copied()
    }

    /// Processes one captured frame at the given playback time.
    ///
    /// Runs pitch detection, folds the result into the live judgement
    /// stream and the due event's tier, advances the boundary-commitment
    /// scan, and returns the immediately readable feedback for this frame.
    pub fn analyze_frame(&mut self, time: f32, frame: &SampleFrame) -> FrameFeedback {
        let estimate = pitch::detect_pitch(&frame.samples, frame.sample_rate, self.strategy)
            .filter(|e| e.frequency_hz > LIVE_MIN_HZ && e.frequency_hz < LIVE_MAX_HZ);

        if let Some(estimate) = estimate {
            self.history.push(estimate.frequency_hz);
            self.last_pitch = Some(estimate.frequency_hz);

            if let Some(event) = self.timeline.due(time) {
                let judgement = judge::judge(time, event.target_hz(), estimate.frequency_hz);
                if !self.scored.contains(&event.id) {
                    let tier = judge::upgrade(self.event_tiers.get(&event.id).copied(), judgement.tier);
                    self.event_tiers.insert(event.id, tier);
                }
                self.judgements.push(judgement);
            }
        }

        self.commit_boundary(time);

        let note = estimate.and_then(|e| note::frequency_to_note(e.frequency_hz));
        FrameFeedback {
            detected_frequency: estimate.map(|e| e.frequency_hz),
            confidence: estimate.map(|e| e.confidence),
            cents_offset: estimate.map(|e| note::cents_offset(e.frequency_hz)),
            note,
            stability: self.history.stability(),
        }
    }

    /// Seals the tier of an event whose end boundary playback just crossed.
    ///
    /// An event qualifies while `time` lies in
    /// `[end_time, end_time + BOUNDARY_TOLERANCE_SECONDS)` and it has not
    /// been sealed before; it is judged once against the most recent
    /// detected pitch. With no pitch seen yet the event stays open until its
    /// tolerance window passes, so each event transitions from unscored to
    /// scored at most once.
    fn commit_boundary(&mut self, time: f32) {
        let Some(hz) = self.last_pitch else {
            return;
        };
        let just_finished = self.timeline.events().iter().find(|event| {
            time >= event.end_time
                && time < event.end_time + BOUNDARY_TOLERANCE_SECONDS
                && !self.scored.contains(&event.id)
        });
        let Some(event) = just_finished else {
            return;
        };

        let tier = judge::tier(hz, event.target_hz());
        let sealed = judge::upgrade(self.event_tiers.get(&event.id).copied(), tier);
        self.event_tiers.insert(event.id, sealed);
        self.scored.insert(event.id);
        debug!("sealed event {} ({}) as {:?}", event.id, event.label, sealed);
    }

    /// Current stats over the judgements collected so far. Pure; calling it
    /// does not advance session state.
    pub fn live_stats(&self, elapsed_seconds: f32) -> SessionScore {
        score::session_score(&self.judgements, elapsed_seconds)
    }

    /// Finalizes the session into its score. Consumes the session so it is
    /// scored exactly once.
    pub fn finish(self, duration_seconds: f32) -> SessionScore {
        score::session_score(&self.judgements, duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Grade;
    use crate::timeline::{CHORD_ROOTS, TargetEvent};

    const SAMPLE_RATE: u32 = 44100;

    fn sine_frame(frequency: f32) -> SampleFrame {
        let samples = (0..2048)
            .map(|i| {
                0.5 * (2.0 * std::f32::consts::PI * frequency * i as f32 / SAMPLE_RATE as f32).sin()
            })
            .collect();
        SampleFrame {
            samples,
            sample_rate: SAMPLE_RATE,
        }
    }

    fn silent_frame() -> SampleFrame {
        SampleFrame {
            samples: vec![0.0; 2048],
            sample_rate: SAMPLE_RATE,
        }
    }

    /// Two 2-second segments: an A target then a C target.
    fn two_segment_timeline() -> Timeline {
        Timeline::new(vec![
            TargetEvent {
                id: 1,
                start_time: 0.0,
                end_time: 2.0,
                chord: CHORD_ROOTS[5], // A, MIDI 69
                label: "first".into(),
            },
            TargetEvent {
                id: 2,
                start_time: 2.0,
                end_time: 4.0,
                chord: CHORD_ROOTS[0], // C, MIDI 60
                label: "second".into(),
            },
        ])
    }

    #[test]
    fn frames_on_target_accumulate_hits() {
        let mut session = PracticeSession::new(two_segment_timeline());
        for i in 0..10 {
            session.analyze_frame(0.1 + i as f32 * 0.1, &sine_frame(440.0));
        }
        assert_eq!(session.judgements().len(), 10);
        assert!(session.judgements().iter().all(|j| j.accuracy > 90));
        assert_eq!(session.event_tier(1), Some(Tier::Good));

        let score = session.finish(4.0);
        assert_eq!(score.notes_hit, 10);
        assert_eq!(score.notes_missed, 0);
    }

    #[test]
    fn silence_produces_no_judgements() {
        let mut session = PracticeSession::new(two_segment_timeline());
        let feedback = session.analyze_frame(0.5, &silent_frame());
        assert!(feedback.detected_frequency.is_none());
        assert!(session.judgements().is_empty());
        assert_eq!(session.finish(4.0).grade, Grade::F);
    }

    #[test]
    fn frames_between_phrases_are_not_judged() {
        let timeline = Timeline::new(vec![TargetEvent {
            id: 1,
            start_time: 1.0,
            end_time: 2.0,
            chord: CHORD_ROOTS[0],
            label: "only".into(),
        }]);
        let mut session = PracticeSession::new(timeline);
        let feedback = session.analyze_frame(0.5, &sine_frame(440.0));
        // The pitch is reported live even though nothing is due to judge.
        assert!(feedback.detected_frequency.is_some());
        assert!(session.judgements().is_empty());
    }

    #[test]
    fn boundary_seals_each_event_once() {
        let mut session = PracticeSession::new(two_segment_timeline());
        // Sing A through the first segment, then keep observing frames just
        // past its boundary.
        session.analyze_frame(1.9, &sine_frame(440.0));
        session.analyze_frame(2.05, &sine_frame(440.0));
        assert_eq!(session.event_tier(1), Some(Tier::Good));
        assert!(session.scored.contains(&1));

        // A second crossing inside the tolerance window must not re-judge.
        session.analyze_frame(2.1, &sine_frame(523.25));
        assert_eq!(session.event_tier(1), Some(Tier::Good));
    }

    #[test]
    fn sealed_tier_survives_later_frames() {
        let mut session = PracticeSession::new(two_segment_timeline());
        // Miss the first segment entirely (singing C against the A target),
        // then cross the boundary.
        session.analyze_frame(1.5, &sine_frame(261.63));
        session.analyze_frame(2.1, &sine_frame(261.63));
        assert_eq!(session.event_tier(1), Some(Tier::Miss));
        // The second segment wants C, so the same tone now upgrades tier 2.
        session.analyze_frame(2.5, &sine_frame(261.63));
        assert_eq!(session.event_tier(2), Some(Tier::Good));
        // Tier 1 stays sealed at Miss.
        assert_eq!(session.event_tier(1), Some(Tier::Miss));
    }

    #[test]
    fn tier_upgrades_but_never_downgrades_while_due() {
        let mut session = PracticeSession::new(two_segment_timeline());
        // First a miss against the A target, then a hit within the same
        // window.
        session.analyze_frame(0.5, &sine_frame(261.63));
        assert_eq!(session.event_tier(1), Some(Tier::Miss));
        session.analyze_frame(1.0, &sine_frame(440.0));
        assert_eq!(session.event_tier(1), Some(Tier::Good));
        session.analyze_frame(1.5, &sine_frame(261.63));
        assert_eq!(session.event_tier(1), Some(Tier::Good));
    }

    #[test]
    fn live_stats_match_finish() {
        let mut session = PracticeSession::new(two_segment_timeline());
        for i in 0..8 {
            session.analyze_frame(0.2 + i as f32 * 0.2, &sine_frame(440.0));
        }
        let live = session.live_stats(4.0);
        let final_score = session.finish(4.0);
        assert_eq!(live, final_score);
    }

    #[test]
    fn undetected_frame_reports_empty_feedback() {
        let mut session = PracticeSession::new(two_segment_timeline());
        let feedback = session.analyze_frame(0.5, &silent_frame());
        assert!(feedback.detected_frequency.is_none());
        assert!(feedback.note.is_none());
        assert!(feedback.cents_offset.is_none());
        assert_eq!(feedback.stability, 0.0);
    }
}
