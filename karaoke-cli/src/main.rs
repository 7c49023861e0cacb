// karaoke-cli/src/main.rs

//! # Karaoke Practice - Terminal Front-End
//!
//! A thin terminal runner for the karaoke practice engine. It captures the
//! microphone, runs the analysis loop on a dedicated thread, scores a
//! practice session against a built-in demo chord progression, and prints
//! the final score as JSON.
//!
//! ## Architecture
//! - **Main thread**: owns the audio session for the run, waits out the
//!   session, then triggers shutdown and reports the score
//! - **Analysis thread**: consumes sample frames, drives the practice
//!   session, prints live feedback
//! - **Communication**: crossbeam channels for frames and shutdown

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::Receiver;
use karaoke_core::audio::{AudioSession, SampleFrame};
use karaoke_core::score::SessionScore;
use karaoke_core::session::PracticeSession;
use karaoke_core::timeline::{CHORD_ROOTS, TargetEvent, Timeline};
use log::{info, warn};
use std::fs::File;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

/// Seconds each chord in the demo progression stays due.
const DEMO_SLOT_SECONDS: f32 = 2.0;

/// The demo progression the session is scored against.
const DEMO_PROGRESSION: [&str; 12] = [
    "C", "G", "A", "F", "C", "G", "E", "A", "D", "G", "C", "F",
];

/// Where the final session report is written.
const REPORT_PATH: &str = "session_report.json";

fn main() -> Result<()> {
    env_logger::init();

    let timeline = demo_timeline();
    let total_seconds = timeline.len() as f32 * DEMO_SLOT_SECONDS;

    println!("Karaoke practice: sing along with the chord roots!");
    println!(
        "Progression: {} ({}s per chord)",
        DEMO_PROGRESSION.join(" "),
        DEMO_SLOT_SECONDS
    );

    let (frame_tx, frame_rx) = crossbeam_channel::unbounded::<SampleFrame>();
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

    // Acquisition failure is the one error class that must reach the user;
    // everything past this point degrades to "no pitch" instead of failing.
    let audio = AudioSession::start(frame_tx).context("could not start microphone capture")?;
    info!("capture running at {} Hz", audio.sample_rate());

    let session = PracticeSession::new(timeline);
    let worker = thread::spawn(move || {
        analysis_loop(session, frame_rx, shutdown_rx, total_seconds)
    });

    // Let the session play out, then stop the worker if it has not already
    // finished on its own.
    thread::sleep(Duration::from_secs_f32(total_seconds + 0.5));
    let _ = shutdown_tx.send(());

    let score = worker
        .join()
        .map_err(|_| anyhow!("analysis thread panicked"))?;
    audio.stop();

    report(&score)?;
    Ok(())
}

/// Builds the demo timeline: one target event per chord, back to back.
fn demo_timeline() -> Timeline {
    let events = DEMO_PROGRESSION
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let chord = CHORD_ROOTS
                .iter()
                .find(|c| c.name == *name)
                .copied()
                .unwrap_or(CHORD_ROOTS[0]);
            TargetEvent {
                id: i + 1,
                start_time: i as f32 * DEMO_SLOT_SECONDS,
                end_time: (i + 1) as f32 * DEMO_SLOT_SECONDS,
                chord,
                label: name.to_string(),
            }
        })
        .collect();
    Timeline::new(events)
}

/// Consumes frames until the session duration elapses or shutdown arrives,
/// then finalizes the session into its score.
///
/// Playback time is the wall-clock offset from the first frame, which keeps
/// the target windows aligned with what the singer hears.
fn analysis_loop(
    mut session: PracticeSession,
    frames: Receiver<SampleFrame>,
    shutdown: Receiver<()>,
    total_seconds: f32,
) -> SessionScore {
    let started = Instant::now();
    let mut last_line = String::new();

    loop {
        crossbeam_channel::select! {
            recv(frames) -> msg => match msg {
                Ok(frame) => {
                    let time = started.elapsed().as_secs_f32();
                    if time >= total_seconds {
                        break;
                    }
                    let feedback = session.analyze_frame(time, &frame);
                    let line = feedback_line(&session, time, &feedback);
                    if line != last_line {
                        println!("{line}");
                        last_line = line;
                    }
                }
                Err(_) => {
                    warn!("frame channel closed");
                    break;
                }
            },
            recv(shutdown) -> _ => {
                info!("received shutdown signal");
                break;
            },
        }
    }

    print_segment_summary(&session);
    session.finish(total_seconds)
}

/// One live feedback line: time, due chord, detected note, cents, stability.
fn feedback_line(
    session: &PracticeSession,
    time: f32,
    feedback: &karaoke_core::FrameFeedback,
) -> String {
    let due = session.timeline().due(time);
    let target = due.map(|event| event.label.as_str()).unwrap_or("-");
    match (&feedback.note, feedback.cents_offset) {
        (Some(note), Some(cents)) => {
            let mut line = format!(
                "[{target}] {note} {cents:+}c  stability {:.0}",
                feedback.stability
            );
            if let (Some(event), Some(hz)) = (due, feedback.detected_frequency) {
                let deviation = karaoke_core::note::cents_deviation(hz, event.target_hz());
                line.push_str(&format!("  (target {deviation:+.0}c)"));
            }
            line
        }
        _ => format!("[{target}] ..."),
    }
}

/// Prints the per-segment quality tiers once the run is over.
fn print_segment_summary(session: &PracticeSession) {
    println!("--- segments ---");
    for event in session.timeline().events() {
        let quality = match session.event_tier(event.id) {
            Some(tier) => format!("{tier:?}").to_lowercase(),
            None => "unsung".to_string(),
        };
        println!("  {:>2}. [{}] {}", event.id, event.label, quality);
    }
}

/// Prints the score and writes the session report file.
fn report(score: &SessionScore) -> Result<()> {
    let json = serde_json::to_string_pretty(score)?;
    println!("--- session score ---");
    println!("{json}");
    println!("Grade: {}  ({} points)", score.grade, score.points);

    save_report(score, REPORT_PATH)?;
    info!("session report written to {REPORT_PATH}");
    Ok(())
}

/// Saves the session score to a JSON file for the persistence collaborator.
fn save_report(score: &SessionScore, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(score)?;
    let mut file = File::create(path).with_context(|| format!("creating {path}"))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}
