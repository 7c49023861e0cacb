//! # Audio Capture Module
//!
//! This module handles real-time microphone capture using CPAL (Cross-Platform
//! Audio Library). It owns the live input stream for the duration of a practice
//! session and delivers fixed-size time-domain frames to the analysis pipeline.
//!
//! ## Features
//! - Automatic input device selection
//! - Mono 32-bit float capture at (or near) 44.1 kHz
//! - Fixed-size frame delivery over a channel
//! - Scoped stream ownership: construct on start, tear down on stop

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use log::{info, warn};

/// Number of samples per analysis frame.
///
/// Larger frames resolve lower fundamentals but increase latency.
/// 2048 samples is ~46 ms at 44.1 kHz, enough for the 80 Hz bottom of the
/// vocal range.
pub const FRAME_SIZE: usize = 2048;

/// One fixed-size frame of time-domain samples, tagged with the rate it was
/// captured at. Immutable once produced.
#[derive(Debug, Clone)]
pub struct SampleFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Owned handle to the live microphone stream.
///
/// Created by [`AudioSession::start`], destroyed by [`AudioSession::stop`] (or
/// on drop). The stream and its handles are exclusively owned by this value,
/// so a stop-then-start sequence cannot leak a prior capture graph.
pub struct AudioSession {
    stream: cpal::Stream,
    sample_rate: u32,
}

impl AudioSession {
    /// Starts microphone capture from the default input device.
    ///
    /// Samples are accumulated in the stream callback and forwarded as whole
    /// [`SampleFrame`]s of [`FRAME_SIZE`] samples. Frames are sent with
    /// `try_send`; if the analysis side falls behind, frames are dropped
    /// rather than blocking the audio callback.
    ///
    /// # Arguments
    /// * `sender` - Channel sender feeding frames to the analysis thread
    ///
    /// # Errors
    /// Returns an error if no input device is available, no suitable mono f32
    /// configuration exists, or the stream cannot be built or started. This is
    /// the one failure class the engine surfaces to the user; everything
    /// downstream degrades to "no pitch" instead of erroring.
    pub fn start(sender: Sender<SampleFrame>) -> Result<AudioSession> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;

        info!("Using audio input device: {}", device.name()?);

        let configs = device.supported_input_configs()?.collect::<Vec<_>>();
        let supported_config = find_supported_config(configs, 44100)
            .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

        let config = supported_config.with_sample_rate(cpal::SampleRate(44100));
        let sample_rate = config.sample_rate().0;
        let config: cpal::StreamConfig = config.into();

        info!("Selected sample rate: {} Hz", sample_rate);

        let err_fn = |err| warn!("An error occurred on the audio stream: {}", err);

        // This buffer accumulates audio data from the callback until a full
        // frame is available.
        let mut accumulator = Vec::with_capacity(FRAME_SIZE * 2);

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                accumulator.extend_from_slice(data);

                // While we have enough data for a full frame, forward it.
                while accumulator.len() >= FRAME_SIZE {
                    let frame = SampleFrame {
                        samples: accumulator[..FRAME_SIZE].to_vec(),
                        sample_rate,
                    };

                    // Ignore errors if the channel is full or closed.
                    let _ = sender.try_send(frame);

                    accumulator.drain(..FRAME_SIZE);
                }
            },
            err_fn,
            None,
        )?;

        stream.play()?;

        Ok(AudioSession {
            stream,
            sample_rate,
        })
    }

    /// The rate the device is actually capturing at, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stops capture and releases the stream.
    ///
    /// Frame delivery halts synchronously; no further frames reach the
    /// channel once this returns.
    pub fn stop(self) {
        if let Err(e) = self.stream.pause() {
            warn!("Error pausing stream: {}", e);
        }
        drop(self.stream);
    }
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Filters for mono 32-bit float input and picks the configuration whose
/// supported rate range lies closest to the target.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}
