//! Variable-speed playback.
//!
//! A fractional read pointer moves through the input by the current speed
//! every output frame. The control source is addressed by elapsed output
//! time relative to the input duration, so one control cycle spans one
//! input duration. Playback ends when the pointer leaves the input.
//!
//! Speed policy:
//! - playback starts at the first frame when the initial speed is >= 0 and at
//!   the last frame when it is negative
//! - speeds closer to zero than [`MIN_SPEED`] are pushed out to ±`MIN_SPEED`
//!   (zero counts as positive)
//! - a range of exactly zero (`min_speed == max_speed == 0`) is a state error

use super::Effect;
use crate::buffer::{Interpolation, SampleBuffer};
use crate::control::ControlSource;
use crate::error::{require_finite, FxError, Result};
use rand::RngCore;
use tracing::{debug, warn};

/// Smallest speed magnitude used for playback
pub const MIN_SPEED: f32 = 1e-3;

/// Playback at a speed swept between `min_speed` and `max_speed`
pub struct Vspeed<'a> {
    /// Control source mapping to `min_speed + value * (max_speed - min_speed)`
    pub control: &'a dyn ControlSource,
    pub min_speed: f32,
    pub max_speed: f32,
    pub interpolation: Interpolation,
}

impl<'a> Vspeed<'a> {
    pub fn new(control: &'a dyn ControlSource, min_speed: f32, max_speed: f32) -> Self {
        Self {
            control,
            min_speed,
            max_speed,
            interpolation: Interpolation::default(),
        }
    }

    /// Set interpolation mode
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Speed at a control phase, after the near-zero policy
    fn speed_at(&self, phase: f32) -> Result<f32> {
        let raw = self.min_speed + self.control.lookup(phase) * (self.max_speed - self.min_speed);
        if !raw.is_finite() {
            return Err(FxError::config(
                "control",
                format!("non-finite speed {raw} at phase {phase}"),
            ));
        }
        Ok(if raw.abs() >= MIN_SPEED {
            raw
        } else if raw < 0.0 {
            -MIN_SPEED
        } else {
            MIN_SPEED
        })
    }

    /// Play `input` back at the modulated speed
    pub fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let min_speed = require_finite("min_speed", self.min_speed)?;
        let max_speed = require_finite("max_speed", self.max_speed)?;
        if min_speed == 0.0 && max_speed == 0.0 {
            return Err(FxError::State(
                "playback speed range is zero; the read position can never move".into(),
            ));
        }
        if min_speed.abs() < MIN_SPEED || max_speed.abs() < MIN_SPEED {
            warn!(
                min_speed,
                max_speed,
                "speeds below {} are clamped away from zero",
                MIN_SPEED
            );
        }

        let frames = input.frames();
        let mut output = SampleBuffer::new(input.channels(), input.sample_rate())?;
        if frames == 0 {
            return Ok(output);
        }

        // A monotonic pass at MIN_SPEED takes this long; anything longer is oscillating
        let limit = (frames as f64 / MIN_SPEED as f64).ceil() as usize;
        let end = frames as f64;

        let mut speed = self.speed_at(0.0)?;
        let mut pos = if speed < 0.0 { end - 1.0 } else { 0.0 };
        let mut frame = vec![0.0; input.channels()];
        let mut n = 0usize;

        while (0.0..end).contains(&pos) {
            if n >= limit {
                return Err(FxError::State(format!(
                    "playback did not leave the input within {limit} frames"
                )));
            }
            input.read_into(pos, self.interpolation, &mut frame);
            output.push_frame(&frame)?;

            n += 1;
            pos += speed as f64;
            speed = self.speed_at(n as f32 / frames as f32)?;
        }

        debug!(
            min_speed,
            max_speed,
            input_frames = frames,
            output_frames = n,
            "vspeed"
        );

        Ok(output)
    }
}

impl Effect for Vspeed<'_> {
    fn apply(&self, input: &SampleBuffer, _rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input)
    }

    fn name(&self) -> &'static str {
        "VSpeed"
    }
}
