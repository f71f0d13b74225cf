//! Delay family: fixed echo, modulated delay and multi-tap delay.
//!
//! Feedback is written back onto the line, so every repeat is the previous
//! one scaled by the feedback gain. Multi-tap lines are independent: each
//! tap only ever reads its own line's prior contents, so the result does not
//! depend on tap order.

use super::delay_line::DelayLine;
use super::Effect;
use crate::buffer::{Interpolation, SampleBuffer};
use crate::control::ControlSource;
use crate::error::{
    require_feedback, require_finite, require_non_negative, require_positive, FxError, Result,
};
use rand::RngCore;
use tracing::{debug, warn};

/// Tap count above which a warning about un-normalized output is logged
pub const MANY_TAPS: usize = 8;

/// Fixed echo: `y[n] = x[n] + feedback * y[n - d]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delay {
    /// Delay time in seconds (0 = dry signal)
    pub time: f32,
    /// Feedback gain, |feedback| < 1
    pub feedback: f32,
}

impl Delay {
    pub fn new(time: f32, feedback: f32) -> Self {
        Self { time, feedback }
    }

    /// Apply the delay to `input`
    pub fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let time = require_non_negative("time", self.time)?;
        let feedback = require_feedback(self.feedback)?;

        let delay = input.seconds_to_frames(time).round();
        debug!(
            time,
            feedback,
            delay_frames = delay,
            frames = input.frames(),
            "delay"
        );

        // No history to tap, or the first echo lands past the end: dry signal
        if delay < 1.0 || delay >= input.frames() as f32 {
            return Ok(input.clone());
        }

        let delay_frames = delay as usize;
        let mut line = DelayLine::new(delay_frames, input.channels())?;
        let mut output = input.clone();

        for frame in output.frames_mut() {
            for (c, sample) in frame.iter_mut().enumerate() {
                *sample += feedback * line.tap(c, delay_frames);
            }
            line.write(frame);
        }

        Ok(output)
    }
}

impl Effect for Delay {
    fn apply(&self, input: &SampleBuffer, _rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input)
    }

    fn name(&self) -> &'static str {
        "Delay"
    }
}

/// Delay whose time is swept between `min_time` and `max_time` by a control source
pub struct Vdelay<'a> {
    /// Control source, read once per frame at phase `n / frames`
    pub control: &'a dyn ControlSource,
    /// Shortest delay in seconds (at control value 0)
    pub min_time: f32,
    /// Longest delay in seconds (at control value 1)
    pub max_time: f32,
    /// Feedback gain, |feedback| < 1
    pub feedback: f32,
    pub interpolation: Interpolation,
}

impl<'a> Vdelay<'a> {
    pub fn new(
        control: &'a dyn ControlSource,
        min_time: f32,
        max_time: f32,
        feedback: f32,
    ) -> Self {
        Self {
            control,
            min_time,
            max_time,
            feedback,
            interpolation: Interpolation::default(),
        }
    }

    /// Set interpolation mode
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Apply the modulated delay to `input`
    pub fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let min_time = require_finite("min_time", self.min_time)?;
        let max_time = require_finite("max_time", self.max_time)?;
        let feedback = require_feedback(self.feedback)?;

        let min_frames = input.seconds_to_frames(min_time) as f64;
        let max_frames = input.seconds_to_frames(max_time) as f64;
        if min_frames < 1.0 {
            return Err(FxError::config(
                "min_time",
                format!("{min_time}s is shorter than one frame"),
            ));
        }
        if max_time < min_time {
            return Err(FxError::config(
                "max_time",
                format!("{max_time}s is below min_time {min_time}s"),
            ));
        }
        if !max_frames.is_finite() {
            return Err(FxError::config(
                "max_time",
                format!("{max_time}s is too long at {} Hz", input.sample_rate()),
            ));
        }

        debug!(
            min_time,
            max_time,
            feedback,
            frames = input.frames(),
            "vdelay"
        );

        let frames = input.frames();
        // Taps longer than the input only ever read silence, which a line of
        // `frames` (never wrapped) already returns for any longer delay
        let line_frames = (max_frames.ceil() as usize).saturating_add(1).min(frames);
        let mut line = DelayLine::new(line_frames, input.channels())?;
        let longest = line.capacity() as f64;
        let mut output = input.clone();
        let range = max_frames - min_frames;

        for (n, frame) in output.frames_mut().enumerate() {
            let phase = n as f32 / frames as f32;
            // Delay time stays within its configured range
            let depth = self.control.lookup(phase).clamp(0.0, 1.0) as f64;
            let delay = (min_frames + depth * range).min(longest);

            for (c, sample) in frame.iter_mut().enumerate() {
                *sample += feedback * line.tap_fractional(c, delay, self.interpolation);
            }
            line.write(frame);
        }

        Ok(output)
    }
}

impl Effect for Vdelay<'_> {
    fn apply(&self, input: &SampleBuffer, _rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input)
    }

    fn name(&self) -> &'static str {
        "VDelay"
    }
}

/// Multi-tap delay: the input plus one independently fed-back echo per tap
#[derive(Debug, Clone, PartialEq)]
pub struct Mdelay {
    /// Tap delay times in seconds
    pub times: Vec<f32>,
    /// Feedback gain shared by every tap, |feedback| < 1
    pub feedback: f32,
}

impl Mdelay {
    pub fn new(times: Vec<f32>, feedback: f32) -> Self {
        Self { times, feedback }
    }

    /// Apply the taps to `input`
    pub fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let feedback = require_feedback(self.feedback)?;

        let mut taps = Vec::with_capacity(self.times.len());
        for &time in &self.times {
            let time = require_positive("times", time)?;
            // Sub-frame times echo on the next frame
            let delay = input.seconds_to_frames(time).round().max(1.0);
            // Neither the echo nor its feedback can land inside the output
            if delay >= input.frames() as f32 {
                continue;
            }
            let delay_frames = delay as usize;
            taps.push((delay_frames, DelayLine::new(delay_frames, input.channels())?));
        }

        debug!(
            taps = taps.len(),
            feedback,
            frames = input.frames(),
            "mdelay"
        );
        if taps.len() > MANY_TAPS {
            warn!(
                taps = taps.len(),
                "mdelay output is not renormalized; apply gain reduction downstream"
            );
        }

        if taps.is_empty() {
            return Ok(input.clone());
        }

        let channels = input.channels();
        let mut output = input.clone();
        let mut dry = vec![0.0; channels];
        let mut wet = vec![0.0; channels];
        let mut feed = vec![0.0; channels];

        for frame in output.frames_mut() {
            dry.copy_from_slice(frame);
            wet.fill(0.0);

            for (delay_frames, line) in &mut taps {
                for c in 0..channels {
                    let tapped = line.tap(c, *delay_frames);
                    wet[c] += tapped;
                    feed[c] = dry[c] + feedback * tapped;
                }
                line.write(&feed);
            }

            for c in 0..channels {
                frame[c] = dry[c] + wet[c];
            }
        }

        Ok(output)
    }
}

impl Effect for Mdelay {
    fn apply(&self, input: &SampleBuffer, _rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input)
    }

    fn name(&self) -> &'static str {
        "MDelay"
    }
}
