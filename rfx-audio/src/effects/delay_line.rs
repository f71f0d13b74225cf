//! Circular delay line shared by the delay effects.
//!
//! The write cursor advances exactly one frame per `write`, independent of
//! where taps are read.

use crate::buffer::Interpolation;
use crate::error::{FxError, Result};

/// Multichannel circular buffer with fractional taps
pub struct DelayLine {
    /// Interleaved frames
    buffer: Vec<f32>,
    channels: usize,
    /// Length in frames
    capacity: usize,
    /// Write position (in frames, not samples)
    write_pos: usize,
}

impl DelayLine {
    /// Create a line able to tap up to `max_delay_frames` back.
    ///
    /// Two extra frames of headroom keep 4-point interpolation in range at
    /// the maximum delay.
    pub fn new(max_delay_frames: usize, channels: usize) -> Result<Self> {
        let capacity = max_delay_frames
            .checked_add(2)
            .filter(|c| c.checked_mul(channels).is_some())
            .ok_or_else(|| {
                FxError::config("delay", format!("{max_delay_frames} frames is too long"))
            })?;
        Ok(Self {
            buffer: vec![0.0; capacity * channels],
            channels,
            capacity,
            write_pos: 0,
        })
    }

    /// Length in frames
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    /// Sample written `delay` frames ago (1 = the previous frame).
    ///
    /// `delay` is clamped into `1..=capacity`.
    #[inline]
    pub fn tap(&self, channel: usize, delay: usize) -> f32 {
        let delay = delay.clamp(1, self.capacity);
        let frame = (self.write_pos + self.capacity - delay) % self.capacity;
        self.buffer[frame * self.channels + channel]
    }

    /// Interpolated tap at a fractional delay in frames
    #[inline]
    pub fn tap_fractional(&self, channel: usize, delay: f64, interpolation: Interpolation) -> f32 {
        interpolation.interpolate(delay, |k| self.tap(channel, k.max(1) as usize))
    }

    /// Write one frame and advance
    #[inline]
    pub fn write(&mut self, frame: &[f32]) {
        let start = self.write_pos * self.channels;
        self.buffer[start..start + self.channels].copy_from_slice(&frame[..self.channels]);
        self.write_pos = (self.write_pos + 1) % self.capacity;
    }

    /// Clear all stored frames
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
