//! Hyperbolic-tangent waveshaper with optional DC removal.
//!
//! A DC offset added before shaping makes the curve asymmetric, which adds
//! even harmonics and leaves a DC component behind. The optional one-pole
//! DC blocker after the shaper takes it out again.

use super::Effect;
use crate::buffer::SampleBuffer;
use crate::error::{require_below_nyquist, require_finite, require_non_negative, Result};
use rand::RngCore;
use std::f32::consts::PI;
use tracing::debug;

/// Corner frequency of the DC blocker unless configured otherwise
pub const DEFAULT_DC_BLOCK_CUTOFF_HZ: f32 = 10.0;

/// One-pole high-pass: `y[n] = x[n] - x[n-1] + a * y[n-1]`
#[derive(Debug, Default, Clone)]
pub struct DcBlocker {
    x_prev: f32,
    y_prev: f32,
    coeff: f32,
}

impl DcBlocker {
    /// Blocker with its corner at `cutoff_hz`
    pub fn new(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self {
            x_prev: 0.0,
            y_prev: 0.0,
            coeff: (-2.0 * PI * cutoff_hz / sample_rate).exp(),
        }
    }

    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x_prev + self.coeff * self.y_prev;
        self.x_prev = input;
        self.y_prev = output;
        output
    }

    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }
}

/// `tanh(drive * (x + dc_offset))`, optionally DC-blocked
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saturator {
    /// Pre-gain into the curve (>= 0)
    pub drive: f32,
    /// Offset added before shaping
    pub dc_offset: f32,
    /// Run the DC blocker after shaping
    pub dc_block: bool,
    pub dc_block_cutoff_hz: f32,
}

impl Saturator {
    pub fn new(drive: f32, dc_offset: f32, dc_block: bool) -> Self {
        Self {
            drive,
            dc_offset,
            dc_block,
            dc_block_cutoff_hz: DEFAULT_DC_BLOCK_CUTOFF_HZ,
        }
    }

    /// Set the DC blocker corner frequency
    pub fn with_dc_block_cutoff(mut self, cutoff_hz: f32) -> Self {
        self.dc_block_cutoff_hz = cutoff_hz;
        self
    }

    /// Transfer curve for one sample
    #[inline]
    pub fn shape(&self, x: f32) -> f32 {
        (self.drive * (x + self.dc_offset)).tanh()
    }

    pub fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let drive = require_non_negative("drive", self.drive)?;
        let dc_offset = require_finite("dc_offset", self.dc_offset)?;
        if self.dc_block {
            require_below_nyquist(
                "dc_block_cutoff_hz",
                self.dc_block_cutoff_hz,
                input.sample_rate(),
            )?;
        }
        debug!(
            drive,
            dc_offset,
            dc_block = self.dc_block,
            frames = input.frames(),
            "saturator"
        );

        let mut output = input.clone();
        if self.dc_block {
            let blocker = DcBlocker::new(input.sample_rate() as f32, self.dc_block_cutoff_hz);
            let mut blockers = vec![blocker; input.channels()];
            for frame in output.frames_mut() {
                for (sample, blocker) in frame.iter_mut().zip(&mut blockers) {
                    *sample = blocker.process(self.shape(*sample));
                }
            }
        } else {
            for frame in output.frames_mut() {
                for sample in frame.iter_mut() {
                    *sample = self.shape(*sample);
                }
            }
        }

        Ok(output)
    }
}

impl Effect for Saturator {
    fn apply(&self, input: &SampleBuffer, _rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input)
    }

    fn name(&self) -> &'static str {
        "Saturator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{noise, sine};

    fn mean(buffer: &SampleBuffer, start: usize) -> f32 {
        let n = buffer.frames() - start;
        (start..buffer.frames()).map(|i| buffer.sample(i, 0)).sum::<f32>() / n as f32
    }

    #[test]
    fn test_odd_symmetry() {
        let input = noise(2, 1000, 48000, 9);
        let negated = SampleBuffer::from_interleaved(
            input.interleaved().iter().map(|s| -s).collect(),
            2,
            48000,
        )
        .unwrap();

        let sat = Saturator::new(3.0, 0.0, false);
        let a = sat.process(&input).unwrap();
        let b = sat.process(&negated).unwrap();
        for (x, y) in a.interleaved().iter().zip(b.interleaved()) {
            assert!((x + y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bounded_and_monotonic() {
        let ramp: Vec<f32> = (0..2001).map(|i| (i as f32 - 1000.0) / 100.0).collect();
        let input = SampleBuffer::from_interleaved(ramp, 1, 48000).unwrap();
        let output = Saturator::new(50.0, 0.1, false).process(&input).unwrap();

        let samples = output.interleaved();
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        assert!(samples.windows(2).all(|w| w[1] >= w[0]));
        // Hard drive pins the extremes
        assert!(samples[0] < -0.999);
        assert!(samples[2000] > 0.999);
    }

    #[test]
    fn test_zero_drive_silences() {
        let input = noise(1, 100, 48000, 4);
        let output = Saturator::new(0.0, 0.3, false).process(&input).unwrap();
        assert!(output.interleaved().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_dc_block_removes_offset() {
        let input = sine(100.0, 2.0, 8000, 0.5);

        let raw = Saturator::new(1.0, 0.5, false).process(&input).unwrap();
        assert!(mean(&raw, 8000) > 0.2);

        let blocked = Saturator::new(1.0, 0.5, true).process(&input).unwrap();
        assert!(mean(&blocked, 8000).abs() < 0.01);
        assert!(blocked.rms() > 0.1);
    }

    #[test]
    fn test_dc_blocker_settles_to_zero() {
        let mut blocker = DcBlocker::new(48000.0, DEFAULT_DC_BLOCK_CUTOFF_HZ);
        assert!(blocker.coeff() > 0.99 && blocker.coeff() < 1.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = blocker.process(1.0);
        }
        assert!(out.abs() < 1e-3);
        blocker.reset();
        assert_eq!(blocker.process(0.0), 0.0);
    }

    #[test]
    fn test_validation() {
        let input = noise(1, 10, 48000, 1);
        assert!(Saturator::new(-1.0, 0.0, false).process(&input).is_err());
        assert!(Saturator::new(1.0, f32::NAN, false).process(&input).is_err());
        assert!(Saturator::new(1.0, 0.0, true)
            .with_dc_block_cutoff(30000.0)
            .process(&input)
            .is_err());
    }
}
