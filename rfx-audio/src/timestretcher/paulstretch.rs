//! Extreme time-stretching by spectral phase randomization.
//!
//! Each block of input keeps its magnitude spectrum and gets a fresh random
//! phase per bin, which smears the block into a stationary texture. Blocks
//! are read with an input advance of `half / stretch` and written with an
//! output hop of `half`, then overlap-added under a compensation curve that
//! flattens the sum of two overlapping squared windows.

use crate::buffer::SampleBuffer;
use crate::effects::Effect;
use crate::error::{require_frame_count, require_positive, FxError, Result};
use rand::{Rng, RngCore};
use rfx_analysis::{SpectralFrame, SpectralWindow, Stft};
use std::f32::consts::{PI, TAU};
use tracing::debug;

/// Analysis window length unless configured otherwise
pub const DEFAULT_WINDOW_SECS: f32 = 0.25;

/// Smallest window the stretcher will use
const MIN_WINDOW: usize = 16;

/// Largest window the stretcher will use
const MAX_WINDOW: usize = 1 << 24;

/// Paulstretch time stretcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paulstretch {
    /// Output duration over input duration (> 0)
    pub stretch: f32,
    /// Analysis window length in seconds, rounded up to a power of two
    pub window_secs: f32,
}

/// Gain applied to each output half-block
fn compensation_curve(half: usize) -> Vec<f32> {
    let base = (1.0 + 0.5f32.sqrt()) * 0.5;
    (0..half)
        .map(|i| base - (1.0 - base) * (2.0 * PI * i as f32 / half as f32).cos())
        .collect()
}

impl Paulstretch {
    pub fn new(stretch: f32) -> Self {
        Self {
            stretch,
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }

    /// Set the analysis window length in seconds
    pub fn with_window_secs(mut self, window_secs: f32) -> Self {
        self.window_secs = window_secs;
        self
    }

    /// Window size in frames at `sample_rate`, clamped to `16..=2^24`
    pub fn window_size(&self, sample_rate: u32) -> usize {
        let frames = (self.window_secs as f64 * sample_rate as f64).ceil().max(0.0);
        (frames.min(MAX_WINDOW as f64) as usize)
            .next_power_of_two()
            .max(MIN_WINDOW)
    }

    /// Stretch `input`, drawing bin phases from `rng`
    pub fn process<R: Rng + ?Sized>(
        &self,
        input: &SampleBuffer,
        rng: &mut R,
    ) -> Result<SampleBuffer> {
        let stretch = require_positive("stretch", self.stretch)?;
        let window_secs = require_positive("window_secs", self.window_secs)?;
        if window_secs as f64 * input.sample_rate() as f64 > MAX_WINDOW as f64 {
            return Err(FxError::config(
                "window_secs",
                format!("{window_secs}s exceeds {MAX_WINDOW} frames"),
            ));
        }

        let frames = input.frames();
        let out_frames =
            require_frame_count("stretch", (frames as f64 * stretch as f64).round())?;
        let size = self.window_size(input.sample_rate());
        let half = size / 2;
        debug!(stretch, window = size, frames, out_frames, "paulstretch");

        if out_frames == 0 {
            return Ok(input.silent_like(0));
        }

        let channels = input.channels();
        let mut stft = Stft::new(size, SpectralWindow::Paulstretch);
        let mut spectrum = SpectralFrame::new(stft.num_bins());
        let mut phases = vec![0.0; stft.num_bins()];
        let mut block = vec![0.0; size];
        let mut synthesized = vec![0.0; size];
        let compensation = compensation_curve(half);

        // Second half of the previous block, per channel
        let mut tails = vec![vec![0.0; half]; channels];
        let mut planar: Vec<Vec<f32>> = (0..channels)
            .map(|_| Vec::with_capacity(out_frames))
            .collect();

        let advance = half as f64 / stretch as f64;
        let mut start = 0.0f64;
        let mut written = 0;

        while written < out_frames {
            // Shared across channels to keep the stereo image
            for phase in phases.iter_mut() {
                *phase = rng.gen_range(0.0..TAU);
            }

            let offset = start.floor() as usize;
            let count = half.min(out_frames - written);

            for (ch, (tail, out)) in tails.iter_mut().zip(&mut planar).enumerate() {
                for (i, sample) in block.iter_mut().enumerate() {
                    *sample = input.sample(offset + i, ch);
                }
                stft.analyze(&block, &mut spectrum);
                spectrum.phases.copy_from_slice(&phases);
                stft.synthesize(&spectrum, &mut synthesized);

                out.extend(
                    synthesized[..count]
                        .iter()
                        .zip(tail.iter())
                        .zip(&compensation)
                        .map(|((&head, &prev), &gain)| (head + prev) * gain),
                );
                tail.copy_from_slice(&synthesized[half..]);
            }

            written += count;
            start += advance;
        }

        SampleBuffer::from_channels(&planar, input.sample_rate())
    }
}

impl Effect for Paulstretch {
    fn apply(&self, input: &SampleBuffer, rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input, rng)
    }

    fn name(&self) -> &'static str {
        "Paulstretch"
    }
}
