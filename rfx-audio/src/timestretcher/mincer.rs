//! Granular phase vocoder with independent position and pitch control.
//!
//! Output is built from Hann-windowed synthesis frames spaced `hop = N / 4`
//! apart. Synthesis frame `m` is centred on output frame `m * hop`, and the
//! controls are read at `u = m * hop / output_frames`:
//!
//! - `position(u)` is a fraction of the input duration and picks where the
//!   analysis window sits
//! - `pitch(u)` is the read stride through the input inside the window
//!
//! A second analysis window `hop * pitch` earlier gives each bin's phase
//! advance, which is accumulated into the running synthesis phase so a frozen
//! or slowly moving position still resynthesizes a continuous tone.

use crate::buffer::{Interpolation, SampleBuffer};
use crate::control::ControlSource;
use crate::effects::Effect;
use crate::error::{require_frame_count, require_non_negative, FxError, Result};
use rand::RngCore;
use rfx_analysis::{wrap_phase, OverlapAdd, SpectralFrame, SpectralWindow, Stft};
use tracing::debug;

/// Window size unless configured otherwise
pub const DEFAULT_WINDOW: usize = 2048;

/// Smallest accepted window size
pub const MIN_WINDOW: usize = 64;

/// Hann squared summed at 75% overlap is 1.5
const OVERLAP_GAIN: f32 = 1.0 / 1.5;

/// Phase vocoder driven by position and pitch control sources
pub struct Mincer<'a> {
    /// Output duration in seconds
    pub length: f32,
    /// Read position as a fraction of the input duration
    pub position: &'a dyn ControlSource,
    /// Read stride (1.0 = original pitch)
    pub pitch: &'a dyn ControlSource,
    /// Window size in frames (power of two, >= 64)
    pub window: usize,
    pub interpolation: Interpolation,
}

/// Analysis and accumulated synthesis state for one channel
struct ChannelState {
    current: SpectralFrame,
    previous: SpectralFrame,
    synthesis: SpectralFrame,
    output: OverlapAdd,
}

impl<'a> Mincer<'a> {
    pub fn new(
        length: f32,
        position: &'a dyn ControlSource,
        pitch: &'a dyn ControlSource,
    ) -> Self {
        Self {
            length,
            position,
            pitch,
            window: DEFAULT_WINDOW,
            interpolation: Interpolation::default(),
        }
    }

    /// Set the window size
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set interpolation mode for the strided reads
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    fn validate(&self) -> Result<f32> {
        let length = require_non_negative("length", self.length)?;
        if self.window < MIN_WINDOW || !self.window.is_power_of_two() {
            return Err(FxError::config(
                "window",
                format!(
                    "{} must be a power of two of at least {}",
                    self.window, MIN_WINDOW
                ),
            ));
        }
        Ok(length)
    }

    pub fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let length = self.validate()?;
        let out_frames =
            require_frame_count("length", (length as f64 * input.sample_rate() as f64).round())?;
        let size = self.window;
        let hop = size / 4;
        let centre = size / 2;
        debug!(
            length,
            window = size,
            input_frames = input.frames(),
            out_frames,
            "mincer"
        );

        if out_frames == 0 {
            return Ok(input.silent_like(0));
        }

        let mut stft = Stft::new(size, SpectralWindow::Hann);
        let num_bins = stft.num_bins();
        let mut states: Vec<ChannelState> = (0..input.channels())
            .map(|_| ChannelState {
                current: SpectralFrame::new(num_bins),
                previous: SpectralFrame::new(num_bins),
                synthesis: SpectralFrame::new(num_bins),
                output: OverlapAdd::new(),
            })
            .collect();
        let mut block = vec![0.0; size];
        let mut synthesized = vec![0.0; size];

        let last_u = (out_frames - 1) as f32 / out_frames as f32;
        let input_frames = input.frames() as f64;

        // Every frame that overlaps [0, out_frames)
        let mut m = 0;
        while m * hop < out_frames + centre {
            let u = ((m * hop) as f32 / out_frames as f32).min(last_u);
            let pos = self.position.lookup(u) as f64 * input_frames;
            let stride = self.pitch.lookup(u) as f64;
            if !pos.is_finite() || !stride.is_finite() {
                return Err(FxError::config(
                    "control",
                    format!("non-finite position or pitch at {u}"),
                ));
            }
            let previous_pos = pos - hop as f64 * stride;

            for (ch, state) in states.iter_mut().enumerate() {
                self.fill(input, ch, pos, stride, &mut block);
                stft.analyze(&block, &mut state.current);
                self.fill(input, ch, previous_pos, stride, &mut block);
                stft.analyze(&block, &mut state.previous);

                state
                    .synthesis
                    .magnitudes
                    .copy_from_slice(&state.current.magnitudes);
                if m == 0 {
                    state
                        .synthesis
                        .phases
                        .copy_from_slice(&state.current.phases);
                } else {
                    let advance = state.current.phases.iter().zip(&state.previous.phases);
                    for (phase, (cur, prev)) in state.synthesis.phases.iter_mut().zip(advance) {
                        *phase = wrap_phase(*phase + cur - prev);
                    }
                }

                stft.synthesize(&state.synthesis, &mut synthesized);
                state.output.add(m * hop, &synthesized);
            }
            m += 1;
        }

        // Frame m is centred on acc[m * hop + centre]
        let planar: Vec<Vec<f32>> = states
            .iter()
            .map(|state| {
                let acc = state.output.as_slice();
                (0..out_frames)
                    .map(|j| acc.get(j + centre).copied().unwrap_or(0.0) * OVERLAP_GAIN)
                    .collect()
            })
            .collect();

        SampleBuffer::from_channels(&planar, input.sample_rate())
    }

    /// Strided read of one channel centred on `pos`
    fn fill(&self, input: &SampleBuffer, channel: usize, pos: f64, stride: f64, out: &mut [f32]) {
        let half = (out.len() / 2) as f64;
        for (i, sample) in out.iter_mut().enumerate() {
            let at = pos + (i as f64 - half) * stride;
            *sample = input.read_channel(channel, at, self.interpolation);
        }
    }
}

impl Effect for Mincer<'_> {
    fn apply(&self, input: &SampleBuffer, _rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input)
    }

    fn name(&self) -> &'static str {
        "Mincer"
    }
}
