//! Biquad filter cascades (low-pass, high-pass, band-pass, band-reject)
//!
//! Coefficients follow the RBJ audio EQ cookbook, normalized by `a0`.
//! Low/high-pass run two sections with Butterworth Q values for a 4th-order
//! maximally flat response. Band-pass and band-reject run two identical
//! Q = 1 sections.

use super::Effect;
use crate::buffer::SampleBuffer;
use crate::error::{require_below_nyquist, require_positive, Result};
use rand::RngCore;
use tracing::debug;

/// Q values of the two sections of a 4th-order Butterworth
const BUTTERWORTH_QS: [f32; 2] = [0.541_196_1, 1.306_563];

/// Q of each band-pass/band-reject section
const BAND_Q: f32 = 1.0;

/// Filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    LowPass,
    HighPass,
    /// Constant 0 dB peak gain at the centre frequency
    BandPass,
    /// Notch at the centre frequency
    BandReject,
}

impl FilterType {
    /// Q of every cascaded section
    pub fn section_qs(self) -> [f32; 2] {
        match self {
            FilterType::LowPass | FilterType::HighPass => BUTTERWORTH_QS,
            FilterType::BandPass | FilterType::BandReject => [BAND_Q; 2],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterType::LowPass => "LP Filter",
            FilterType::HighPass => "HP Filter",
            FilterType::BandPass => "BP Filter",
            FilterType::BandReject => "BR Filter",
        }
    }
}

/// Normalized biquad coefficients (`a0` divided out)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Pass-through section
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Cookbook design for one section
    pub fn design(filter_type: FilterType, frequency: f32, q: f32, sample_rate: f32) -> Self {
        // f64 keeps low corner frequencies stable
        let omega = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q as f64);

        let (b0, b1, b2) = match filter_type {
            FilterType::LowPass => {
                let b = (1.0 - cos_omega) / 2.0;
                (b, 1.0 - cos_omega, b)
            }
            FilterType::HighPass => {
                let b = (1.0 + cos_omega) / 2.0;
                (b, -(1.0 + cos_omega), b)
            }
            FilterType::BandPass => (alpha, 0.0, -alpha),
            FilterType::BandReject => (1.0, -2.0 * cos_omega, 1.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        }
    }
}

/// Direct form I memory for one channel of one section
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    #[inline]
    pub fn process(&mut self, input: f32, c: &BiquadCoefficients) -> f32 {
        let output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

/// One biquad section with independent state per channel
#[derive(Debug, Clone)]
pub struct Biquad {
    coefficients: BiquadCoefficients,
    states: Vec<BiquadState>,
}

impl Biquad {
    pub fn new(coefficients: BiquadCoefficients, channels: usize) -> Self {
        Self {
            coefficients,
            states: vec![BiquadState::default(); channels],
        }
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    /// Filter one interleaved frame in place
    #[inline]
    pub fn process_frame(&mut self, frame: &mut [f32]) {
        for (sample, state) in frame.iter_mut().zip(&mut self.states) {
            *sample = state.process(*sample, &self.coefficients);
        }
    }
}

/// Fixed-order filter at a corner or centre frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Filter {
    pub filter_type: FilterType,
    /// Corner (low/high-pass) or centre (band) frequency in Hz
    pub frequency: f32,
}

impl Filter {
    pub fn new(filter_type: FilterType, frequency: f32) -> Self {
        Self {
            filter_type,
            frequency,
        }
    }

    /// Sections for a given sample rate, validating the frequency
    pub fn sections(&self, sample_rate: u32, channels: usize) -> Result<Vec<Biquad>> {
        let frequency = require_positive("frequency", self.frequency)?;
        let frequency = require_below_nyquist("frequency", frequency, sample_rate)?;
        Ok(self
            .filter_type
            .section_qs()
            .iter()
            .map(|&q| {
                let coefficients =
                    BiquadCoefficients::design(self.filter_type, frequency, q, sample_rate as f32);
                Biquad::new(coefficients, channels)
            })
            .collect())
    }

    /// Single forward pass through every section
    pub fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let mut sections = self.sections(input.sample_rate(), input.channels())?;
        debug!(
            filter = self.filter_type.name(),
            frequency = self.frequency,
            sections = sections.len(),
            frames = input.frames(),
            "filter"
        );

        let mut output = input.clone();
        for frame in output.frames_mut() {
            for section in &mut sections {
                section.process_frame(frame);
            }
        }
        Ok(output)
    }
}

impl Effect for Filter {
    fn apply(&self, input: &SampleBuffer, _rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input)
    }

    fn name(&self) -> &'static str {
        self.filter_type.name()
    }
}
