//! Signal analysis module for RFX
//!
//! Buffer-agnostic building blocks that operate on plain `f32` slices:
//! envelope following, level/dB measurement, and the windowed STFT used by
//! the phase-vocoder effects.

mod envelope;
pub mod level;
mod stft;

pub use envelope::{time_constant_coeff, EnvelopeFollower};
pub use level::{db_to_linear, linear_to_db};
pub use stft::{wrap_phase, OverlapAdd, SpectralFrame, SpectralWindow, Stft};
