//! Offline audio effects for RFX
//!
//! Every effect reads a [`SampleBuffer`] and returns a new one:
//! - Buffer: interleaved frames with interpolated fractional reads
//! - Control: phase-addressed tables that modulate effect parameters
//! - Effects: variable speed, delays, dynamics, saturation, filters
//! - Timestretcher: phase-vocoder time and pitch manipulation
//! - Config: persisted engine defaults

mod buffer;
mod config;
pub mod control;
mod effects;
mod error;
pub mod fx;
pub mod timestretcher;

#[cfg(test)]
mod test_util;

pub use buffer::{Interpolation, SampleBuffer};
pub use config::FxConfig;
pub use control::{Constant, ControlSource, RandLine, Wavetable, Window, WindowShape};
pub use effects::{
    Biquad, BiquadCoefficients, BiquadState, Chain, Compressor, DcBlocker, Delay, DelayLine,
    Detection, Effect, Envelope, Filter, FilterType, Mdelay, Saturator, Vdelay, Vspeed,
    DEFAULT_DC_BLOCK_CUTOFF_HZ, MANY_TAPS, MIN_SPEED,
};
pub use error::{FxError, Result};
pub use timestretcher::{Mincer, Paulstretch};
