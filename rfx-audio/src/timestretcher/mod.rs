//! Phase-vocoder time and pitch manipulation.
//!
//! Both processors run on the windowed FFT from `rfx_analysis::Stft`:
//!
//! - [`Mincer`] resynthesizes windows picked by a position control at a
//!   stride set by a pitch control, keeping phases continuous between frames
//! - [`Paulstretch`] replaces every bin phase with a random one for very
//!   large stretch factors

mod mincer;
mod paulstretch;

pub use mincer::{Mincer, DEFAULT_WINDOW as DEFAULT_MINCER_WINDOW, MIN_WINDOW as MIN_MINCER_WINDOW};
pub use paulstretch::{Paulstretch, DEFAULT_WINDOW_SECS as DEFAULT_PAULSTRETCH_WINDOW_SECS};
