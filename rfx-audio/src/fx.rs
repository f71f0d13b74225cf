//! One-call wrappers around the effect structs.
//!
//! Each function builds the effect with default settings and runs it once.
//! Use the structs (or [`crate::FxConfig`]) for interpolation, window sizes
//! and detection modes.

use crate::buffer::SampleBuffer;
use crate::control::{ControlSource, Wavetable};
use crate::effects::{
    Compressor, Delay, Envelope, Filter, FilterType, Mdelay, Saturator, Vdelay, Vspeed,
};
use crate::error::Result;
use crate::timestretcher::{Mincer, Paulstretch};
use rand::Rng;

/// Variable-speed playback between `min_speed` and `max_speed`
pub fn vspeed(
    buffer: &SampleBuffer,
    control: &dyn ControlSource,
    min_speed: f32,
    max_speed: f32,
) -> Result<SampleBuffer> {
    Vspeed::new(control, min_speed, max_speed).process(buffer)
}

/// Feedback echo with a fixed delay time in seconds
pub fn delay(buffer: &SampleBuffer, time: f32, feedback: f32) -> Result<SampleBuffer> {
    Delay::new(time, feedback).process(buffer)
}

/// Feedback echo with a modulated delay time in seconds
pub fn vdelay(
    buffer: &SampleBuffer,
    control: &dyn ControlSource,
    min_time: f32,
    max_time: f32,
    feedback: f32,
) -> Result<SampleBuffer> {
    Vdelay::new(control, min_time, max_time, feedback).process(buffer)
}

/// Independent feedback echoes, one per entry of `times`
pub fn mdelay(buffer: &SampleBuffer, times: &[f32], feedback: f32) -> Result<SampleBuffer> {
    Mdelay::new(times.to_vec(), feedback).process(buffer)
}

/// Linked-detection downward compressor
pub fn compressor(
    buffer: &SampleBuffer,
    ratio: f32,
    threshold_db: f32,
    attack: f32,
    release: f32,
) -> Result<SampleBuffer> {
    Compressor::new(ratio, threshold_db, attack, release).process(buffer)
}

/// Amplitude envelope as a control table
pub fn envelope(buffer: &SampleBuffer, attack: f32, release: f32) -> Result<Wavetable> {
    Envelope::new(attack, release).extract(buffer)
}

/// `tanh` waveshaper
pub fn saturator(
    buffer: &SampleBuffer,
    drive: f32,
    dc_offset: f32,
    dc_block: bool,
) -> Result<SampleBuffer> {
    Saturator::new(drive, dc_offset, dc_block).process(buffer)
}

/// 4th-order Butterworth low-pass
pub fn lpf(buffer: &SampleBuffer, frequency: f32) -> Result<SampleBuffer> {
    Filter::new(FilterType::LowPass, frequency).process(buffer)
}

/// 4th-order Butterworth high-pass
pub fn hpf(buffer: &SampleBuffer, frequency: f32) -> Result<SampleBuffer> {
    Filter::new(FilterType::HighPass, frequency).process(buffer)
}

/// Two-section band-pass
pub fn bpf(buffer: &SampleBuffer, frequency: f32) -> Result<SampleBuffer> {
    Filter::new(FilterType::BandPass, frequency).process(buffer)
}

/// Two-section band-reject
pub fn brf(buffer: &SampleBuffer, frequency: f32) -> Result<SampleBuffer> {
    Filter::new(FilterType::BandReject, frequency).process(buffer)
}

/// Paulstretch by `stretch`, drawing phases from `rng`
pub fn paulstretch<R: Rng + ?Sized>(
    buffer: &SampleBuffer,
    stretch: f32,
    rng: &mut R,
) -> Result<SampleBuffer> {
    Paulstretch::new(stretch).process(buffer, rng)
}

/// Phase vocoder output of `length` seconds
pub fn mincer(
    buffer: &SampleBuffer,
    length: f32,
    position: &dyn ControlSource,
    pitch: &dyn ControlSource,
) -> Result<SampleBuffer> {
    Mincer::new(length, position, pitch).process(buffer)
}
