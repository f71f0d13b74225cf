//! Signal builders shared by the unit tests

use crate::buffer::SampleBuffer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Mono sine of `seconds` length
pub fn sine(freq: f32, seconds: f32, sample_rate: u32, amplitude: f32) -> SampleBuffer {
    let frames = (seconds * sample_rate as f32).round() as usize;
    let samples = (0..frames)
        .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * amplitude)
        .collect();
    SampleBuffer::from_interleaved(samples, 1, sample_rate).unwrap()
}

/// Mono unit impulse at frame 0
pub fn impulse(frames: usize, sample_rate: u32) -> SampleBuffer {
    let mut samples = vec![0.0; frames];
    if let Some(first) = samples.first_mut() {
        *first = 1.0;
    }
    SampleBuffer::from_interleaved(samples, 1, sample_rate).unwrap()
}

/// Seeded white noise in [-0.5, 0.5]
pub fn noise(channels: usize, frames: usize, sample_rate: u32, seed: u64) -> SampleBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = (0..frames * channels)
        .map(|_| rng.gen_range(-0.5..=0.5))
        .collect();
    SampleBuffer::from_interleaved(samples, channels, sample_rate).unwrap()
}

/// RMS of one channel over `[start, end)` frames
pub fn rms_range(buffer: &SampleBuffer, channel: usize, start: usize, end: usize) -> f32 {
    let samples: Vec<f32> = (start..end).map(|i| buffer.sample(i, channel)).collect();
    rfx_analysis::level::rms(&samples)
}

/// Count sign changes of one channel over `[start, end)` frames
pub fn zero_crossings(buffer: &SampleBuffer, channel: usize, start: usize, end: usize) -> usize {
    (start + 1..end)
        .filter(|&i| (buffer.sample(i - 1, channel) < 0.0) != (buffer.sample(i, channel) < 0.0))
        .count()
}
