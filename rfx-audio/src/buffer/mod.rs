//! Multichannel sample buffer and interpolated reads.
//!
//! Samples are stored interleaved (`L,R,L,R,...` for stereo). The buffer
//! behaves as if padded with silent frames on both sides: reads before the
//! first frame or after the last one return 0.0, and fractional reads near an
//! edge interpolate toward silence.

mod interpolation;

pub use interpolation::Interpolation;

use crate::error::{FxError, Result};
use rfx_analysis::level;

/// Owned multichannel audio with a fixed channel count and sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Interleaved samples
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create an empty buffer
    pub fn new(channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(FxError::config("channels", "a buffer needs at least one channel"));
        }
        if sample_rate == 0 {
            return Err(FxError::config("sample_rate", "must be greater than 0"));
        }
        Ok(Self {
            samples: Vec::new(),
            channels,
            sample_rate,
        })
    }

    /// Create a buffer of `frames` silent frames
    pub fn silence(channels: usize, sample_rate: u32, frames: usize) -> Result<Self> {
        let mut buffer = Self::new(channels, sample_rate)?;
        buffer.samples = vec![0.0; frames * channels];
        Ok(buffer)
    }

    /// Wrap interleaved samples
    pub fn from_interleaved(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Result<Self> {
        let mut buffer = Self::new(channels, sample_rate)?;
        if samples.len() % channels != 0 {
            return Err(FxError::config(
                "samples",
                format!(
                    "{} samples do not divide into {} channels",
                    samples.len(),
                    channels
                ),
            ));
        }
        buffer.samples = samples;
        Ok(buffer)
    }

    /// Interleave planar channel data (all channels must have the same length)
    pub fn from_channels(planar: &[Vec<f32>], sample_rate: u32) -> Result<Self> {
        let mut buffer = Self::new(planar.len(), sample_rate)?;
        let frames = planar[0].len();
        if let Some(bad) = planar.iter().find(|c| c.len() != frames) {
            return Err(FxError::config(
                "channels",
                format!("channel lengths differ ({} vs {})", frames, bad.len()),
            ));
        }

        buffer.samples.reserve(frames * planar.len());
        for i in 0..frames {
            buffer.samples.extend(planar.iter().map(|c| c[i]));
        }
        Ok(buffer)
    }

    /// Silent buffer with the same channel count and sample rate
    pub(crate) fn silent_like(&self, frames: usize) -> Self {
        Self {
            samples: vec![0.0; frames * self.channels],
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Number of frames
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Convert seconds to a (fractional) frame count at this sample rate
    #[inline]
    pub fn seconds_to_frames(&self, seconds: f32) -> f32 {
        seconds * self.sample_rate as f32
    }

    /// One frame (one sample per channel)
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.channels)?;
        self.samples.get(start..start + self.channels)
    }

    /// Sample at `frame`/`channel`; silence outside the buffer
    #[inline]
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        if channel >= self.channels || frame >= self.frames() {
            return 0.0;
        }
        self.samples[frame * self.channels + channel]
    }

    /// Signed-index fetch used by the interpolators
    #[inline]
    fn fetch(&self, frame: isize, channel: usize) -> f32 {
        if frame < 0 {
            0.0
        } else {
            self.sample(frame as usize, channel)
        }
    }

    /// Planar copy of one channel
    pub fn channel(&self, channel: usize) -> Vec<f32> {
        if channel >= self.channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels)
            .copied()
            .collect()
    }

    /// Iterate over frames
    pub fn frames_iter(&self) -> std::slice::ChunksExact<'_, f32> {
        self.samples.chunks_exact(self.channels)
    }

    /// Iterate mutably over frames
    pub(crate) fn frames_mut(&mut self) -> std::slice::ChunksExactMut<'_, f32> {
        self.samples.chunks_exact_mut(self.channels)
    }

    /// Interleaved sample data
    #[inline]
    pub fn interleaved(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_interleaved(self) -> Vec<f32> {
        self.samples
    }

    /// Append a single frame
    pub fn push_frame(&mut self, frame: &[f32]) -> Result<()> {
        if frame.len() != self.channels {
            return Err(FxError::ChannelMismatch {
                expected: self.channels,
                found: frame.len(),
            });
        }
        self.samples.extend_from_slice(frame);
        Ok(())
    }

    /// Append another buffer's frames
    pub fn append(&mut self, other: &SampleBuffer) -> Result<()> {
        self.check_compatible(other)?;
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// New buffer holding `self` followed by `other`
    pub fn concat(&self, other: &SampleBuffer) -> Result<SampleBuffer> {
        let mut out = self.clone();
        out.append(other)?;
        Ok(out)
    }

    fn check_compatible(&self, other: &SampleBuffer) -> Result<()> {
        if other.channels != self.channels {
            return Err(FxError::ChannelMismatch {
                expected: self.channels,
                found: other.channels,
            });
        }
        if other.sample_rate != self.sample_rate {
            return Err(FxError::config(
                "sample_rate",
                format!(
                    "cannot combine {} Hz with {} Hz",
                    self.sample_rate, other.sample_rate
                ),
            ));
        }
        Ok(())
    }

    /// Interpolated read of one channel at a fractional frame position
    #[inline]
    pub fn read_channel(&self, channel: usize, pos: f64, interpolation: Interpolation) -> f32 {
        interpolation.interpolate(pos, |i| self.fetch(i, channel))
    }

    /// Interpolated read of a whole frame into `out` (one slot per channel)
    pub fn read_into(&self, pos: f64, interpolation: Interpolation, out: &mut [f32]) {
        for (c, slot) in out.iter_mut().enumerate().take(self.channels) {
            *slot = self.read_channel(c, pos, interpolation);
        }
    }

    /// Interpolated read of a whole frame
    pub fn read(&self, pos: f64, interpolation: Interpolation) -> Vec<f32> {
        let mut frame = vec![0.0; self.channels];
        self.read_into(pos, interpolation, &mut frame);
        frame
    }

    /// Largest absolute sample value over all channels
    pub fn peak(&self) -> f32 {
        level::peak(&self.samples)
    }

    /// RMS over all channels
    pub fn rms(&self) -> f32 {
        level::rms(&self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp() -> SampleBuffer {
        // L = 0,1,2,3  R = 0,-1,-2,-3
        SampleBuffer::from_channels(
            &[vec![0.0, 1.0, 2.0, 3.0], vec![0.0, -1.0, -2.0, -3.0]],
            48000,
        )
        .unwrap()
    }

    #[test]
    fn test_construction_validation() {
        assert!(SampleBuffer::new(0, 48000).is_err());
        assert!(SampleBuffer::new(2, 0).is_err());
        assert!(SampleBuffer::from_interleaved(vec![0.0; 3], 2, 48000).is_err());
        assert!(SampleBuffer::from_channels(&[vec![0.0; 3], vec![0.0; 2]], 48000).is_err());

        let buf = SampleBuffer::silence(2, 44100, 44100).unwrap();
        assert_eq!(buf.frames(), 44100);
        assert!((buf.duration() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_interleaving() {
        let buf = stereo_ramp();
        assert_eq!(buf.frames(), 4);
        assert_eq!(buf.frame(1), Some(&[1.0, -1.0][..]));
        assert_eq!(buf.frame(4), None);
        assert_eq!(buf.channel(1), vec![0.0, -1.0, -2.0, -3.0]);
        assert_eq!(buf.interleaved()[..4], [0.0, 0.0, 1.0, -1.0]);
    }

    #[test]
    fn test_fractional_read() {
        let buf = stereo_ramp();
        let frame = buf.read(1.5, Interpolation::Linear);
        assert!((frame[0] - 1.5).abs() < 1e-6);
        assert!((frame[1] + 1.5).abs() < 1e-6);

        // Integer reads are exact
        assert_eq!(buf.read(2.0, Interpolation::Lagrange), vec![2.0, -2.0]);
    }

    #[test]
    fn test_out_of_range_reads_are_silent() {
        let buf = stereo_ramp();
        assert_eq!(buf.read(-5.0, Interpolation::Linear), vec![0.0, 0.0]);
        assert_eq!(buf.read(10.0, Interpolation::Lagrange), vec![0.0, 0.0]);
        assert_eq!(buf.sample(100, 0), 0.0);
        assert_eq!(buf.sample(0, 7), 0.0);

        // Half a frame past the end interpolates toward silence
        let frame = buf.read(3.5, Interpolation::Linear);
        assert!((frame[0] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_append_and_concat() {
        let a = stereo_ramp();
        let b = stereo_ramp();
        let joined = a.concat(&b).unwrap();
        assert_eq!(joined.frames(), 8);
        assert_eq!(joined.frame(5), Some(&[1.0, -1.0][..]));

        let mono = SampleBuffer::silence(1, 48000, 4).unwrap();
        assert_eq!(
            a.concat(&mono),
            Err(FxError::ChannelMismatch {
                expected: 2,
                found: 1
            })
        );

        let other_rate = SampleBuffer::silence(2, 44100, 4).unwrap();
        assert!(matches!(
            a.concat(&other_rate),
            Err(FxError::Configuration { param: "sample_rate", .. })
        ));
    }

    #[test]
    fn test_push_frame_checks_width() {
        let mut buf = SampleBuffer::new(2, 48000).unwrap();
        buf.push_frame(&[0.5, -0.5]).unwrap();
        assert_eq!(buf.frames(), 1);
        assert!(buf.push_frame(&[0.5]).is_err());
        assert_eq!(buf.frames(), 1);
    }

    #[test]
    fn test_levels() {
        let buf = stereo_ramp();
        assert_eq!(buf.peak(), 3.0);
        assert!(buf.rms() > 0.0);
    }
}
