//! Dynamics: envelope extraction and a feed-forward compressor.
//!
//! Both run the same one-pole attack/release follower from the analysis
//! crate. The compressor runs it twice: once on the signal level and once on
//! the resulting gain reduction, so gain changes are smoothed with the same
//! time constants.

use super::Effect;
use crate::buffer::SampleBuffer;
use crate::control::Wavetable;
use crate::error::{require_finite, require_non_negative, FxError, Result};
use rand::RngCore;
use rfx_analysis::{db_to_linear, linear_to_db, EnvelopeFollower};
use tracing::debug;

/// How the compressor measures level on multichannel input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detection {
    /// Peak across all channels drives one shared gain (keeps the stereo image)
    #[default]
    Linked,
    /// Each channel is detected and attenuated on its own
    PerChannel,
}

/// Downward compressor with hard knee
#[derive(Debug, Clone, PartialEq)]
pub struct Compressor {
    /// Input/output slope above threshold (>= 1)
    pub ratio: f32,
    /// Threshold in dBFS
    pub threshold_db: f32,
    /// Attack time in seconds
    pub attack: f32,
    /// Release time in seconds
    pub release: f32,
    pub detection: Detection,
}

/// Level detector plus gain smoother for one detection channel
struct GainComputer {
    level: EnvelopeFollower,
    reduction: EnvelopeFollower,
    threshold_db: f32,
    slope: f32,
}

impl GainComputer {
    fn new(sample_rate: f32, compressor: &Compressor) -> Self {
        Self {
            level: EnvelopeFollower::new(sample_rate, compressor.attack, compressor.release),
            reduction: EnvelopeFollower::new(sample_rate, compressor.attack, compressor.release),
            threshold_db: compressor.threshold_db,
            slope: 1.0 - 1.0 / compressor.ratio,
        }
    }

    /// Linear gain for the next frame given its detected magnitude
    #[inline]
    fn gain(&mut self, magnitude: f32) -> f32 {
        let level_db = linear_to_db(self.level.process(magnitude));
        let target = if level_db > self.threshold_db {
            (level_db - self.threshold_db) * self.slope
        } else {
            0.0
        };
        // Reduction rising is the attack phase
        db_to_linear(-self.reduction.follow(target))
    }
}

impl Compressor {
    pub fn new(ratio: f32, threshold_db: f32, attack: f32, release: f32) -> Self {
        Self {
            ratio,
            threshold_db,
            attack,
            release,
            detection: Detection::default(),
        }
    }

    /// Set the detection mode
    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.detection = detection;
        self
    }

    fn validate(&self) -> Result<()> {
        let ratio = require_finite("ratio", self.ratio)?;
        if ratio < 1.0 {
            return Err(FxError::config("ratio", format!("{ratio} is below 1.0")));
        }
        require_finite("threshold_db", self.threshold_db)?;
        require_non_negative("attack", self.attack)?;
        require_non_negative("release", self.release)?;
        Ok(())
    }

    pub fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        self.validate()?;
        debug!(
            ratio = self.ratio,
            threshold_db = self.threshold_db,
            attack = self.attack,
            release = self.release,
            detection = ?self.detection,
            frames = input.frames(),
            "compressor"
        );

        if self.ratio == 1.0 {
            return Ok(input.clone());
        }

        let sample_rate = input.sample_rate() as f32;
        let mut output = input.clone();

        match self.detection {
            Detection::Linked => {
                let mut computer = GainComputer::new(sample_rate, self);
                for frame in output.frames_mut() {
                    let peak = frame.iter().fold(0.0f32, |m, s| m.max(s.abs()));
                    let gain = computer.gain(peak);
                    for sample in frame.iter_mut() {
                        *sample *= gain;
                    }
                }
            }
            Detection::PerChannel => {
                let mut computers: Vec<GainComputer> = (0..input.channels())
                    .map(|_| GainComputer::new(sample_rate, self))
                    .collect();
                for frame in output.frames_mut() {
                    for (sample, computer) in frame.iter_mut().zip(&mut computers) {
                        *sample *= computer.gain(sample.abs());
                    }
                }
            }
        }

        Ok(output)
    }
}

impl Effect for Compressor {
    fn apply(&self, input: &SampleBuffer, _rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        self.process(input)
    }

    fn name(&self) -> &'static str {
        "Compressor"
    }
}

/// Amplitude envelope extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Attack time in seconds
    pub attack: f32,
    /// Release time in seconds
    pub release: f32,
}

impl Envelope {
    pub fn new(attack: f32, release: f32) -> Self {
        Self { attack, release }
    }

    /// Follow the per-frame peak across channels, one table point per frame
    pub fn extract(&self, input: &SampleBuffer) -> Result<Wavetable> {
        let attack = require_non_negative("attack", self.attack)?;
        let release = require_non_negative("release", self.release)?;
        if input.is_empty() {
            return Err(FxError::config("buffer", "cannot follow an empty buffer"));
        }
        debug!(attack, release, frames = input.frames(), "envelope");

        let mut follower = EnvelopeFollower::new(input.sample_rate() as f32, attack, release);
        let values = input
            .frames_iter()
            .map(|frame| follower.process(frame.iter().fold(0.0f32, |m, s| m.max(s.abs()))))
            .collect();
        Wavetable::new(values)
    }
}
