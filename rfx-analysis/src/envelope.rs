//! One-pole envelope follower with separate attack and release times.
//!
//! The follower moves toward its target with the attack coefficient while
//! the target is above the current envelope and with the release
//! coefficient otherwise. With a non-negative target the envelope never
//! goes negative.

/// Per-sample smoothing coefficient for a time constant in seconds.
///
/// A zero (or negative) time constant yields 0.0, i.e. the follower jumps
/// straight to its target.
#[inline]
pub fn time_constant_coeff(seconds: f32, sample_rate: f32) -> f32 {
    if seconds > 0.0 && sample_rate > 0.0 {
        (-1.0 / (sample_rate * seconds)).exp()
    } else {
        0.0
    }
}

/// Amplitude envelope follower
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
}

impl EnvelopeFollower {
    /// Create a follower with attack/release times in seconds
    pub fn new(sample_rate: f32, attack_secs: f32, release_secs: f32) -> Self {
        Self::from_coefficients(
            time_constant_coeff(attack_secs, sample_rate),
            time_constant_coeff(release_secs, sample_rate),
        )
    }

    /// Create a follower from raw smoothing coefficients (0.0 - <1.0)
    pub fn from_coefficients(attack_coeff: f32, release_coeff: f32) -> Self {
        Self {
            attack_coeff: attack_coeff.clamp(0.0, 1.0),
            release_coeff: release_coeff.clamp(0.0, 1.0),
            envelope: 0.0,
        }
    }

    /// Track the magnitude of an input sample, returning the new envelope
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.follow(input.abs())
    }

    /// Move toward a non-negative target, returning the new envelope
    #[inline]
    pub fn follow(&mut self, target: f32) -> f32 {
        let coeff = if target > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * target;
        self.envelope
    }

    /// Current envelope value
    #[inline]
    pub fn value(&self) -> f32 {
        self.envelope
    }

    pub fn attack_coeff(&self) -> f32 {
        self.attack_coeff
    }

    pub fn release_coeff(&self) -> f32 {
        self.release_coeff
    }

    /// Reset the envelope to zero
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_time_tracks_instantly() {
        let mut env = EnvelopeFollower::new(48000.0, 0.0, 0.0);
        assert_eq!(env.process(0.8), 0.8);
        assert_eq!(env.process(-0.3), 0.3);
        assert_eq!(env.process(0.0), 0.0);
    }

    #[test]
    fn test_attack_faster_than_release() {
        let mut env = EnvelopeFollower::new(48000.0, 0.001, 0.5);

        // 10ms of full-scale input: attack time constant is 1ms, so fully risen
        for _ in 0..480 {
            env.process(1.0);
        }
        assert!(env.value() > 0.99, "envelope {}", env.value());

        // 10ms of silence: release of 500ms barely moves
        for _ in 0..480 {
            env.process(0.0);
        }
        assert!(env.value() > 0.95, "envelope {}", env.value());
    }

    #[test]
    fn test_time_constant_reaches_63_percent() {
        let sample_rate = 1000.0;
        let mut env = EnvelopeFollower::new(sample_rate, 0.1, 0.1);
        for _ in 0..100 {
            env.process(1.0);
        }
        let expected = 1.0 - (-1.0f32).exp();
        assert!((env.value() - expected).abs() < 0.01, "envelope {}", env.value());
    }

    #[test]
    fn test_envelope_never_negative() {
        let mut env = EnvelopeFollower::new(44100.0, 0.01, 0.05);
        for i in 0..2000 {
            let x = ((i as f32) * 0.37).sin() * if i % 3 == 0 { -1.0 } else { 1.0 };
            assert!(env.process(x) >= 0.0);
        }
    }

    #[test]
    fn test_reset() {
        let mut env = EnvelopeFollower::new(48000.0, 0.0, 1.0);
        env.process(1.0);
        assert!(env.value() > 0.0);
        env.reset();
        assert_eq!(env.value(), 0.0);
    }
}
