//! Level measurement and decibel conversion

/// Floor returned for silent or negative input
pub const SILENCE_DB: f32 = -200.0;

/// Convert dB to linear gain
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Convert linear magnitude to dB
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear > 1e-10 {
        20.0 * linear.log10()
    } else {
        SILENCE_DB
    }
}

/// Largest absolute sample value
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}

/// Root mean square of the samples (0.0 for an empty slice)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_conversion() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-6.0206) - 0.5).abs() < 1e-4);
        assert!((linear_to_db(1.0)).abs() < 1e-6);
        assert!((linear_to_db(0.1) + 20.0).abs() < 1e-4);
        assert_eq!(linear_to_db(0.0), SILENCE_DB);
    }

    #[test]
    fn test_peak_and_rms() {
        let samples = [0.5, -1.0, 0.25, 0.0];
        assert_eq!(peak(&samples), 1.0);
        assert_eq!(peak(&[]), 0.0);

        let square = [1.0, -1.0, 1.0, -1.0];
        assert!((rms(&square) - 1.0).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }
}
