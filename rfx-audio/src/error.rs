//! Error type shared by buffers and effects

use thiserror::Error;

/// Errors that can occur while building buffers or applying effects
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    /// A parameter is outside its valid domain
    #[error("invalid {param}: {reason}")]
    Configuration { param: &'static str, reason: String },
    /// Two buffers (or a buffer and a frame) disagree on channel count
    #[error("channel mismatch: expected {expected} channels, found {found}")]
    ChannelMismatch { expected: usize, found: usize },
    /// Processing cannot make progress with the given inputs
    #[error("invalid state: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, FxError>;

impl FxError {
    pub(crate) fn config(param: &'static str, reason: impl Into<String>) -> Self {
        FxError::Configuration {
            param,
            reason: reason.into(),
        }
    }
}

pub(crate) fn require_finite(param: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FxError::config(param, format!("{value} is not finite")))
    }
}

pub(crate) fn require_non_negative(param: &'static str, value: f32) -> Result<f32> {
    let value = require_finite(param, value)?;
    if value < 0.0 {
        return Err(FxError::config(param, format!("{value} is negative")));
    }
    Ok(value)
}

pub(crate) fn require_positive(param: &'static str, value: f32) -> Result<f32> {
    let value = require_finite(param, value)?;
    if value <= 0.0 {
        return Err(FxError::config(param, format!("{value} must be greater than 0")));
    }
    Ok(value)
}

/// Feedback must stay strictly inside (-1, 1) for bounded output
pub(crate) fn require_feedback(value: f32) -> Result<f32> {
    let value = require_finite("feedback", value)?;
    if value.abs() >= 1.0 {
        return Err(FxError::config(
            "feedback",
            format!("|{value}| must be below 1.0"),
        ));
    }
    Ok(value)
}

/// Longest buffer an effect will produce, in frames
pub(crate) const MAX_FRAMES: usize = 1 << 31;

/// A frame count computed from user parameters, bounded by [`MAX_FRAMES`]
pub(crate) fn require_frame_count(param: &'static str, frames: f64) -> Result<usize> {
    if !frames.is_finite() || frames < 0.0 || frames > MAX_FRAMES as f64 {
        return Err(FxError::config(
            param,
            format!("{frames} frames is outside 0..={MAX_FRAMES}"),
        ));
    }
    Ok(frames as usize)
}

pub(crate) fn require_below_nyquist(
    param: &'static str,
    frequency: f32,
    sample_rate: u32,
) -> Result<f32> {
    let frequency = require_positive(param, frequency)?;
    let nyquist = sample_rate as f32 / 2.0;
    if frequency >= nyquist {
        return Err(FxError::config(
            param,
            format!("{frequency} Hz is at or above Nyquist ({nyquist} Hz)"),
        ));
    }
    Ok(frequency)
}
