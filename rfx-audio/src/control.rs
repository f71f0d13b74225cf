//! Control sources - interpolated lookup tables that drive modulation.
//!
//! Every source is addressed by a fractional phase. Phases wrap into [0, 1)
//! and tables are read with linear interpolation between the two nearest
//! stored points, so a lookup can never go out of bounds.

use crate::buffer::SampleBuffer;
use crate::error::{require_finite, FxError, Result};
use rand::Rng;
use std::f32::consts::PI;

/// A time-varying scalar addressed by phase
pub trait ControlSource: Send + Sync {
    /// Value at `phase` (wrapped into [0, 1))
    fn lookup(&self, phase: f32) -> f32;
}

/// Wrap any finite phase into [0, 1)
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase - phase.floor();
    // Tiny negative phases round up to exactly 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Linear lookup over a non-empty table spanning phase 0 to 1
#[inline]
fn table_lookup(table: &[f32], phase: f32) -> f32 {
    let last = table.len() - 1;
    let pos = wrap_phase(phase) * last as f32;
    let i = (pos as usize).min(last);
    let frac = pos - i as f32;
    let a = table[i];
    if i == last || frac == 0.0 {
        return a;
    }
    a + (table[i + 1] - a) * frac
}

fn check_table(values: &[f32]) -> Result<()> {
    if values.is_empty() {
        return Err(FxError::config("table", "a control table needs at least one point"));
    }
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(FxError::config("table", format!("contains non-finite value {v}")));
    }
    Ok(())
}

/// The same value at every phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f32);

impl ControlSource for Constant {
    #[inline]
    fn lookup(&self, _phase: f32) -> f32 {
        self.0
    }
}

/// Fixed window shapes, each spanning one full cycle over phase 0 to 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum WindowShape {
    /// Half sine hump, 0 → 1 → 0
    #[default]
    Sine,
    /// Raised cosine, 0 → 1 → 0
    Hann,
    /// Linear 0 → 1 → 0
    Triangle,
    /// Rising ramp 0 → 1
    Saw,
    /// Falling ramp 1 → 0
    InvSaw,
    /// 1 for the first half, 0 for the second
    Square,
}

impl WindowShape {
    fn value(self, x: f32) -> f32 {
        match self {
            WindowShape::Sine => (PI * x).sin(),
            WindowShape::Hann => 0.5 - 0.5 * (2.0 * PI * x).cos(),
            WindowShape::Triangle => 1.0 - (2.0 * x - 1.0).abs(),
            WindowShape::Saw => x,
            WindowShape::InvSaw => 1.0 - x,
            WindowShape::Square => {
                if x < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// A fixed window shape sampled into a table
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    shape: WindowShape,
    table: Vec<f32>,
}

impl Window {
    /// Sample `shape` at `size` points (at least 2)
    pub fn new(shape: WindowShape, size: usize) -> Result<Self> {
        if size < 2 {
            return Err(FxError::config("size", "a window needs at least 2 points"));
        }
        let last = (size - 1) as f32;
        let table = (0..size).map(|i| shape.value(i as f32 / last)).collect();
        Ok(Self { shape, table })
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    pub fn values(&self) -> &[f32] {
        &self.table
    }
}

impl ControlSource for Window {
    #[inline]
    fn lookup(&self, phase: f32) -> f32 {
        table_lookup(&self.table, phase)
    }
}

/// Randomized line segments between breakpoints drawn from a generator
#[derive(Debug, Clone, PartialEq)]
pub struct RandLine {
    table: Vec<f32>,
}

impl RandLine {
    /// `segments` random segments with breakpoints uniformly drawn in `[min, max]`
    pub fn new<R: Rng + ?Sized>(rng: &mut R, segments: usize, min: f32, max: f32) -> Result<Self> {
        if segments == 0 {
            return Err(FxError::config("segments", "need at least one segment"));
        }
        let min = require_finite("min", min)?;
        let max = require_finite("max", max)?;
        if min > max {
            return Err(FxError::config("min", format!("{min} is above max {max}")));
        }

        let table = (0..=segments).map(|_| rng.gen_range(min..=max)).collect();
        Ok(Self { table })
    }

    /// Breakpoint values
    pub fn values(&self) -> &[f32] {
        &self.table
    }
}

impl ControlSource for RandLine {
    #[inline]
    fn lookup(&self, phase: f32) -> f32 {
        table_lookup(&self.table, phase)
    }
}

/// An arbitrary sampled table
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    table: Vec<f32>,
}

impl Wavetable {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        check_table(&values)?;
        Ok(Self { table: values })
    }

    /// Table from a buffer, averaging channels per frame
    pub fn from_buffer(buffer: &SampleBuffer) -> Result<Self> {
        let channels = buffer.channels() as f32;
        let values = buffer
            .frames_iter()
            .map(|frame| frame.iter().sum::<f32>() / channels)
            .collect();
        Self::new(values)
    }

    /// Map every value through `value * mul + add`
    pub fn scaled(mut self, mul: f32, add: f32) -> Self {
        for v in &mut self.table {
            *v = *v * mul + add;
        }
        self
    }

    pub fn values(&self) -> &[f32] {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl ControlSource for Wavetable {
    #[inline]
    fn lookup(&self, phase: f32) -> f32 {
        table_lookup(&self.table, phase)
    }
}
