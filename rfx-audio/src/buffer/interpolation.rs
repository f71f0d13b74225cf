//! Fractional-position interpolation shared by buffer reads and delay taps.
//!
//! Positions are resolved through a `fetch` closure so the same kernels work
//! on a zero-padded buffer and on a circular delay line.

/// Interpolation mode for fractional reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Interpolation {
    /// Linear interpolation between the two bracketing samples
    #[default]
    Linear,
    /// 4-point Lagrange cubic interpolation (higher quality, two samples on each side)
    Lagrange,
}

impl Interpolation {
    /// Config-file name
    pub fn as_str(self) -> &'static str {
        match self {
            Interpolation::Linear => "linear",
            Interpolation::Lagrange => "lagrange",
        }
    }

    /// Parse a config-file name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(Interpolation::Linear),
            "lagrange" | "cubic" => Some(Interpolation::Lagrange),
            _ => None,
        }
    }

    /// Interpolate at fractional `pos`, reading integer positions via `fetch`.
    ///
    /// Integer positions return the fetched sample exactly in both modes.
    #[inline]
    pub fn interpolate<F>(self, pos: f64, fetch: F) -> f32
    where
        F: Fn(isize) -> f32,
    {
        let base = pos.floor();
        let i = base as isize;
        let frac = (pos - base) as f32;

        if frac == 0.0 {
            return fetch(i);
        }

        match self {
            Interpolation::Linear => {
                let a = fetch(i);
                let b = fetch(i + 1);
                a + (b - a) * frac
            }
            Interpolation::Lagrange => lagrange(
                [fetch(i - 1), fetch(i), fetch(i + 1), fetch(i + 2)],
                frac,
            ),
        }
    }
}

/// 4-point Lagrange polynomial through y[-1], y[0], y[1], y[2] evaluated at `x` in [0, 1)
#[inline]
fn lagrange(y: [f32; 4], x: f32) -> f32 {
    let x_1 = x + 1.0;
    let x_2 = x - 1.0;
    let x_3 = x - 2.0;

    // L_-1(x) = x(x-1)(x-2) / (-1)(-2)(-3)
    let l_1 = -x * x_2 * x_3 / 6.0;
    // L_0(x) = (x+1)(x-1)(x-2) / (1)(-1)(-2)
    let l0 = x_1 * x_2 * x_3 / 2.0;
    // L_1(x) = (x+1)x(x-2) / (2)(1)(-1)
    let l1 = -x_1 * x * x_3 / 2.0;
    // L_2(x) = (x+1)x(x-1) / (3)(2)(1)
    let l2 = x_1 * x * x_2 / 6.0;

    y[0] * l_1 + y[1] * l0 + y[2] * l1 + y[3] * l2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(i: isize) -> f32 {
        i as f32 * 0.5
    }

    #[test]
    fn test_integer_positions_are_exact() {
        for mode in [Interpolation::Linear, Interpolation::Lagrange] {
            for i in -3..10 {
                assert_eq!(mode.interpolate(i as f64, ramp), ramp(i));
            }
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let fetch = |i: isize| if i == 0 { 1.0 } else { 3.0 };
        assert!((Interpolation::Linear.interpolate(0.5, fetch) - 2.0).abs() < 1e-6);
        assert!((Interpolation::Linear.interpolate(0.25, fetch) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_lagrange_reproduces_cubic() {
        // A cubic polynomial is reproduced exactly by 4-point Lagrange
        let cubic = |i: isize| {
            let x = i as f32;
            0.1 * x * x * x - 0.5 * x * x + x - 2.0
        };
        for pos in [0.1, 1.3, 2.5, 4.75] {
            let x = pos as f32;
            let expected = 0.1 * x * x * x - 0.5 * x * x + x - 2.0;
            let actual = Interpolation::Lagrange.interpolate(pos, cubic);
            assert!((actual - expected).abs() < 1e-4, "{} vs {}", actual, expected);
        }
    }

    #[test]
    fn test_names_roundtrip() {
        for mode in [Interpolation::Linear, Interpolation::Lagrange] {
            assert_eq!(Interpolation::from_name(mode.as_str()), Some(mode));
        }
        assert_eq!(Interpolation::from_name("Cubic"), Some(Interpolation::Lagrange));
        assert_eq!(Interpolation::from_name("sinc"), None);
    }
}
