//! Audio effects for RFX
//!
//! Every effect is an offline transform: it reads an input buffer and
//! returns a new one, keeping any filter/delay/envelope memory local to the
//! call.

mod delay;
mod delay_line;
mod dynamics;
mod filter;
mod saturator;
mod speed;

pub use delay::{Delay, Mdelay, Vdelay, MANY_TAPS};
pub use delay_line::DelayLine;
pub use dynamics::{Compressor, Detection, Envelope};
pub use filter::{Biquad, BiquadCoefficients, BiquadState, Filter, FilterType};
pub use saturator::{DcBlocker, Saturator, DEFAULT_DC_BLOCK_CUTOFF_HZ};
pub use speed::{Vspeed, MIN_SPEED};

use crate::buffer::SampleBuffer;
use crate::error::Result;
use rand::RngCore;

/// Trait for audio effects
pub trait Effect {
    /// Produce a new buffer from `input`.
    ///
    /// Stochastic effects draw from `rng`; deterministic ones ignore it.
    fn apply(&self, input: &SampleBuffer, rng: &mut dyn RngCore) -> Result<SampleBuffer>;

    /// Get effect name
    fn name(&self) -> &'static str;
}

/// Effects applied one after another, each feeding the next
#[derive(Default)]
pub struct Chain<'a> {
    effects: Vec<Box<dyn Effect + 'a>>,
}

impl<'a> Chain<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect to the end of the chain
    pub fn then(mut self, effect: impl Effect + 'a) -> Self {
        self.effects.push(Box::new(effect));
        self
    }

    /// Append a boxed effect to the end of the chain
    pub fn push(&mut self, effect: Box<dyn Effect + 'a>) {
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Names of the effects in processing order
    pub fn names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.name()).collect()
    }
}

impl Effect for Chain<'_> {
    fn apply(&self, input: &SampleBuffer, rng: &mut dyn RngCore) -> Result<SampleBuffer> {
        let mut current = input.clone();
        for effect in &self.effects {
            current = effect.apply(&current, rng)?;
        }
        Ok(current)
    }

    fn name(&self) -> &'static str {
        "Chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{impulse, sine};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_chain_is_identity() {
        let input = sine(440.0, 0.1, 8000, 0.5);
        let mut rng = StdRng::seed_from_u64(1);
        let chain = Chain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.apply(&input, &mut rng).unwrap(), input);
    }

    #[test]
    fn test_chain_matches_sequential_application() {
        let input = impulse(800, 8000);
        let mut rng = StdRng::seed_from_u64(1);

        let delay = Delay::new(0.01, 0.5);
        let filter = Filter::new(FilterType::LowPass, 1000.0);

        let expected = filter
            .apply(&delay.apply(&input, &mut rng).unwrap(), &mut rng)
            .unwrap();

        let chain = Chain::new().then(delay).then(filter);
        assert_eq!(chain.names(), vec!["Delay", "LP Filter"]);
        assert_eq!(chain.apply(&input, &mut rng).unwrap(), expected);
    }

    #[test]
    fn test_chain_stops_at_first_error() {
        let input = impulse(100, 8000);
        let mut rng = StdRng::seed_from_u64(1);
        let chain = Chain::new()
            .then(Delay::new(0.001, 0.5))
            .then(Delay::new(0.001, 1.5));
        assert!(chain.apply(&input, &mut rng).is_err());
    }
}
