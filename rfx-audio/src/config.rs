//! Engine-wide defaults persisted as a simple key=value file.
//!
//! Stores interpolation mode, vocoder window sizes, the DC blocker corner
//! and the seed for reproducible stochastic effects.

use crate::buffer::Interpolation;
use crate::control::ControlSource;
use crate::effects::{Saturator, Vdelay, Vspeed, DEFAULT_DC_BLOCK_CUTOFF_HZ};
use crate::error::{require_positive, FxError, Result};
use crate::timestretcher::{
    Mincer, Paulstretch, DEFAULT_MINCER_WINDOW, DEFAULT_PAULSTRETCH_WINDOW_SECS,
    MIN_MINCER_WINDOW,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Defaults applied when building effects
#[derive(Debug, Clone, PartialEq)]
pub struct FxConfig {
    /// Fractional read mode for vspeed, vdelay and mincer
    pub interpolation: Interpolation,
    /// Mincer window size in frames
    pub mincer_window: usize,
    /// Paulstretch window length in seconds
    pub paulstretch_window_secs: f32,
    /// Saturator DC blocker corner in Hz
    pub dc_block_cutoff_hz: f32,
    /// Seed for [`FxConfig::rng`]
    pub seed: u64,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            mincer_window: DEFAULT_MINCER_WINDOW,
            paulstretch_window_secs: DEFAULT_PAULSTRETCH_WINDOW_SECS,
            dc_block_cutoff_hz: DEFAULT_DC_BLOCK_CUTOFF_HZ,
            seed: 0,
        }
    }
}

impl FxConfig {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be read.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rfx")
            .join("config.txt")
    }

    /// Parse key=value lines; unknown keys are skipped, malformed or
    /// out-of-range values keep the default
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                warn!(line, "ignoring config line without '='");
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            let parsed = match key {
                "interpolation" => Interpolation::from_name(value)
                    .map(|v| config.interpolation = v)
                    .is_some(),
                "mincer_window" => value
                    .parse()
                    .map(|v| config.mincer_window = v)
                    .is_ok(),
                "paulstretch_window_secs" => value
                    .parse()
                    .map(|v| config.paulstretch_window_secs = v)
                    .is_ok(),
                "dc_block_cutoff_hz" => value
                    .parse()
                    .map(|v| config.dc_block_cutoff_hz = v)
                    .is_ok(),
                "seed" => value.parse().map(|v| config.seed = v).is_ok(),
                _ => true,
            };

            if !parsed {
                warn!(key, value, "ignoring malformed config value");
            }
        }

        config.reset_invalid_fields();
        config
    }

    /// Put every field that fails [`FxConfig::validate`] back to its default
    fn reset_invalid_fields(&mut self) {
        let defaults = Self::default();
        if !is_valid_mincer_window(self.mincer_window) {
            warn!(
                value = self.mincer_window,
                "mincer_window out of range, using default"
            );
            self.mincer_window = defaults.mincer_window;
        }
        if require_positive("paulstretch_window_secs", self.paulstretch_window_secs).is_err() {
            warn!(
                value = self.paulstretch_window_secs,
                "paulstretch_window_secs out of range, using default"
            );
            self.paulstretch_window_secs = defaults.paulstretch_window_secs;
        }
        if require_positive("dc_block_cutoff_hz", self.dc_block_cutoff_hz).is_err() {
            warn!(
                value = self.dc_block_cutoff_hz,
                "dc_block_cutoff_hz out of range, using default"
            );
            self.dc_block_cutoff_hz = defaults.dc_block_cutoff_hz;
        }
    }

    /// Serialize config to key=value lines
    pub fn serialize(&self) -> String {
        [
            "# RFX Configuration".to_string(),
            format!("interpolation={}", self.interpolation.as_str()),
            format!("mincer_window={}", self.mincer_window),
            format!("paulstretch_window_secs={}", self.paulstretch_window_secs),
            format!("dc_block_cutoff_hz={}", self.dc_block_cutoff_hz),
            format!("seed={}", self.seed),
        ]
        .join("\n")
    }

    /// Check every field against its domain
    pub fn validate(&self) -> Result<()> {
        if !is_valid_mincer_window(self.mincer_window) {
            return Err(FxError::config(
                "mincer_window",
                format!(
                    "{} must be a power of two of at least {}",
                    self.mincer_window, MIN_MINCER_WINDOW
                ),
            ));
        }
        require_positive("paulstretch_window_secs", self.paulstretch_window_secs)?;
        require_positive("dc_block_cutoff_hz", self.dc_block_cutoff_hz)?;
        Ok(())
    }

    /// Generator seeded from `seed`
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    pub fn vspeed<'a>(
        &self,
        control: &'a dyn ControlSource,
        min_speed: f32,
        max_speed: f32,
    ) -> Vspeed<'a> {
        Vspeed::new(control, min_speed, max_speed).with_interpolation(self.interpolation)
    }

    pub fn vdelay<'a>(
        &self,
        control: &'a dyn ControlSource,
        min_time: f32,
        max_time: f32,
        feedback: f32,
    ) -> Vdelay<'a> {
        Vdelay::new(control, min_time, max_time, feedback).with_interpolation(self.interpolation)
    }

    pub fn saturator(&self, drive: f32, dc_offset: f32, dc_block: bool) -> Saturator {
        Saturator::new(drive, dc_offset, dc_block).with_dc_block_cutoff(self.dc_block_cutoff_hz)
    }

    pub fn paulstretch(&self, stretch: f32) -> Paulstretch {
        Paulstretch::new(stretch).with_window_secs(self.paulstretch_window_secs)
    }

    pub fn mincer<'a>(
        &self,
        length: f32,
        position: &'a dyn ControlSource,
        pitch: &'a dyn ControlSource,
    ) -> Mincer<'a> {
        Mincer::new(length, position, pitch)
            .with_window(self.mincer_window)
            .with_interpolation(self.interpolation)
    }
}

fn is_valid_mincer_window(window: usize) -> bool {
    window >= MIN_MINCER_WINDOW && window.is_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Constant;
    use rand::Rng;

    #[test]
    fn test_parse_empty() {
        assert_eq!(FxConfig::parse(""), FxConfig::default());
    }

    #[test]
    fn test_parse_values_and_comments() {
        let content = "# Comment\ninterpolation = lagrange\nmincer_window=4096\n\
                       paulstretch_window_secs=0.5\ndc_block_cutoff_hz=20\nseed=99\nunknown=1";
        let config = FxConfig::parse(content);
        assert_eq!(config.interpolation, Interpolation::Lagrange);
        assert_eq!(config.mincer_window, 4096);
        assert_eq!(config.paulstretch_window_secs, 0.5);
        assert_eq!(config.dc_block_cutoff_hz, 20.0);
        assert_eq!(config.seed, 99);
    }

    #[test]
    fn test_malformed_values_keep_defaults() {
        let config = FxConfig::parse("mincer_window=big\nseed=-4\ninterpolation=sinc\nnonsense");
        assert_eq!(config, FxConfig::default());
    }

    #[test]
    fn test_out_of_range_values_keep_defaults() {
        let content = "mincer_window=1000\npaulstretch_window_secs=-1\n\
                       dc_block_cutoff_hz=nan\nseed=3";
        let config = FxConfig::parse(content);
        assert_eq!(config.mincer_window, DEFAULT_MINCER_WINDOW);
        assert_eq!(config.paulstretch_window_secs, DEFAULT_PAULSTRETCH_WINDOW_SECS);
        assert_eq!(config.dc_block_cutoff_hz, DEFAULT_DC_BLOCK_CUTOFF_HZ);
        assert_eq!(config.seed, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = FxConfig {
            interpolation: Interpolation::Lagrange,
            mincer_window: 1024,
            paulstretch_window_secs: 0.125,
            dc_block_cutoff_hz: 15.0,
            seed: 7,
        };
        assert_eq!(FxConfig::parse(&config.serialize()), config);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("rfx-config-test-{}", std::process::id()))
            .join("config.txt");
        let config = FxConfig {
            seed: 1234,
            ..FxConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(FxConfig::load_from(&path).unwrap(), config);

        fs::write(&path, "mincer_window=1000\nseed=8").unwrap();
        let loaded = FxConfig::load_from(&path).unwrap();
        assert_eq!(loaded.mincer_window, DEFAULT_MINCER_WINDOW);
        assert_eq!(loaded.seed, 8);
        assert!(loaded.validate().is_ok());
        fs::remove_dir_all(path.parent().unwrap()).unwrap();

        assert!(FxConfig::load_from(Path::new("/nonexistent/rfx/config.txt")).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(FxConfig::default().validate().is_ok());
        for config in [
            FxConfig {
                mincer_window: 1000,
                ..FxConfig::default()
            },
            FxConfig {
                mincer_window: 32,
                ..FxConfig::default()
            },
            FxConfig {
                paulstretch_window_secs: 0.0,
                ..FxConfig::default()
            },
            FxConfig {
                dc_block_cutoff_hz: f32::NAN,
                ..FxConfig::default()
            },
        ] {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_seeded_rng_and_builders() {
        let config = FxConfig {
            seed: 5,
            interpolation: Interpolation::Lagrange,
            ..FxConfig::default()
        };
        let a: u64 = config.rng().gen();
        let b: u64 = config.rng().gen();
        assert_eq!(a, b);

        let control = Constant(0.5);
        assert_eq!(config.vspeed(&control, 0.5, 1.0).interpolation, Interpolation::Lagrange);
        assert_eq!(config.mincer(1.0, &control, &control).window, DEFAULT_MINCER_WINDOW);
        assert_eq!(config.paulstretch(8.0).window_secs, DEFAULT_PAULSTRETCH_WINDOW_SECS);
        assert_eq!(config.saturator(2.0, 0.0, true).dc_block_cutoff_hz, 10.0);
        assert_eq!(
            config.vdelay(&control, 0.01, 0.02, 0.0).interpolation,
            Interpolation::Lagrange
        );
    }
}
