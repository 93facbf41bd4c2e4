// SPDX-License-Identifier: GPL-3.0-only

//! Exposure configuration
//!
//! Loaded from JSON; every field falls back to its default when missing.

use crate::constants::*;
use crate::errors::{ExposureError, ExposureResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which implementation runs the kernels
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Use the GPU when an adapter is available, otherwise the CPU
    #[default]
    Auto,
    /// CPU reference kernels
    Cpu,
    /// wgpu compute kernels
    Gpu,
}

impl std::str::FromStr for BackendKind {
    type Err = ExposureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            other => Err(ExposureError::Config(format!("unknown backend '{}'", other))),
        }
    }
}

/// A log2 luminance interval
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct LogLumRange {
    pub min_log_lum: f32,
    pub max_log_lum: f32,
}

impl LogLumRange {
    pub fn new(min_log_lum: f32, max_log_lum: f32) -> Self {
        Self {
            min_log_lum,
            max_log_lum,
        }
    }

    /// Width of the interval in stops
    pub fn range(&self) -> f32 {
        self.max_log_lum - self.min_log_lum
    }

    pub fn inverse_range(&self) -> f32 {
        1.0 / self.range()
    }

    fn validate(&self, name: &str) -> ExposureResult<()> {
        if !(self.range() > 0.0) || !self.min_log_lum.is_finite() || !self.max_log_lum.is_finite()
        {
            return Err(ExposureError::Config(format!(
                "{}: max_log_lum ({}) must be greater than min_log_lum ({})",
                name, self.max_log_lum, self.min_log_lum
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Range mapped onto histogram bins 1..=255
    pub histogram_range: LogLumRange,
    /// Range used to turn the average bin back into luminance
    pub average_range: LogLumRange,
    /// Adaptation speed; larger adapts faster
    pub adaptation_tau: f32,
    /// Frame time used when the caller does not measure one
    pub frame_time_secs: f32,
    /// Middle-gray target for the exposure multiplier
    pub key_value: f32,
    /// Adapted luminance before the first frame
    pub initial_adapted_luminance: f32,
    pub backend: BackendKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            histogram_range: LogLumRange::new(
                DEFAULT_HISTOGRAM_MIN_LOG_LUM,
                DEFAULT_HISTOGRAM_MAX_LOG_LUM,
            ),
            average_range: LogLumRange::new(
                DEFAULT_AVERAGE_MIN_LOG_LUM,
                DEFAULT_AVERAGE_MAX_LOG_LUM,
            ),
            adaptation_tau: DEFAULT_ADAPTATION_TAU,
            frame_time_secs: DEFAULT_FRAME_TIME_SECS,
            key_value: DEFAULT_KEY_VALUE,
            initial_adapted_luminance: 0.0,
            backend: BackendKind::Auto,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/exposure-kernels/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("exposure-kernels").join("config.json"))
    }

    /// Parse and validate a JSON config file
    pub fn load(path: &Path) -> ExposureResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!(path = %path.display(), "Loaded exposure config");
        Ok(config)
    }

    /// Explicit path if given, else the default path if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> ExposureResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_json(text: &str) -> ExposureResult<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ExposureResult<()> {
        self.histogram_range.validate("histogram_range")?;
        self.average_range.validate("average_range")?;
        if !(self.adaptation_tau.is_finite() && self.adaptation_tau >= 0.0) {
            return Err(ExposureError::Config(format!(
                "adaptation_tau must be non-negative and finite, got {}",
                self.adaptation_tau
            )));
        }
        if !(self.frame_time_secs.is_finite() && self.frame_time_secs >= 0.0) {
            return Err(ExposureError::Config(format!(
                "frame_time_secs must be non-negative and finite, got {}",
                self.frame_time_secs
            )));
        }
        if !(self.key_value.is_finite() && self.key_value > 0.0) {
            return Err(ExposureError::Config(format!(
                "key_value must be positive and finite, got {}",
                self.key_value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "key_value": 0.25, "backend": "cpu" }"#).unwrap();
        assert_eq!(config.key_value, 0.25);
        assert_eq!(config.backend, BackendKind::Cpu);
        assert_eq!(config.adaptation_tau, DEFAULT_ADAPTATION_TAU);
        assert_eq!(config.histogram_range.min_log_lum, -9.0);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = Config::from_json(
            r#"{ "histogram_range": { "min_log_lum": 2.0, "max_log_lum": -2.0 } }"#,
        );
        assert!(matches!(result, Err(ExposureError::Config(_))));
    }

    #[test]
    fn test_infinite_values_rejected() {
        let mut config = Config::default();
        config.adaptation_tau = f32::INFINITY;
        assert!(matches!(config.validate(), Err(ExposureError::Config(_))));

        let mut config = Config::default();
        config.frame_time_secs = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.key_value = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("GPU".parse::<BackendKind>().unwrap(), BackendKind::Gpu);
        assert!("vulkan".parse::<BackendKind>().is_err());
    }
}
