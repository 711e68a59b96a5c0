//! Engine configuration
//!
//! All tunables of one engine instance. Every field has a default, so a
//! config file only needs to name what it overrides.

use crate::care::{CareTargets, DEFAULT_BENCHMARK_DAYS};
use crate::error::EngineError;
use crate::normalizer::DEFAULT_GAS_BASELINE;
use crate::tracker::TrackerSettings;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of one plant session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Species care targets; missing bounds fall back to defaults
    #[serde(alias = "careTargets")]
    pub care_targets: CareTargets,
    /// Clean-air gas reading (ADC)
    #[serde(alias = "gasBaseline")]
    pub gas_baseline: f64,
    /// Expected days between waterings
    #[serde(alias = "benchmarkDays")]
    pub benchmark_days: f64,
    /// Publish every sample instead of only noticeable changes
    pub realtime: bool,
    pub tracker: TrackerSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            care_targets: CareTargets::default(),
            gas_baseline: DEFAULT_GAS_BASELINE,
            benchmark_days: DEFAULT_BENCHMARK_DAYS,
            realtime: false,
            tracker: TrackerSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.gas_baseline.is_finite() {
            return Err(EngineError::ConfigError(
                "gas_baseline must be a finite number".to_string(),
            ));
        }
        if !(self.benchmark_days.is_finite() && self.benchmark_days > 0.0) {
            return Err(EngineError::ConfigError(format!(
                "benchmark_days must be positive, got {}",
                self.benchmark_days
            )));
        }
        let alpha = self.tracker.smoothing_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(EngineError::ConfigError(format!(
                "tracker.smoothing_alpha must be in (0, 1], got {alpha}"
            )));
        }
        let thresholds = [self.tracker.index_threshold, self.tracker.soil_threshold];
        if !thresholds.iter().all(|t| t.is_finite() && *t >= 0.0) {
            return Err(EngineError::ConfigError(format!(
                "publish thresholds must be finite and not negative, got {thresholds:?}"
            )));
        }
        Ok(())
    }

    /// Replace every invalid field with its default, keeping the rest
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.gas_baseline.is_finite() {
            warn!("Ignoring gas_baseline {}", self.gas_baseline);
            self.gas_baseline = defaults.gas_baseline;
        }
        if !(self.benchmark_days.is_finite() && self.benchmark_days > 0.0) {
            warn!("Ignoring benchmark_days {}", self.benchmark_days);
            self.benchmark_days = defaults.benchmark_days;
        }
        let alpha = self.tracker.smoothing_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            warn!("Ignoring tracker.smoothing_alpha {alpha}");
            self.tracker.smoothing_alpha = defaults.tracker.smoothing_alpha;
        }
        if !(self.tracker.index_threshold.is_finite() && self.tracker.index_threshold >= 0.0) {
            warn!("Ignoring tracker.index_threshold {}", self.tracker.index_threshold);
            self.tracker.index_threshold = defaults.tracker.index_threshold;
        }
        if !(self.tracker.soil_threshold.is_finite() && self.tracker.soil_threshold >= 0.0) {
            warn!("Ignoring tracker.soil_threshold {}", self.tracker.soil_threshold);
            self.tracker.soil_threshold = defaults.tracker.soil_threshold;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_json(
            r#"{
                "gasBaseline": 150,
                "realtime": true,
                "care_targets": { "minTemperature": 24, "maxTemperature": 34 },
                "tracker": { "smoothing_alpha": 0.5 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.gas_baseline, 150.0);
        assert!(config.realtime);
        assert_eq!(config.care_targets.min_temperature, Some(24.0));
        assert_eq!(config.tracker.smoothing_alpha, 0.5);
        assert_eq!(config.tracker.gas_window, TrackerSettings::default().gas_window);
        assert_eq!(config.benchmark_days, DEFAULT_BENCHMARK_DAYS);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"benchmark_days": 0}"#),
            Err(EngineError::ConfigError(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"tracker": {"smoothing_alpha": 1.5}}"#),
            Err(EngineError::ConfigError(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(EngineError::JsonError(_))
        ));
    }

    #[test]
    fn test_nan_thresholds_rejected() {
        let mut config = EngineConfig::default();
        config.tracker.index_threshold = f64::NAN;
        assert!(matches!(config.validate(), Err(EngineError::ConfigError(_))));

        let mut config = EngineConfig::default();
        config.tracker.soil_threshold = f64::NAN;
        assert!(matches!(config.validate(), Err(EngineError::ConfigError(_))));

        let mut config = EngineConfig::default();
        config.tracker.soil_threshold = -1.0;
        assert!(matches!(config.validate(), Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_sanitized_falls_back_to_defaults() {
        let mut config = EngineConfig::default();
        config.benchmark_days = -1.0;
        config.gas_baseline = f64::INFINITY;
        config.tracker.smoothing_alpha = 0.0;
        config.tracker.index_threshold = f64::NAN;
        config.tracker.soil_threshold = f64::NAN;
        config.realtime = true;

        let sanitized = config.sanitized();
        let mut expected = EngineConfig::default();
        expected.realtime = true;
        assert_eq!(sanitized, expected);
        assert!(sanitized.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EngineConfig::default();
        config.benchmark_days = 3.5;
        let loaded = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }
}
