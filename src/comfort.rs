//! Comfort aggregation
//!
//! This module combines per-sensor scores into composite scores and computes
//! normalized-range indices against the current care targets:
//! - comfort score (temperature and humidity)
//! - legacy overall health blend
//! - moisture, temperature-comfort and humidity-comfort indices

use crate::care::CareTargets;
use crate::normalizer::{HUMIDITY_BANDS, SOIL_BANDS, TEMPERATURE_BANDS};
use crate::types::{ComfortIndices, RawSample, ScoreSet, SensorScores};

/// Soil ADC reading of a bone-dry probe
pub const SOIL_RAW_DRY: f64 = 1000.0;
/// Soil ADC reading of a probe in saturated soil
pub const SOIL_RAW_WET: f64 = 200.0;

// Soil dominates because it is the most survival-critical signal
const HEALTH_WEIGHT_HYDRATION: f64 = 0.4;
const HEALTH_WEIGHT_TEMPERATURE: f64 = 0.3;
const HEALTH_WEIGHT_HUMIDITY: f64 = 0.2;
const HEALTH_WEIGHT_AIR: f64 = 0.1;

/// Aggregator for composite scores and comfort indices
pub struct ComfortAggregator;

impl ComfortAggregator {
    /// Build the published score set from per-sensor scores
    pub fn score_set(scores: &SensorScores) -> ScoreSet {
        ScoreSet {
            hydration: scores.hydration,
            comfort: comfort_score(scores.temperature, scores.humidity),
            air_quality: scores.air_quality,
            bio_signal: scores.bio_signal,
        }
    }

    /// Legacy additive health blend (0-100)
    pub fn overall_health(scores: &SensorScores) -> u8 {
        let blend = HEALTH_WEIGHT_HYDRATION * scores.hydration as f64
            + HEALTH_WEIGHT_TEMPERATURE * scores.temperature as f64
            + HEALTH_WEIGHT_HUMIDITY * scores.humidity as f64
            + HEALTH_WEIGHT_AIR * scores.air_quality as f64;
        blend.round().clamp(0.0, 100.0) as u8
    }

    /// Indices of one sample against the care targets
    pub fn indices(sample: &RawSample, targets: &CareTargets) -> ComfortIndices {
        let soil_percent = soil_percent(sample.soil_moisture);
        let temperature = TEMPERATURE_BANDS.domain.clamp(sample.temperature);
        let humidity = HUMIDITY_BANDS.domain.clamp(sample.humidity);

        ComfortIndices {
            soil_percent,
            moisture_index: targets.soil_range().position(soil_percent),
            temperature_index: targets.temperature_range().closeness(temperature),
            humidity_index: targets.humidity_range().closeness(humidity),
        }
    }
}

/// Rounded mean of the temperature and humidity scores
pub fn comfort_score(temperature: u8, humidity: u8) -> u8 {
    ((temperature as f64 + humidity as f64) / 2.0).round() as u8
}

/// Soil moisture percentage from the raw probe reading
pub fn soil_percent(soil_raw: f64) -> f64 {
    let raw = SOIL_BANDS.domain.clamp(soil_raw);
    ((SOIL_RAW_DRY - raw) / (SOIL_RAW_DRY - SOIL_RAW_WET) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::care::CareTargets;

    fn scores(hydration: u8, temperature: u8, humidity: u8, air: u8, bio: u8) -> SensorScores {
        SensorScores {
            hydration,
            temperature,
            humidity,
            air_quality: air,
            bio_signal: bio,
        }
    }

    #[test]
    fn test_comfort_is_rounded_mean() {
        assert_eq!(comfort_score(100, 100), 100);
        assert_eq!(comfort_score(80, 61), 71);
        assert_eq!(comfort_score(0, 1), 1);
    }

    #[test]
    fn test_score_set() {
        let set = ComfortAggregator::score_set(&scores(90, 80, 60, 70, 50));
        assert_eq!(set.hydration, 90);
        assert_eq!(set.comfort, 70);
        assert_eq!(set.air_quality, 70);
        assert_eq!(set.bio_signal, 50);
    }

    #[test]
    fn test_overall_health_weights() {
        assert_eq!(ComfortAggregator::overall_health(&scores(100, 100, 100, 100, 0)), 100);
        assert_eq!(ComfortAggregator::overall_health(&scores(100, 0, 0, 0, 0)), 40);
        assert_eq!(ComfortAggregator::overall_health(&scores(0, 100, 0, 0, 0)), 30);
        assert_eq!(ComfortAggregator::overall_health(&scores(0, 0, 100, 0, 0)), 20);
        assert_eq!(ComfortAggregator::overall_health(&scores(0, 0, 0, 100, 100)), 10);
    }

    #[test]
    fn test_soil_percent() {
        assert_eq!(soil_percent(1000.0), 0.0);
        assert_eq!(soil_percent(1023.0), 0.0);
        assert_eq!(soil_percent(200.0), 100.0);
        assert_eq!(soil_percent(0.0), 100.0);
        assert!((soil_percent(600.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_indices_with_default_targets() {
        let sample = RawSample::new(600.0, 22.5, 55.0, 200.0, 900.0, 8.0);
        let indices = ComfortAggregator::indices(&sample, &CareTargets::default());

        // 50% soil within 20..60 sits at 0.75
        assert!((indices.moisture_index - 0.75).abs() < 1e-9);
        // Both at the midpoint of their default range
        assert!((indices.temperature_index - 1.0).abs() < 1e-9);
        assert!((indices.humidity_index - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_indices_clamped() {
        let sample = RawSample::new(1023.0, 45.0, 5.0, 200.0, 900.0, 8.0);
        let indices = ComfortAggregator::indices(&sample, &CareTargets::default());

        assert_eq!(indices.moisture_index, 0.0);
        assert_eq!(indices.temperature_index, 0.0);
        assert_eq!(indices.humidity_index, 0.0);

        let wet = RawSample::new(100.0, f64::NAN, f64::INFINITY, 200.0, 900.0, 8.0);
        let indices = ComfortAggregator::indices(&wet, &CareTargets::default());
        assert_eq!(indices.moisture_index, 1.0);
        assert!((0.0..=1.0).contains(&indices.temperature_index));
        assert!((0.0..=1.0).contains(&indices.humidity_index));
    }

    #[test]
    fn test_indices_follow_replaced_targets() {
        let sample = RawSample::new(600.0, 30.0, 55.0, 200.0, 900.0, 8.0);
        let tropical = CareTargets {
            min_temperature: Some(24.0),
            max_temperature: Some(36.0),
            ..Default::default()
        };
        let default = ComfortAggregator::indices(&sample, &CareTargets::default());
        let replaced = ComfortAggregator::indices(&sample, &tropical);

        assert_eq!(default.temperature_index, 0.0);
        assert!((replaced.temperature_index - 1.0).abs() < 1e-9);
    }
}
