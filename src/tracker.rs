//! Temporal tracking
//!
//! This module holds the only long-lived mutable state of the engine. Each
//! sample advances it exactly once:
//! - watering index (Wi) and gas index (Gi) are updated
//! - the multiplicative plant comfort score (PCS) is computed
//! - all metrics are exponentially smoothed against the previous output
//! - the smoothed metrics are published only when they moved noticeably

use crate::care::DEFAULT_BENCHMARK_DAYS;
use crate::gas::{GasTracker, DEFAULT_GAS_WINDOW};
use crate::types::{ComfortIndices, ComfortMetrics, RawSample};
use crate::watering::WateringTracker;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

/// Default EMA weight of the newest sample
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.2;
/// Default publish threshold for indices in [0, 1]
pub const DEFAULT_INDEX_THRESHOLD: f64 = 0.03;
/// Default publish threshold for soil percent (points)
pub const DEFAULT_SOIL_THRESHOLD: f64 = 2.0;

/// Tunables of the temporal tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// EMA weight of the newest sample, in (0, 1]
    pub smoothing_alpha: f64,
    pub index_threshold: f64,
    pub soil_threshold: f64,
    /// Rolling gas window length (samples)
    pub gas_window: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            index_threshold: DEFAULT_INDEX_THRESHOLD,
            soil_threshold: DEFAULT_SOIL_THRESHOLD,
            gas_window: DEFAULT_GAS_WINDOW,
        }
    }
}

impl TrackerSettings {
    fn alpha(&self) -> f64 {
        if self.smoothing_alpha.is_finite() && self.smoothing_alpha > 0.0 {
            self.smoothing_alpha.min(1.0)
        } else {
            DEFAULT_SMOOTHING_ALPHA
        }
    }
}

/// Result of advancing the tracker by one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerUpdate {
    /// Unsmoothed metrics of this sample
    pub instant: ComfortMetrics,
    /// Smoothed metrics after this sample, published or not
    pub smoothed: ComfortMetrics,
    /// Last published metrics (equal to `smoothed` when `changed`)
    pub published: ComfortMetrics,
    pub changed: bool,
    /// This sample completed a watering detection
    pub watering_detected: bool,
    /// This sample confirmed a gas spike
    pub gas_spike: bool,
}

/// Long-lived temporal state of one plant session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalState {
    smoothed: Option<ComfortMetrics>,
    published: Option<ComfortMetrics>,
    watering: WateringTracker,
    gas: GasTracker,
    samples_seen: u64,
    last_sample_at: Option<DateTime<Utc>>,
}

impl Default for TemporalState {
    fn default() -> Self {
        Self::new(DEFAULT_BENCHMARK_DAYS, DEFAULT_GAS_WINDOW)
    }
}

impl TemporalState {
    pub fn new(benchmark_days: f64, gas_window: usize) -> Self {
        Self {
            smoothed: None,
            published: None,
            watering: WateringTracker::new(benchmark_days),
            gas: GasTracker::new(gas_window),
            samples_seen: 0,
            last_sample_at: None,
        }
    }

    /// Advance by one sample.
    ///
    /// `realtime` publishes unconditionally, bypassing the change gate.
    pub fn update(
        &mut self,
        sample: &RawSample,
        indices: &ComfortIndices,
        settings: &TrackerSettings,
        realtime: bool,
    ) -> TrackerUpdate {
        let watering_detected =
            self.watering
                .update(sample.wetness_contact, sample.received_at, indices.moisture_index);
        let gas = self.gas.update(sample.gas_level);

        let watering_index = self.watering.index();
        let gas_index = self.gas.index();

        let instant = ComfortMetrics {
            soil_percent: indices.soil_percent,
            moisture_index: indices.moisture_index,
            temperature_index: indices.temperature_index,
            humidity_index: indices.humidity_index,
            watering_index,
            gas_index,
            plant_comfort: plant_comfort_score(indices, watering_index, gas_index),
        };

        let smoothed = match self.smoothed {
            Some(previous) => smooth(&previous, &instant, settings.alpha()),
            None => instant,
        };
        self.smoothed = Some(smoothed);

        let changed = realtime
            || self
                .published
                .map_or(true, |last| moved_noticeably(&last, &smoothed, settings));
        if changed {
            debug!(
                "Publishing comfort metrics: pcs={:.3} wi={:.3} gi={:.3}",
                smoothed.plant_comfort, smoothed.watering_index, smoothed.gas_index
            );
            self.published = Some(smoothed);
        }

        self.samples_seen += 1;
        self.last_sample_at = Some(sample.received_at);

        TrackerUpdate {
            instant,
            smoothed,
            published: self.published.unwrap_or(smoothed),
            changed,
            watering_detected,
            gas_spike: gas.spike_confirmed,
        }
    }

    pub fn watering(&self) -> &WateringTracker {
        &self.watering
    }

    pub fn watering_mut(&mut self) -> &mut WateringTracker {
        &mut self.watering
    }

    pub fn gas(&self) -> &GasTracker {
        &self.gas
    }

    /// Last published metrics, if any sample was seen
    pub fn published(&self) -> Option<ComfortMetrics> {
        self.published
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn last_sample_at(&self) -> Option<DateTime<Utc>> {
        self.last_sample_at
    }

    /// Load temporal state from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize temporal state to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Multiplicative plant comfort score (PCS) in [0, 1].
///
/// A deficiency in watering or air quality discounts the whole base comfort
/// rather than being averaged away.
pub fn plant_comfort_score(indices: &ComfortIndices, watering_index: f64, gas_index: f64) -> f64 {
    let base = 0.5 * indices.moisture_index
        + 0.25 * indices.temperature_index
        + 0.25 * indices.humidity_index;
    let water_factor = 0.90 + 0.10 * watering_index.min(indices.moisture_index);
    let gas_factor = 0.70 + 0.30 * gas_index;
    (base * water_factor * gas_factor).clamp(0.0, 1.0)
}

fn ema(previous: f64, current: f64, alpha: f64) -> f64 {
    previous + alpha * (current - previous)
}

/// Smooth the index metrics. Wi and Gi already carry their own dynamics and pass through,
/// with Wi re-capped by the smoothed moisture index.
fn smooth(previous: &ComfortMetrics, current: &ComfortMetrics, alpha: f64) -> ComfortMetrics {
    let moisture_index = ema(previous.moisture_index, current.moisture_index, alpha);
    ComfortMetrics {
        soil_percent: ema(previous.soil_percent, current.soil_percent, alpha),
        moisture_index,
        temperature_index: ema(previous.temperature_index, current.temperature_index, alpha),
        humidity_index: ema(previous.humidity_index, current.humidity_index, alpha),
        watering_index: current.watering_index.min(moisture_index),
        gas_index: current.gas_index,
        plant_comfort: ema(previous.plant_comfort, current.plant_comfort, alpha),
    }
}

fn moved_noticeably(last: &ComfortMetrics, next: &ComfortMetrics, settings: &TrackerSettings) -> bool {
    let index_moves = [
        (last.moisture_index, next.moisture_index),
        (last.temperature_index, next.temperature_index),
        (last.humidity_index, next.humidity_index),
        (last.watering_index, next.watering_index),
        (last.gas_index, next.gas_index),
        (last.plant_comfort, next.plant_comfort),
    ];

    (next.soil_percent - last.soil_percent).abs() > settings.soil_threshold
        || index_moves
            .iter()
            .any(|(a, b)| (b - a).abs() > settings.index_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::care::CareTargets;
    use crate::comfort::ComfortAggregator;
    use crate::scenario::Scenario;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn sample(soil: f64, gas: f64, wetness: f64, offset_secs: i64) -> RawSample {
        RawSample::new(soil, 23.0, 60.0, gas, wetness, 8.0).at(t0() + Duration::seconds(offset_secs))
    }

    fn feed(state: &mut TemporalState, sample: &RawSample, realtime: bool) -> TrackerUpdate {
        let indices = ComfortAggregator::indices(sample, &CareTargets::default());
        state.update(sample, &indices, &TrackerSettings::default(), realtime)
    }

    #[test]
    fn test_plant_comfort_score_formula() {
        let indices = ComfortIndices {
            soil_percent: 50.0,
            moisture_index: 0.8,
            temperature_index: 1.0,
            humidity_index: 0.6,
        };
        let pcs = plant_comfort_score(&indices, 0.5, 1.0);
        let expected = (0.5 * 0.8 + 0.25 + 0.25 * 0.6) * (0.90 + 0.10 * 0.5) * 1.0;
        assert!((pcs - expected).abs() < 1e-12);

        // Poor air discounts an otherwise perfect base
        let perfect = ComfortIndices {
            soil_percent: 60.0,
            moisture_index: 1.0,
            temperature_index: 1.0,
            humidity_index: 1.0,
        };
        assert!((plant_comfort_score(&perfect, 1.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((plant_comfort_score(&perfect, 1.0, 0.0) - 0.70).abs() < 1e-12);
        assert!((plant_comfort_score(&perfect, 0.0, 1.0) - 0.90).abs() < 1e-12);
    }

    #[test]
    fn test_first_sample_publishes_unsmoothed() {
        let mut state = TemporalState::default();
        let update = feed(&mut state, &sample(600.0, 200.0, 900.0, 0), false);

        assert!(update.changed);
        assert_eq!(update.smoothed, update.instant);
        assert_eq!(state.published(), Some(update.instant));
        assert_eq!(state.samples_seen(), 1);
    }

    #[test]
    fn test_smoothing_follows_ema() {
        let mut state = TemporalState::default();
        let first = feed(&mut state, &sample(600.0, 200.0, 900.0, 0), false);
        let second = feed(&mut state, &sample(440.0, 200.0, 900.0, 5), false);

        let expected = first.instant.soil_percent * 0.8 + second.instant.soil_percent * 0.2;
        assert!((second.smoothed.soil_percent - expected).abs() < 1e-9);
    }

    #[test]
    fn test_small_moves_are_not_published() {
        let mut state = TemporalState::default();
        let first = feed(&mut state, &sample(600.0, 200.0, 900.0, 0), false);

        // 600 -> 604 moves soil by half a point
        let update = feed(&mut state, &sample(604.0, 200.0, 900.0, 5), false);
        assert!(!update.changed);
        assert_eq!(update.published, first.published);

        // Realtime mode publishes anyway
        let update = feed(&mut state, &sample(604.0, 200.0, 900.0, 10), true);
        assert!(update.changed);
        assert_eq!(update.published, update.smoothed);
    }

    #[test]
    fn test_large_moves_are_published() {
        let mut state = TemporalState::default();
        feed(&mut state, &sample(600.0, 200.0, 900.0, 0), false);
        let update = feed(&mut state, &sample(900.0, 200.0, 900.0, 5), false);
        assert!(update.changed);
        assert_eq!(update.published, update.smoothed);
    }

    #[test]
    fn test_watering_index_never_exceeds_moisture() {
        let mut state = TemporalState::default();
        let soils = [950.0, 900.0, 300.0, 250.0, 450.0, 700.0, 980.0, 1023.0, 0.0, 600.0];
        let wetness = [900.0, 250.0, 250.0, 250.0, 900.0, 200.0, 100.0, 900.0, 300.0, 800.0];

        for step in 0..200 {
            let s = sample(
                soils[step % soils.len()],
                200.0,
                wetness[(step / 3) % wetness.len()],
                step as i64 * 3600,
            );
            let update = feed(&mut state, &s, step % 7 == 0);

            assert!(update.instant.watering_index <= update.instant.moisture_index + 1e-12);
            assert!(update.smoothed.watering_index <= update.smoothed.moisture_index + 1e-12);
            assert!(update.published.watering_index <= update.published.moisture_index + 1e-12);
            assert!((0.0..=1.0).contains(&update.instant.watering_index));
            assert!((0.0..=1.0).contains(&update.instant.gas_index));
            assert!((0.0..=1.0).contains(&update.instant.plant_comfort));
        }
    }

    #[test]
    fn test_watering_resets_index_toward_one() {
        let mut state = TemporalState::default();
        state.watering_mut().set_last_watered_at(Some(t0() - Duration::days(6)));

        // Watering a dry plant: wet surface, dry probe
        for i in 0..3 {
            let update = feed(&mut state, &sample(880.0, 200.0, 250.0, i * 5), false);
            assert_eq!(update.watering_detected, i == 2);
        }
        assert_eq!(
            state.watering().last_watered_at(),
            Some(t0() + Duration::seconds(10))
        );

        // Probe catches up: freshness is back near 1
        let update = feed(&mut state, &sample(450.0, 200.0, 900.0, 60), false);
        assert!(update.instant.watering_index > 0.99);
    }

    #[test]
    fn test_gas_spike_lowers_plant_comfort() {
        let mut state = TemporalState::default();
        let mut before = None;
        for i in 0..30 {
            before = Some(feed(&mut state, &sample(600.0, 200.0, 900.0, i), false));
        }
        let before = before.unwrap();

        let mut last = None;
        for i in 30..33 {
            last = Some(feed(&mut state, &sample(600.0, 700.0, 900.0, i), false));
        }
        let last = last.unwrap();

        assert!(last.gas_spike);
        assert!(last.instant.gas_index <= 0.2);
        assert!(last.instant.plant_comfort < before.instant.plant_comfort * 0.8);
        assert!(last.changed);
    }

    #[test]
    fn test_state_serialization() {
        let mut state = TemporalState::default();
        let feed_samples = Scenario::Watering.samples(t0(), Duration::seconds(5), 45);
        for s in &feed_samples {
            feed(&mut state, s, false);
        }
        assert!(feed_samples.iter().any(|s| s.gas_level.fract() != 0.0));

        let json = state.to_json().unwrap();
        let loaded = TemporalState::from_json(&json).unwrap();
        assert_eq!(loaded, state);
    }
}
