//! Gas anomaly tracking
//!
//! Maintains a rolling window of raw gas readings and derives the gas index
//! (Gi). A reading whose z-score against the window reaches 3 counts as a
//! hit; three hits in a short run confirm a spike and suppress Gi. Between
//! spikes Gi creeps back toward 1, modeling air slowly clearing.

use crate::normalizer::GAS_DOMAIN;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default rolling window length (samples)
pub const DEFAULT_GAS_WINDOW: usize = 60;

/// Readings needed in the window before z-scores are trusted
pub const MIN_WINDOW_SAMPLES: usize = 10;

/// Floor on the window standard deviation so a very quiet sensor does not amplify noise
pub const MIN_STD: f64 = 5.0;

pub const SPIKE_Z_SCORE: f64 = 3.0;
pub const MAX_HITS: u8 = 5;
pub const HITS_TO_CONFIRM: u8 = 3;

/// Gi ceiling once a spike is confirmed
pub const SPIKE_CEILING: f64 = 0.2;

/// Fraction of the remaining gap to 1 recovered per sample
pub const RECOVERY_RATE: f64 = 0.02;

/// Outcome of feeding one reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasUpdate {
    /// z-score of the reading, once the window is warm
    pub z_score: Option<f64>,
    /// True when this reading confirmed a spike
    pub spike_confirmed: bool,
}

/// Rolling gas window, hit counter and the current gas index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasTracker {
    window: VecDeque<f64>,
    window_size: usize,
    high_z_hits: u8,
    index: f64,
}

impl Default for GasTracker {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_WINDOW)
    }
}

impl GasTracker {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(MIN_WINDOW_SAMPLES);
        Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            high_z_hits: 0,
            index: 1.0,
        }
    }

    /// Advance with one raw gas reading
    pub fn update(&mut self, gas_raw: f64) -> GasUpdate {
        let reading = GAS_DOMAIN.clamp(gas_raw);

        // Score against the window as it stood before this reading
        let z_score = self.z_score(reading);

        self.window.push_back(reading);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }

        match z_score {
            Some(z) if z >= SPIKE_Z_SCORE => {
                self.high_z_hits = self.high_z_hits.saturating_add(1).min(MAX_HITS);
                debug!("Gas reading {reading} at z={z:.2}, hits={}", self.high_z_hits);
            }
            _ => self.high_z_hits = self.high_z_hits.saturating_sub(1),
        }

        let spike_confirmed = self.high_z_hits >= HITS_TO_CONFIRM;
        if spike_confirmed {
            warn!("Sustained gas spike confirmed at reading {reading}");
            self.index = self.index.min(SPIKE_CEILING);
            self.high_z_hits = 0;
        } else {
            self.index += (1.0 - self.index) * RECOVERY_RATE;
        }
        self.index = self.index.clamp(0.0, 1.0);

        GasUpdate {
            z_score,
            spike_confirmed,
        }
    }

    fn z_score(&self, reading: f64) -> Option<f64> {
        if self.window.len() < MIN_WINDOW_SAMPLES {
            return None;
        }
        let (mean, std) = self.stats();
        Some((reading - mean) / std.max(MIN_STD))
    }

    /// Mean and population standard deviation of the window
    pub fn stats(&self) -> (f64, f64) {
        if self.window.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.window.len() as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        let variance = self.window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }

    /// Current gas index (Gi)
    pub fn index(&self) -> f64 {
        self.index
    }

    pub fn high_z_hits(&self) -> u8 {
        self.high_z_hits
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warmed(readings: usize) -> GasTracker {
        let mut tracker = GasTracker::default();
        for i in 0..readings {
            // Small alternating noise around 200
            tracker.update(if i % 2 == 0 { 198.0 } else { 202.0 });
        }
        tracker
    }

    #[test]
    fn test_no_z_score_until_warm() {
        let mut tracker = GasTracker::default();
        for _ in 0..MIN_WINDOW_SAMPLES {
            assert_eq!(tracker.update(200.0).z_score, None);
        }
        assert!(tracker.update(200.0).z_score.is_some());
    }

    #[test]
    fn test_single_spike_does_not_drop_index() {
        let mut tracker = warmed(40);
        let before = tracker.index();

        let update = tracker.update(600.0);
        assert!(update.z_score.unwrap() >= SPIKE_Z_SCORE);
        assert!(!update.spike_confirmed);
        assert!(tracker.index() >= before);

        for _ in 0..5 {
            tracker.update(200.0);
        }
        assert_eq!(tracker.high_z_hits(), 0);
        assert!(tracker.index() > 0.9);
    }

    #[test]
    fn test_three_consecutive_spikes_drop_index() {
        let mut tracker = warmed(40);

        assert!(!tracker.update(600.0).spike_confirmed);
        assert!(!tracker.update(600.0).spike_confirmed);
        assert!(tracker.update(600.0).spike_confirmed);

        assert!(tracker.index() <= SPIKE_CEILING);
        assert_eq!(tracker.high_z_hits(), 0);
    }

    #[test]
    fn test_saturated_hit_counter_from_snapshot() {
        let mut value = serde_json::to_value(warmed(40)).unwrap();
        value["high_z_hits"] = serde_json::json!(u8::MAX);
        let mut tracker: GasTracker = serde_json::from_value(value).unwrap();

        assert!(tracker.update(600.0).spike_confirmed);
        assert_eq!(tracker.high_z_hits(), 0);
    }

    #[test]
    fn test_isolated_spikes_never_confirm() {
        let mut tracker = warmed(40);
        for _ in 0..6 {
            assert!(!tracker.update(600.0).spike_confirmed);
            tracker.update(200.0);
            tracker.update(200.0);
        }
        assert!(tracker.index() > 0.9);
    }

    #[test]
    fn test_slow_recovery_after_spike() {
        let mut tracker = warmed(40);
        for _ in 0..3 {
            tracker.update(600.0);
        }
        let dropped = tracker.index();

        tracker.update(200.0);
        let one_step = tracker.index();
        assert!(one_step > dropped);
        assert!((one_step - (dropped + (1.0 - dropped) * RECOVERY_RATE)).abs() < 1e-12);

        for _ in 0..20 {
            tracker.update(200.0);
        }
        assert!(tracker.index() < 0.6, "recovery should be gradual");
    }

    #[test]
    fn test_constant_readings_are_not_anomalous() {
        let mut tracker = GasTracker::default();
        for _ in 0..100 {
            let update = tracker.update(200.0);
            assert!(update.z_score.unwrap_or(0.0).abs() < 1e-12);
        }
        assert_eq!(tracker.index(), 1.0);
        assert_eq!(tracker.window_len(), DEFAULT_GAS_WINDOW);
    }

    #[test]
    fn test_non_finite_readings_are_clamped() {
        let mut tracker = warmed(20);
        tracker.update(f64::NAN);
        tracker.update(f64::INFINITY);
        let (mean, std) = tracker.stats();
        assert!(mean.is_finite());
        assert!(std.is_finite());
        assert!((0.0..=1.0).contains(&tracker.index()));
    }
}
