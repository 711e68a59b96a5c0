//! Watering freshness
//!
//! Tracks when the plant was last watered and derives the watering index
//! (Wi): a linear decay from 1 right after watering to 0 after the expected
//! interval, capped by what the soil probe currently reports.

use crate::care::DEFAULT_BENCHMARK_DAYS;
use crate::normalizer::{WETNESS_DOMAIN, WETNESS_PARTIAL_CONTACT};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

/// Consecutive wet-contact samples needed to register a watering
pub const WET_STREAK_TO_CONFIRM: u32 = 3;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Watering history and the current watering index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WateringTracker {
    last_watered_at: Option<DateTime<Utc>>,
    wet_streak: u32,
    benchmark_days: f64,
    index: f64,
}

impl Default for WateringTracker {
    fn default() -> Self {
        Self::new(DEFAULT_BENCHMARK_DAYS)
    }
}

impl WateringTracker {
    pub fn new(benchmark_days: f64) -> Self {
        let mut tracker = Self {
            last_watered_at: None,
            wet_streak: 0,
            benchmark_days: DEFAULT_BENCHMARK_DAYS,
            index: 0.0,
        };
        tracker.set_benchmark_days(benchmark_days);
        tracker
    }

    /// Advance with one sample. Returns true when this sample registered a watering.
    pub fn update(&mut self, wetness_raw: f64, now: DateTime<Utc>, moisture_index: f64) -> bool {
        let wet = WETNESS_DOMAIN.clamp(wetness_raw) < WETNESS_PARTIAL_CONTACT;
        let mut watered = false;

        if wet {
            self.wet_streak += 1;
            if self.wet_streak >= WET_STREAK_TO_CONFIRM {
                info!("Watering detected at {}", now.to_rfc3339());
                self.last_watered_at = Some(now);
                self.wet_streak = 0;
                watered = true;
            }
        } else {
            self.wet_streak = 0;
        }

        let moisture_index = if moisture_index.is_nan() {
            0.0
        } else {
            moisture_index.clamp(0.0, 1.0)
        };
        // Without any watering on record the soil probe is the only evidence
        let freshness = self.freshness(now).unwrap_or(moisture_index);
        self.index = freshness.min(moisture_index);

        watered
    }

    /// Time-decayed freshness of the last watering, before the soil cap
    pub fn freshness(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_watered_at.map(|watered_at| {
            let elapsed_days =
                ((now - watered_at).num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0);
            (1.0 - elapsed_days / self.benchmark_days).clamp(0.0, 1.0)
        })
    }

    /// Current watering index (Wi)
    pub fn index(&self) -> f64 {
        self.index
    }

    pub fn last_watered_at(&self) -> Option<DateTime<Utc>> {
        self.last_watered_at
    }

    pub fn benchmark_days(&self) -> f64 {
        self.benchmark_days
    }

    pub fn wet_streak(&self) -> u32 {
        self.wet_streak
    }

    /// Replace the expected watering interval. Non-positive or non-finite values are ignored.
    pub fn set_benchmark_days(&mut self, days: f64) -> bool {
        if days.is_finite() && days > 0.0 {
            self.benchmark_days = days;
            true
        } else {
            false
        }
    }

    /// Restore the persisted watering time
    pub fn set_last_watered_at(&mut self, watered_at: Option<DateTime<Utc>>) {
        self.last_watered_at = watered_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_three_wet_samples_register_watering() {
        let mut tracker = WateringTracker::new(7.0);

        assert!(!tracker.update(250.0, t0(), 1.0));
        assert!(!tracker.update(250.0, t0() + Duration::seconds(5), 1.0));
        assert!(tracker.update(250.0, t0() + Duration::seconds(10), 1.0));

        assert_eq!(tracker.last_watered_at(), Some(t0() + Duration::seconds(10)));
        assert_eq!(tracker.wet_streak(), 0);
        assert_eq!(tracker.index(), 1.0);
    }

    #[test]
    fn test_dry_sample_breaks_streak() {
        let mut tracker = WateringTracker::new(7.0);

        tracker.update(250.0, t0(), 1.0);
        tracker.update(250.0, t0(), 1.0);
        tracker.update(900.0, t0(), 1.0);
        assert!(!tracker.update(250.0, t0(), 1.0));
        assert_eq!(tracker.last_watered_at(), None);
        assert_eq!(tracker.wet_streak(), 1);
    }

    #[test]
    fn test_linear_decay_over_benchmark() {
        let mut tracker = WateringTracker::new(8.0);
        tracker.set_last_watered_at(Some(t0()));

        tracker.update(900.0, t0() + Duration::days(2), 1.0);
        assert!((tracker.index() - 0.75).abs() < 1e-9);

        tracker.update(900.0, t0() + Duration::days(8), 1.0);
        assert_eq!(tracker.index(), 0.0);

        tracker.update(900.0, t0() + Duration::days(30), 1.0);
        assert_eq!(tracker.index(), 0.0);
    }

    #[test]
    fn test_soil_caps_freshness() {
        let mut tracker = WateringTracker::new(7.0);
        tracker.set_last_watered_at(Some(t0()));

        tracker.update(900.0, t0() + Duration::hours(1), 0.3);
        assert!((tracker.index() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_no_history_follows_soil() {
        let mut tracker = WateringTracker::new(7.0);
        tracker.update(900.0, t0(), 0.6);
        assert!((tracker.index() - 0.6).abs() < 1e-9);

        tracker.update(900.0, t0(), f64::NAN);
        assert_eq!(tracker.index(), 0.0);
    }

    #[test]
    fn test_clock_going_backwards_counts_as_fresh() {
        let mut tracker = WateringTracker::new(7.0);
        tracker.set_last_watered_at(Some(t0()));
        tracker.update(900.0, t0() - Duration::hours(3), 1.0);
        assert_eq!(tracker.index(), 1.0);
    }

    #[test]
    fn test_benchmark_days_validation() {
        let mut tracker = WateringTracker::new(-1.0);
        assert_eq!(tracker.benchmark_days(), DEFAULT_BENCHMARK_DAYS);

        assert!(tracker.set_benchmark_days(8.5));
        assert!(!tracker.set_benchmark_days(f64::INFINITY));
        assert!(!tracker.set_benchmark_days(0.0));
        assert_eq!(tracker.benchmark_days(), 8.5);
    }
}
