//! Simulated sensor feeds
//!
//! Deterministic sample sequences for demos and tests. There is no
//! randomness: the small ripples on every channel come from fixed sine
//! terms, so the same scenario always produces the same feed.

use crate::error::EngineError;
use crate::types::RawSample;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

/// Pre-configured simulation profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Every channel hovers in its comfort band
    Healthy,
    /// Soil dries steadily from moist to bone dry
    Drying,
    /// A dry pot gets watered a third of the way in and the probe catches up
    Watering,
    /// Clean air with a short burst of bad gas readings halfway through
    GasSpike,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Healthy,
        Scenario::Drying,
        Scenario::Watering,
        Scenario::GasSpike,
    ];

    /// Generate `count` samples starting at `start`, `step` apart
    pub fn samples(&self, start: DateTime<Utc>, step: Duration, count: usize) -> Vec<RawSample> {
        (0..count)
            .map(|i| {
                let at = start + step * i as i32;
                self.sample_at(i, count).at(at)
            })
            .collect()
    }

    fn sample_at(&self, i: usize, count: usize) -> RawSample {
        let t = i as f64;
        let progress = if count > 1 {
            t / (count - 1) as f64
        } else {
            0.0
        };
        let ripple = |period: f64, amplitude: f64| amplitude * (t * std::f64::consts::TAU / period).sin();

        let temperature = 23.0 + ripple(40.0, 0.5);
        let humidity = 55.0 + ripple(25.0, 2.0);
        let bio = 20.0 + ripple(7.0, 3.0);
        let clean_gas = 200.0 + ripple(5.0, 3.0);

        match self {
            Scenario::Healthy => RawSample::new(
                550.0 + ripple(30.0, 10.0),
                temperature,
                humidity,
                clean_gas,
                900.0,
                bio,
            ),
            Scenario::Drying => RawSample::new(
                500.0 + 480.0 * progress,
                temperature + 1.0,
                humidity - 5.0,
                clean_gas,
                950.0,
                bio,
            ),
            Scenario::Watering => {
                let watering_starts = count / 3;
                let pouring_ends = watering_starts + 6;
                let (soil, wetness) = if i < watering_starts {
                    (900.0, 950.0)
                } else {
                    // The probe drifts from dry toward moist after the pour
                    let since = (i - watering_starts) as f64;
                    let soil = 450.0 + 450.0 * (-since / 4.0).exp();
                    let wetness = if i < pouring_ends { 150.0 } else { 900.0 };
                    (soil, wetness)
                };
                RawSample::new(soil, temperature, humidity, clean_gas, wetness, bio)
            }
            Scenario::GasSpike => {
                let spike_starts = count / 2;
                let gas = if (spike_starts..spike_starts + 5).contains(&i) {
                    700.0
                } else {
                    clean_gas
                };
                RawSample::new(550.0, temperature, humidity, gas, 900.0, bio)
            }
        }
    }
}

impl FromStr for Scenario {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "healthy" => Ok(Scenario::Healthy),
            "drying" => Ok(Scenario::Drying),
            "watering" => Ok(Scenario::Watering),
            "gas-spike" | "gas" => Ok(Scenario::GasSpike),
            _ => Err(EngineError::UnknownScenario(s.to_string())),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Healthy => write!(f, "healthy"),
            Scenario::Drying => write!(f, "drying"),
            Scenario::Watering => write!(f, "watering"),
            Scenario::GasSpike => write!(f, "gas-spike"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.to_string().parse::<Scenario>().unwrap(), scenario);
        }
        assert_eq!("GAS_SPIKE".parse::<Scenario>().unwrap(), Scenario::GasSpike);
        assert!(matches!(
            "flood".parse::<Scenario>(),
            Err(EngineError::UnknownScenario(_))
        ));
    }

    #[test]
    fn test_samples_are_deterministic_and_timed() {
        let a = Scenario::Healthy.samples(t0(), Duration::seconds(5), 20);
        let b = Scenario::Healthy.samples(t0(), Duration::seconds(5), 20);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert_eq!(a[3].received_at, t0() + Duration::seconds(15));
    }

    #[test]
    fn test_drying_soil_rises() {
        let samples = Scenario::Drying.samples(t0(), Duration::minutes(10), 30);
        assert!(samples.windows(2).all(|w| w[1].soil_moisture > w[0].soil_moisture));
        assert!((samples[29].soil_moisture - 980.0).abs() < 1e-9);
    }

    #[test]
    fn test_watering_has_wet_run() {
        let samples = Scenario::Watering.samples(t0(), Duration::seconds(5), 30);
        let wet = samples.iter().filter(|s| s.wetness_contact < 300.0).count();
        assert_eq!(wet, 6);
        assert!(samples[29].soil_moisture < 500.0);
    }

    #[test]
    fn test_gas_spike_window() {
        let samples = Scenario::GasSpike.samples(t0(), Duration::seconds(5), 40);
        let spiked: Vec<usize> = samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.gas_level > 500.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(spiked, vec![20, 21, 22, 23, 24]);
    }
}
