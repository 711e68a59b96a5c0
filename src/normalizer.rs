//! Score normalization
//!
//! This module maps one raw sensor value to a 0-100 score using a tolerance
//! band model. From the center outward every sensor has:
//! - a deadzone that scores exactly 100
//! - an ideal band falling linearly to a sensor-specific midpoint score
//! - an acceptable band falling to a low score
//! - a hazard band falling to 0
//!
//! Values outside the sensor domain are clamped, never rejected.

use crate::types::{RawSample, SensorScores};

/// Version tag of the canonical band constants below
pub const BANDS_VERSION: &str = "bands-v1";

/// Surface wetness below this reading counts as partial contact (fresh water)
pub const WETNESS_PARTIAL_CONTACT: f64 = 400.0;

/// Hydration scores at or above this are never cushioned, and cushioning never exceeds it
pub const CUSHION_CEILING: u8 = 60;

const CUSHION_MIN_BOOST: f64 = 10.0;
const CUSHION_MAX_BOOST: f64 = 25.0;

/// Default clean-air reading of the MQ gas sensor
pub const DEFAULT_GAS_BASELINE: f64 = 200.0;

/// Closed interval on the raw sensor scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lo: f64,
    pub hi: f64,
}

impl Band {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Clamp into the band. NaN maps to the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.lo
        } else {
            value.clamp(self.lo, self.hi)
        }
    }
}

/// Nested tolerance bands for one sensor.
///
/// Bands must nest: `hazard ⊇ acceptable ⊇ ideal ⊇ deadzone`, all inside `domain`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandProfile {
    pub domain: Band,
    pub deadzone: Band,
    pub ideal: Band,
    pub acceptable: Band,
    pub hazard: Band,
    /// Score at the outer edge of the ideal band
    pub ideal_score: f64,
    /// Score at the outer edge of the acceptable band
    pub acceptable_score: f64,
}

impl BandProfile {
    /// Score a raw value
    pub fn score(&self, raw: f64) -> u8 {
        let value = self.domain.clamp(raw);

        let score = if value < self.deadzone.lo {
            let edge = self.deadzone.lo;
            self.falloff(
                edge - value,
                [
                    edge - self.ideal.lo,
                    edge - self.acceptable.lo,
                    edge - self.hazard.lo,
                ],
            )
        } else if value > self.deadzone.hi {
            let edge = self.deadzone.hi;
            self.falloff(
                value - edge,
                [
                    self.ideal.hi - edge,
                    self.acceptable.hi - edge,
                    self.hazard.hi - edge,
                ],
            )
        } else {
            100.0
        };

        score.round().clamp(0.0, 100.0) as u8
    }

    /// Piecewise-linear falloff by distance from the deadzone edge.
    /// `edges` are the cumulative distances to the ideal, acceptable and hazard edges.
    fn falloff(&self, distance: f64, edges: [f64; 3]) -> f64 {
        let anchors = [
            (0.0, 100.0),
            (edges[0], self.ideal_score),
            (edges[1], self.acceptable_score),
            (edges[2], 0.0),
        ];

        for pair in anchors.windows(2) {
            let (d0, s0) = pair[0];
            let (d1, s1) = pair[1];
            if distance <= d1 {
                let span = d1 - d0;
                if span <= f64::EPSILON {
                    return s1;
                }
                return s0 + (s1 - s0) * ((distance - d0) / span);
            }
        }

        0.0
    }
}

/// Soil moisture ADC (lower = wetter). Below the hazard band the pot is waterlogged.
pub const SOIL_BANDS: BandProfile = BandProfile {
    domain: Band::new(0.0, 1023.0),
    deadzone: Band::new(450.0, 650.0),
    ideal: Band::new(380.0, 720.0),
    acceptable: Band::new(300.0, 820.0),
    hazard: Band::new(200.0, 1000.0),
    ideal_score: 75.0,
    acceptable_score: 35.0,
};

/// Air temperature in °C
pub const TEMPERATURE_BANDS: BandProfile = BandProfile {
    domain: Band::new(-20.0, 60.0),
    deadzone: Band::new(20.0, 26.0),
    ideal: Band::new(17.0, 29.0),
    acceptable: Band::new(12.0, 33.0),
    hazard: Band::new(5.0, 40.0),
    ideal_score: 80.0,
    acceptable_score: 40.0,
};

/// Relative humidity in %
pub const HUMIDITY_BANDS: BandProfile = BandProfile {
    domain: Band::new(0.0, 100.0),
    deadzone: Band::new(45.0, 70.0),
    ideal: Band::new(35.0, 80.0),
    acceptable: Band::new(25.0, 90.0),
    hazard: Band::new(10.0, 100.0),
    ideal_score: 80.0,
    acceptable_score: 40.0,
};

/// Gas reading relative to the clean-air baseline. Anything at or below baseline is clean.
pub const GAS_EXCESS_BANDS: BandProfile = BandProfile {
    domain: Band::new(-1023.0, 1023.0),
    deadzone: Band::new(-1023.0, 50.0),
    ideal: Band::new(-1023.0, 120.0),
    acceptable: Band::new(-1023.0, 250.0),
    hazard: Band::new(-1023.0, 450.0),
    ideal_score: 80.0,
    acceptable_score: 40.0,
};

/// Bio-electrical amplitude. A flat signal usually means a loose electrode.
pub const BIO_BANDS: BandProfile = BandProfile {
    domain: Band::new(0.0, 1023.0),
    deadzone: Band::new(5.0, 60.0),
    ideal: Band::new(3.0, 100.0),
    acceptable: Band::new(1.5, 200.0),
    hazard: Band::new(0.0, 400.0),
    ideal_score: 80.0,
    acceptable_score: 40.0,
};

/// Domain of the wetness contact sensor
pub const WETNESS_DOMAIN: Band = Band::new(0.0, 1023.0);

/// Domain of the raw gas sensor reading
pub const GAS_DOMAIN: Band = Band::new(0.0, 1023.0);

pub fn soil_score(raw: f64) -> u8 {
    SOIL_BANDS.score(raw)
}

/// Soil score cushioned by fresh surface wetness.
///
/// The soil probe lags a fresh watering by several samples; while the contact
/// sensor is wet a low soil score is lifted, up to [`CUSHION_CEILING`].
pub fn hydration_score(soil_raw: f64, wetness_raw: f64) -> u8 {
    let base = soil_score(soil_raw);
    let wetness = WETNESS_DOMAIN.clamp(wetness_raw);

    if wetness >= WETNESS_PARTIAL_CONTACT || base >= CUSHION_CEILING {
        return base;
    }

    let surface = 1.0 - wetness / WETNESS_PARTIAL_CONTACT;
    let boost = CUSHION_MIN_BOOST + (CUSHION_MAX_BOOST - CUSHION_MIN_BOOST) * surface;
    let cushioned = (base as f64 + boost).round() as u8;
    cushioned.min(CUSHION_CEILING)
}

pub fn temperature_score(celsius: f64) -> u8 {
    TEMPERATURE_BANDS.score(celsius)
}

pub fn humidity_score(percent: f64) -> u8 {
    HUMIDITY_BANDS.score(percent)
}

/// Air quality from a raw gas reading and the sensor's clean-air baseline
pub fn air_quality_score(gas_raw: f64, baseline: f64) -> u8 {
    let baseline = if baseline.is_finite() {
        baseline
    } else {
        DEFAULT_GAS_BASELINE
    };
    GAS_EXCESS_BANDS.score(gas_raw - baseline)
}

pub fn bio_signal_score(amplitude: f64) -> u8 {
    BIO_BANDS.score(amplitude)
}

/// Normalizer for turning one raw sample into per-sensor scores
pub struct Normalizer;

impl Normalizer {
    /// Score every sensor of a sample
    pub fn normalize(sample: &RawSample, gas_baseline: f64) -> SensorScores {
        SensorScores {
            hydration: hydration_score(sample.soil_moisture, sample.wetness_contact),
            temperature: temperature_score(sample.temperature),
            humidity: humidity_score(sample.humidity),
            air_quality: air_quality_score(sample.gas_level, gas_baseline),
            bio_signal: bio_signal_score(sample.bio_signal),
        }
    }
}
