//! State derivation
//!
//! Maps the current score set and raw sample to one discrete label. Rules are
//! checked in priority order and the first match wins, so a plant being
//! watered on a cold windowsill still reads as BEING_WATERED.

use crate::normalizer::{HUMIDITY_BANDS, TEMPERATURE_BANDS, WETNESS_DOMAIN};
use crate::types::{EmotionState, RawSample, ScoreSet};

/// Wetness reading below which the surface is considered actively wet
pub const WATERING_WETNESS: f64 = 300.0;
/// Hydration below which a wet surface means water is being added
pub const WATERING_HYDRATION: u8 = 70;

pub const NEARLY_DEAD_HYDRATION: u8 = 15;
pub const NEEDS_WATER_HYDRATION: u8 = 40;

pub const TOO_HOT_CELSIUS: f64 = 32.0;
pub const TOO_COLD_CELSIUS: f64 = 10.0;
pub const TOO_HUMID_PERCENT: f64 = 90.0;

pub const AIR_BAD_SCORE: u8 = 50;
pub const CHECK_CONNECTION_SCORE: u8 = 30;

/// Every score must reach this for FEELS_GREAT
pub const FEELS_GREAT_SCORE: u8 = 80;

/// Derive the state label for one sample
pub fn derive_state(scores: &ScoreSet, sample: &RawSample) -> EmotionState {
    let wetness = WETNESS_DOMAIN.clamp(sample.wetness_contact);
    let temperature = TEMPERATURE_BANDS.domain.clamp(sample.temperature);
    let humidity = HUMIDITY_BANDS.domain.clamp(sample.humidity);

    if wetness < WATERING_WETNESS && scores.hydration < WATERING_HYDRATION {
        EmotionState::BeingWatered
    } else if scores.hydration <= NEARLY_DEAD_HYDRATION {
        EmotionState::NearlyDead
    } else if scores.hydration < NEEDS_WATER_HYDRATION {
        EmotionState::NeedsWater
    } else if temperature >= TOO_HOT_CELSIUS {
        EmotionState::TooHot
    } else if temperature <= TOO_COLD_CELSIUS {
        EmotionState::TooCold
    } else if humidity >= TOO_HUMID_PERCENT {
        EmotionState::TooHumid
    } else if scores.air_quality < AIR_BAD_SCORE {
        EmotionState::AirBad
    } else if scores.bio_signal < CHECK_CONNECTION_SCORE {
        EmotionState::CheckConnection
    } else if feels_great(scores) {
        EmotionState::FeelsGreat
    } else {
        EmotionState::Okay
    }
}

fn feels_great(scores: &ScoreSet) -> bool {
    [
        scores.hydration,
        scores.comfort,
        scores.air_quality,
        scores.bio_signal,
    ]
    .iter()
    .all(|&score| score >= FEELS_GREAT_SCORE)
}
