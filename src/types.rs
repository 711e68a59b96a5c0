//! Core types for the Plant Pulse engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: raw samples, per-sensor scores, comfort indices, the derived state
//! label and the event/reminder side effects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One instant-in-time reading from the plant's sensor board
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Soil moisture (ADC scale, lower = wetter)
    pub soil_moisture: f64,
    /// Air temperature (°C)
    pub temperature: f64,
    /// Ambient relative humidity (%)
    pub humidity: f64,
    /// MQ-type gas sensor reading (ADC scale, higher = worse air)
    pub gas_level: f64,
    /// Rain/wetness contact (ADC scale, lower = wetter)
    pub wetness_contact: f64,
    /// Bio-electrical signal amplitude
    pub bio_signal: f64,
    /// Arrival time of the sample
    pub received_at: DateTime<Utc>,
}

impl RawSample {
    /// Create a sample stamped with the current time
    pub fn new(
        soil_moisture: f64,
        temperature: f64,
        humidity: f64,
        gas_level: f64,
        wetness_contact: f64,
        bio_signal: f64,
    ) -> Self {
        Self {
            soil_moisture,
            temperature,
            humidity,
            gas_level,
            wetness_contact,
            bio_signal,
            received_at: Utc::now(),
        }
    }

    /// Re-stamp the sample with an explicit arrival time
    pub fn at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }
}

/// Raw per-sensor scores (0-100) before aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorScores {
    /// Soil score, cushioned by surface wetness
    pub hydration: u8,
    pub temperature: u8,
    pub humidity: u8,
    pub air_quality: u8,
    pub bio_signal: u8,
}

/// Per-sample 0-100 scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub hydration: u8,
    /// Mean of the temperature and humidity scores
    pub comfort: u8,
    pub air_quality: u8,
    pub bio_signal: u8,
}

/// Indices in [0, 1] computed from one sample against the care targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComfortIndices {
    /// Soil moisture as a percentage (0 = bone dry, 100 = saturated)
    pub soil_percent: f64,
    pub moisture_index: f64,
    pub temperature_index: f64,
    pub humidity_index: f64,
}

/// Smoothed comfort metrics as published by the temporal tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComfortMetrics {
    pub soil_percent: f64,
    pub moisture_index: f64,
    pub temperature_index: f64,
    pub humidity_index: f64,
    /// Watering freshness (Wi), never above `moisture_index`
    pub watering_index: f64,
    /// Air stability (Gi)
    pub gas_index: f64,
    /// Multiplicative plant comfort score (PCS)
    pub plant_comfort: f64,
}

/// Discrete state label shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionState {
    BeingWatered,
    NearlyDead,
    NeedsWater,
    TooHot,
    TooCold,
    TooHumid,
    AirBad,
    CheckConnection,
    FeelsGreat,
    Okay,
}

impl EmotionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionState::BeingWatered => "BEING_WATERED",
            EmotionState::NearlyDead => "NEARLY_DEAD",
            EmotionState::NeedsWater => "NEEDS_WATER",
            EmotionState::TooHot => "TOO_HOT",
            EmotionState::TooCold => "TOO_COLD",
            EmotionState::TooHumid => "TOO_HUMID",
            EmotionState::AirBad => "AIR_BAD",
            EmotionState::CheckConnection => "CHECK_CONNECTION",
            EmotionState::FeelsGreat => "FEELS_GREAT",
            EmotionState::Okay => "OKAY",
        }
    }

    /// Human-readable log message for entering this state
    pub fn message(&self) -> &'static str {
        match self {
            EmotionState::BeingWatered => "Ahh, a drink! Thanks for watering me.",
            EmotionState::NearlyDead => "My soil is critically dry. I need water right now!",
            EmotionState::NeedsWater => "I'm getting thirsty, please water me soon.",
            EmotionState::TooHot => "It's too hot in here for me.",
            EmotionState::TooCold => "Brr, it's too cold for me.",
            EmotionState::TooHumid => "The air is sweltering and damp.",
            EmotionState::AirBad => "The air around me smells bad.",
            EmotionState::CheckConnection => "I can't feel my sensors, check the connection.",
            EmotionState::FeelsGreat => "I'm feeling great!",
            EmotionState::Okay => "I'm doing okay.",
        }
    }
}

impl std::fmt::Display for EmotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a logged plant event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Watered,
    Warning,
}

/// A state transition entry in the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantEvent {
    pub id: Uuid,
    pub kind: EventKind,
    /// State that was entered
    pub state: EmotionState,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Kind of care reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Water,
}

/// The outstanding care reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub is_urgent: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the presentation layer receives for one ingested sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Arrival time of the sample this output was derived from
    pub timestamp: DateTime<Utc>,
    pub scores: ScoreSet,
    /// Legacy additive health blend (0-100)
    pub overall_health: u8,
    /// Last published smoothed metrics
    pub comfort_metrics: ComfortMetrics,
    pub emotion_state: EmotionState,
    /// True when this sample caused a state transition
    pub is_new_event: bool,
    /// The event appended on transition, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<PlantEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<Reminder>,
    /// True when `comfort_metrics` was republished by this sample
    pub changed: bool,
}
