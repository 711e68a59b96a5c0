//! JSON frame adapter
//!
//! Parses one JSON object per frame. Field names follow the board firmware;
//! the camelCase names used by the companion app are accepted as aliases.

use crate::error::EngineError;
use crate::types::RawSample;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{parse_timestamp, FrameAdapter};

/// JSON frame adapter
pub struct JsonFrameAdapter;

impl FrameAdapter for JsonFrameAdapter {
    fn parse_frame(
        &self,
        frame: &str,
        received_at: DateTime<Utc>,
    ) -> Result<RawSample, EngineError> {
        let frame: JsonFrame = serde_json::from_str(frame)?;

        let received_at = match frame.timestamp {
            Some(FrameTime::Millis(millis)) => parse_timestamp(&millis.to_string())?,
            Some(FrameTime::Text(text)) => parse_timestamp(&text)?,
            None => received_at,
        };

        Ok(RawSample {
            soil_moisture: required(frame.soil, "soil")?,
            temperature: required(frame.temperature, "temperature")?,
            humidity: required(frame.humidity, "humidity")?,
            gas_level: required(frame.gas, "gas")?,
            wetness_contact: required(frame.wetness, "wetness")?,
            bio_signal: required(frame.bio, "bio")?,
            received_at,
        })
    }
}

fn required(value: Option<f64>, field: &str) -> Result<f64, EngineError> {
    value.ok_or_else(|| EngineError::MissingField(field.to_string()))
}

#[derive(Debug, Deserialize)]
struct JsonFrame {
    #[serde(alias = "soilMoisture", alias = "soil_moisture")]
    soil: Option<f64>,
    #[serde(alias = "temp")]
    temperature: Option<f64>,
    humidity: Option<f64>,
    #[serde(alias = "gasLevel", alias = "gas_level")]
    gas: Option<f64>,
    #[serde(alias = "wetnessContact", alias = "wetness_contact", alias = "rain")]
    wetness: Option<f64>,
    #[serde(alias = "bioSignal", alias = "bio_signal")]
    bio: Option<f64>,
    #[serde(alias = "receivedAt", alias = "received_at")]
    timestamp: Option<FrameTime>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FrameTime {
    Millis(i64),
    Text(String),
}
