//! Sensor frame adapters
//!
//! This module provides adapters that parse transport frames from the sensor
//! board into raw samples. Frames arrive one per line, either as JSON objects
//! or as bare CSV rows.

mod csv;
mod json;

pub use self::csv::CsvFrameAdapter;
pub use self::json::JsonFrameAdapter;

use crate::error::EngineError;
use crate::types::RawSample;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Trait for transport frame adapters
pub trait FrameAdapter {
    /// Parse one frame. Frames without a timestamp are stamped with `received_at`.
    fn parse_frame(&self, frame: &str, received_at: DateTime<Utc>)
        -> Result<RawSample, EngineError>;

    /// Parse a multi-line batch, skipping blank lines and `#` comments
    fn parse_batch(&self, input: &str) -> Result<Vec<RawSample>, EngineError> {
        let mut samples = Vec::new();
        for (line_no, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || self.is_header(line) {
                continue;
            }
            let sample = self
                .parse_frame(line, Utc::now())
                .map_err(|e| match e {
                    EngineError::FrameError(msg) => {
                        EngineError::FrameError(format!("line {}: {}", line_no + 1, msg))
                    }
                    other => other,
                })?;
            samples.push(sample);
        }
        Ok(samples)
    }

    /// Whether a line is a column header rather than data
    fn is_header(&self, _line: &str) -> bool {
        false
    }
}

/// Wire format of incoming frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    #[default]
    Json,
    Csv,
}

impl FrameFormat {
    pub fn adapter(&self) -> Box<dyn FrameAdapter> {
        match self {
            FrameFormat::Json => Box::new(JsonFrameAdapter),
            FrameFormat::Csv => Box::new(CsvFrameAdapter),
        }
    }
}

impl FromStr for FrameFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" | "ndjson" => Ok(FrameFormat::Json),
            "csv" => Ok(FrameFormat::Csv),
            other => Err(EngineError::FrameError(format!(
                "unknown frame format '{other}'"
            ))),
        }
    }
}

/// Parse a frame timestamp: RFC 3339 text or Unix epoch milliseconds
pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, EngineError> {
    let text = text.trim();
    if let Ok(millis) = text.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| EngineError::DateParseError(format!("epoch millis out of range: {text}")));
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EngineError::DateParseError(format!("{text}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<FrameFormat>().unwrap(), FrameFormat::Json);
        assert_eq!("NDJSON".parse::<FrameFormat>().unwrap(), FrameFormat::Json);
        assert_eq!("csv".parse::<FrameFormat>().unwrap(), FrameFormat::Csv);
        assert!("xml".parse::<FrameFormat>().is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T08:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T10:00:00+02:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp(&expected.timestamp_millis().to_string()).unwrap(),
            expected
        );
        assert!(matches!(
            parse_timestamp("last tuesday"),
            Err(EngineError::DateParseError(_))
        ));
    }

    #[test]
    fn test_batch_reports_line_number() {
        let input = "# board v2\n550,23,55,200,900,20\n\n550,23,oops,200,900,20\n";
        let err = FrameFormat::Csv.adapter().parse_batch(input).unwrap_err();
        assert!(err.to_string().contains("line 4"), "{err}");
    }
}
