//! CSV frame adapter
//!
//! Parses bare rows `soil,temperature,humidity,gas,wetness,bio` as printed by
//! the board's serial console, with an optional seventh timestamp column.

use crate::error::EngineError;
use crate::types::RawSample;
use chrono::{DateTime, Utc};

use super::{parse_timestamp, FrameAdapter};

const COLUMNS: [&str; 6] = ["soil", "temperature", "humidity", "gas", "wetness", "bio"];

/// CSV frame adapter
pub struct CsvFrameAdapter;

impl FrameAdapter for CsvFrameAdapter {
    fn parse_frame(
        &self,
        frame: &str,
        received_at: DateTime<Utc>,
    ) -> Result<RawSample, EngineError> {
        let fields: Vec<&str> = frame.split(',').map(str::trim).collect();
        if fields.len() < COLUMNS.len() || fields.len() > COLUMNS.len() + 1 {
            return Err(EngineError::FrameError(format!(
                "expected {} or {} columns, got {}",
                COLUMNS.len(),
                COLUMNS.len() + 1,
                fields.len()
            )));
        }

        let mut values = [0.0; 6];
        for (i, name) in COLUMNS.iter().enumerate() {
            values[i] = fields[i].parse::<f64>().map_err(|_| {
                EngineError::FrameError(format!("column '{}' is not a number: '{}'", name, fields[i]))
            })?;
        }

        let received_at = match fields.get(COLUMNS.len()) {
            Some(text) if !text.is_empty() => parse_timestamp(text)?,
            _ => received_at,
        };

        Ok(RawSample {
            soil_moisture: values[0],
            temperature: values[1],
            humidity: values[2],
            gas_level: values[3],
            wetness_contact: values[4],
            bio_signal: values[5],
            received_at,
        })
    }

    fn is_header(&self, line: &str) -> bool {
        line.split(',')
            .next()
            .map(|first| first.trim().eq_ignore_ascii_case(COLUMNS[0]))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_row() {
        let sample = CsvFrameAdapter
            .parse_frame("550, 23.5, 55, 210, 900, 20", now())
            .unwrap();
        assert_eq!(sample.soil_moisture, 550.0);
        assert_eq!(sample.temperature, 23.5);
        assert_eq!(sample.bio_signal, 20.0);
        assert_eq!(sample.received_at, now());
    }

    #[test]
    fn test_parse_row_with_timestamp() {
        let sample = CsvFrameAdapter
            .parse_frame("550,23,55,200,900,20,2024-05-01T08:00:00Z", Utc::now())
            .unwrap();
        assert_eq!(sample.received_at, now());
    }

    #[test]
    fn test_wrong_column_count() {
        let err = CsvFrameAdapter.parse_frame("550,23,55", now()).unwrap_err();
        assert!(matches!(err, EngineError::FrameError(_)));
    }

    #[test]
    fn test_non_numeric_column() {
        let err = CsvFrameAdapter
            .parse_frame("550,23,55,gas,900,20", now())
            .unwrap_err();
        assert!(err.to_string().contains("gas"));
    }

    #[test]
    fn test_batch_skips_header() {
        let input = "soil,temperature,humidity,gas,wetness,bio\n550,23,55,200,900,20\n";
        let samples = CsvFrameAdapter.parse_batch(input).unwrap();
        assert_eq!(samples.len(), 1);
    }
}
