//! Care targets and care profiles
//!
//! Care targets bound the comfort indices. They come from a species care
//! profile looked up elsewhere (photo identification, plant database) and may
//! be replaced at any time. Missing or inconsistent bounds fall back to
//! built-in defaults.

use serde::{Deserialize, Serialize};

/// Default temperature range (°C)
pub const DEFAULT_TEMPERATURE_RANGE: TargetRange = TargetRange::new(18.0, 27.0);
/// Default ambient humidity range (%)
pub const DEFAULT_HUMIDITY_RANGE: TargetRange = TargetRange::new(40.0, 70.0);
/// Default soil moisture range (%)
pub const DEFAULT_SOIL_RANGE: TargetRange = TargetRange::new(20.0, 60.0);

/// Default days between waterings
pub const DEFAULT_BENCHMARK_DAYS: f64 = 7.0;

/// Per-species comfort bounds, each optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareTargets {
    #[serde(alias = "minTemperature")]
    pub min_temperature: Option<f64>,
    #[serde(alias = "maxTemperature")]
    pub max_temperature: Option<f64>,
    #[serde(alias = "minHumidity")]
    pub min_humidity: Option<f64>,
    #[serde(alias = "maxHumidity")]
    pub max_humidity: Option<f64>,
    #[serde(alias = "minSoilMoisture")]
    pub min_soil_moisture: Option<f64>,
    #[serde(alias = "maxSoilMoisture")]
    pub max_soil_moisture: Option<f64>,
}

impl CareTargets {
    pub fn temperature_range(&self) -> TargetRange {
        TargetRange::resolve(
            self.min_temperature,
            self.max_temperature,
            DEFAULT_TEMPERATURE_RANGE,
        )
    }

    pub fn humidity_range(&self) -> TargetRange {
        TargetRange::resolve(self.min_humidity, self.max_humidity, DEFAULT_HUMIDITY_RANGE)
    }

    pub fn soil_range(&self) -> TargetRange {
        TargetRange::resolve(
            self.min_soil_moisture,
            self.max_soil_moisture,
            DEFAULT_SOIL_RANGE,
        )
    }
}

/// A resolved min/max pair, always with `min < max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub min: f64,
    pub max: f64,
}

impl TargetRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Fill missing bounds from `default`; an inverted or empty pair falls back entirely
    fn resolve(min: Option<f64>, max: Option<f64>, default: TargetRange) -> Self {
        let min = min.filter(|v| v.is_finite()).unwrap_or(default.min);
        let max = max.filter(|v| v.is_finite()).unwrap_or(default.max);
        if min < max {
            Self { min, max }
        } else {
            default
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn half_width(&self) -> f64 {
        (self.max - self.min) / 2.0
    }

    /// Position inside the range: 0 at `min`, 1 at `max`, clamped
    pub fn position(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// 1 at the midpoint, falling linearly to 0 at either bound and beyond
    pub fn closeness(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        (1.0 - (value - self.midpoint()).abs() / self.half_width()).clamp(0.0, 1.0)
    }
}

/// Species care profile as returned by an external lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareProfile {
    /// Species or common name
    pub species: Option<String>,
    /// Free-text watering advice, e.g. "Water every 7-10 days"
    pub watering: Option<String>,
    #[serde(flatten)]
    pub targets: CareTargets,
}

impl CareProfile {
    /// Expected days between waterings, if the advice can be read
    pub fn benchmark_days(&self) -> Option<f64> {
        self.watering.as_deref().and_then(parse_watering_interval)
    }
}

/// Read a watering interval in days from free-text care advice.
///
/// Understands "every N days", ranges such as "every 7-10 days" (midpoint),
/// weeks ("every 2 weeks"), and the words daily, weekly, biweekly,
/// "every other day" and "twice a week".
pub fn parse_watering_interval(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();

    if lower.contains("every other day") {
        return Some(2.0);
    }
    if lower.contains("twice a week") || lower.contains("twice weekly") {
        return Some(3.5);
    }
    if lower.contains("biweekly") || lower.contains("fortnight") {
        return Some(14.0);
    }

    let numbers = leading_numbers(&lower);
    let unit_days = if lower.contains("week") {
        7.0
    } else if lower.contains("month") {
        30.0
    } else {
        1.0
    };

    let days = match numbers.as_slice() {
        [] => {
            if lower.contains("daily") || lower.contains("every day") {
                1.0
            } else if lower.contains("weekly") || lower.contains("once a week") {
                7.0
            } else if lower.contains("monthly") {
                30.0
            } else {
                return None;
            }
        }
        [n] => n * unit_days,
        [lo, hi, ..] => (lo + hi) / 2.0 * unit_days,
    };

    (days.is_finite() && days > 0.0).then_some(days)
}

/// Decimal numbers in reading order, at most two (a range)
fn leading_numbers(text: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    let mut current = String::new();

    for ch in text.chars().chain(std::iter::once(' ')) {
        if ch.is_ascii_digit() || (ch == '.' && !current.is_empty()) {
            current.push(ch);
        } else if !current.is_empty() {
            if let Ok(value) = current.trim_end_matches('.').parse::<f64>() {
                numbers.push(value);
            }
            current.clear();
            if numbers.len() == 2 {
                break;
            }
        }
    }

    numbers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let targets = CareTargets::default();
        assert_eq!(targets.temperature_range(), DEFAULT_TEMPERATURE_RANGE);
        assert_eq!(targets.humidity_range(), DEFAULT_HUMIDITY_RANGE);
        assert_eq!(targets.soil_range(), DEFAULT_SOIL_RANGE);
    }

    #[test]
    fn test_partial_targets_fill_from_defaults() {
        let targets = CareTargets {
            min_temperature: Some(15.0),
            ..Default::default()
        };
        let range = targets.temperature_range();
        assert_eq!(range.min, 15.0);
        assert_eq!(range.max, DEFAULT_TEMPERATURE_RANGE.max);
    }

    #[test]
    fn test_inverted_targets_fall_back() {
        let targets = CareTargets {
            min_humidity: Some(80.0),
            max_humidity: Some(30.0),
            min_soil_moisture: Some(f64::NAN),
            max_soil_moisture: Some(50.0),
            ..Default::default()
        };
        assert_eq!(targets.humidity_range(), DEFAULT_HUMIDITY_RANGE);
        assert_eq!(targets.soil_range(), TargetRange::new(20.0, 50.0));
    }

    #[test]
    fn test_range_position_and_closeness() {
        let range = TargetRange::new(20.0, 60.0);
        assert_eq!(range.position(10.0), 0.0);
        assert_eq!(range.position(40.0), 0.5);
        assert_eq!(range.position(90.0), 1.0);

        assert_eq!(range.closeness(40.0), 1.0);
        assert!((range.closeness(50.0) - 0.5).abs() < 1e-9);
        assert_eq!(range.closeness(60.0), 0.0);
        assert_eq!(range.closeness(100.0), 0.0);
        assert_eq!(range.closeness(f64::NAN), 0.0);
    }

    #[test]
    fn test_parse_watering_interval() {
        assert_eq!(parse_watering_interval("Water every 7-10 days"), Some(8.5));
        assert_eq!(parse_watering_interval("every 8.5 days"), Some(8.5));
        assert_eq!(parse_watering_interval("Every 2 weeks"), Some(14.0));
        assert_eq!(parse_watering_interval("Weekly"), Some(7.0));
        assert_eq!(parse_watering_interval("daily in summer"), Some(1.0));
        assert_eq!(parse_watering_interval("every other day"), Some(2.0));
        assert_eq!(parse_watering_interval("twice a week"), Some(3.5));
        assert_eq!(parse_watering_interval("when the top inch is dry"), None);
        assert_eq!(parse_watering_interval("every 0 days"), None);
    }

    #[test]
    fn test_profile_deserialization() {
        let json = r#"{
            "species": "Monstera deliciosa",
            "watering": "every 7 to 10 days",
            "minTemperature": 16.0,
            "max_temperature": 30.0
        }"#;
        let profile: CareProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.species.as_deref(), Some("Monstera deliciosa"));
        assert_eq!(profile.benchmark_days(), Some(8.5));
        assert_eq!(profile.targets.min_temperature, Some(16.0));
        assert_eq!(profile.targets.max_temperature, Some(30.0));
        assert_eq!(profile.targets.min_humidity, None);
    }
}
