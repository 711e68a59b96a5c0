//! Key-value persistence
//!
//! The engine persists two values across restarts: the last watering time and
//! the expected watering interval. Stores are plain string key-value maps so
//! a host can back them with whatever it has (preferences, NVS, a file).

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Last watering time, RFC 3339
pub const KEY_LAST_WATERED_AT: &str = "last_watered_at";
/// Expected watering interval in days, decimal string
pub const KEY_BENCHMARK_DAYS: &str = "benchmark_days";

/// String key-value store
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), EngineError>;
}

/// Volatile in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a flat JSON object on disk, rewritten on every set
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open a store, starting empty when the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            if json.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&json).map_err(|e| {
                    EngineError::StoreError(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        let mut values = self.values.clone();
        values.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&values)?;
        std::fs::write(&self.path, json)?;
        self.values = values;
        Ok(())
    }
}

/// Read the persisted watering time
pub fn read_last_watered_at(
    store: &dyn KeyValueStore,
) -> Result<Option<DateTime<Utc>>, EngineError> {
    match store.get(KEY_LAST_WATERED_AT)? {
        Some(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| EngineError::DateParseError(format!("{text}: {e}"))),
        None => Ok(None),
    }
}

/// Read the persisted watering interval
pub fn read_benchmark_days(store: &dyn KeyValueStore) -> Result<Option<f64>, EngineError> {
    match store.get(KEY_BENCHMARK_DAYS)? {
        Some(text) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| EngineError::StoreError(format!("{KEY_BENCHMARK_DAYS}={text}: {e}"))),
        None => Ok(None),
    }
}

pub fn write_last_watered_at(
    store: &mut dyn KeyValueStore,
    watered_at: DateTime<Utc>,
) -> Result<(), EngineError> {
    store.set(KEY_LAST_WATERED_AT, &watered_at.to_rfc3339())
}

pub fn write_benchmark_days(store: &mut dyn KeyValueStore, days: f64) -> Result<(), EngineError> {
    store.set(KEY_BENCHMARK_DAYS, &days.to_string())
}
