//! Output record encoding
//!
//! This module wraps engine outputs into self-describing JSON records for
//! downstream consumers (CLI pipes, FFI hosts). Each record names the producer
//! and the threshold set it was scored with.

use crate::error::EngineError;
use crate::normalizer::BANDS_VERSION;
use crate::types::EngineOutput;
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current output record schema version
pub const RECORD_VERSION: &str = "1.0.0";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Where and when a record was computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub bands_version: String,
    pub received_at_utc: String,
    pub computed_at_utc: String,
    /// Seconds between sample arrival and encoding
    pub latency_sec: i64,
}

/// One encoded engine output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub record_version: String,
    pub producer: Producer,
    pub provenance: Provenance,
    pub output: EngineOutput,
}

/// Encoder producing output records
pub struct OutputEncoder {
    instance_id: String,
}

impl Default for OutputEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn encode(&self, output: &EngineOutput) -> OutputRecord {
        self.encode_at(output, Utc::now())
    }

    /// Encode with an explicit computation time
    pub fn encode_at(&self, output: &EngineOutput, computed_at: DateTime<Utc>) -> OutputRecord {
        OutputRecord {
            record_version: RECORD_VERSION.to_string(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: Provenance {
                bands_version: BANDS_VERSION.to_string(),
                received_at_utc: output.timestamp.to_rfc3339(),
                computed_at_utc: computed_at.to_rfc3339(),
                latency_sec: (computed_at - output.timestamp).num_seconds().max(0),
            },
            output: output.clone(),
        }
    }

    /// Encode to a single-line JSON string (one NDJSON record)
    pub fn encode_to_json(&self, output: &EngineOutput) -> Result<String, EngineError> {
        Ok(serde_json::to_string(&self.encode(output))?)
    }

    /// Encode to pretty-printed JSON
    pub fn encode_to_json_pretty(&self, output: &EngineOutput) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&self.encode(output))?)
    }
}
