//! Plant Pulse - On-device engine for houseplant sensor boards
//!
//! Plant Pulse turns raw readings from a plant's sensor board (soil moisture,
//! air temperature, humidity, gas, surface wetness, bio-signal) into
//! user-facing scores and care guidance through a deterministic pipeline:
//! score normalization → comfort aggregation → temporal tracking → state
//! derivation → events and reminders.
//!
//! ## Modules
//!
//! - **Engine**: [`PlantEngine`] ingests one sample at a time and returns an [`EngineOutput`]
//! - **Adapters**: JSON and CSV transport frame parsing
//! - **Persistence**: key-value stores for watering history
//! - **FFI**: C ABI for mobile and embedded hosts

pub mod adapters;
pub mod care;
pub mod comfort;
pub mod config;
pub mod encoder;
pub mod error;
pub mod events;
pub mod gas;
pub mod normalizer;
pub mod persistence;
pub mod pipeline;
pub mod scenario;
pub mod state;
pub mod tracker;
pub mod types;
pub mod watering;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use care::{CareProfile, CareTargets};
pub use config::EngineConfig;
pub use error::EngineError;
pub use pipeline::PlantEngine;
pub use types::{
    ComfortMetrics, EmotionState, EngineOutput, PlantEvent, RawSample, Reminder, ScoreSet,
};

/// Engine version embedded in all output records
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for output records
pub const PRODUCER_NAME: &str = "plant-pulse";
