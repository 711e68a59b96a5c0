//! Engine orchestration
//!
//! This module provides the public API for Plant Pulse. It runs each raw
//! sample through the full pipeline:
//! 1. Normalizer - per-sensor scores from the canonical bands
//! 2. ComfortAggregator - composite scores and comfort indices
//! 3. TemporalState - Wi, Gi, PCS, smoothing and the publish gate
//! 4. derive_state - the discrete state label
//! 5. EventLog / ReminderManager - transition log and water reminder

use crate::adapters::FrameAdapter;
use crate::care::{CareProfile, CareTargets};
use crate::comfort::ComfortAggregator;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{EventLog, ReminderManager};
use crate::normalizer::Normalizer;
use crate::persistence::{
    read_benchmark_days, read_last_watered_at, write_benchmark_days, write_last_watered_at,
    KeyValueStore,
};
use crate::state::derive_state;
use crate::tracker::TemporalState;
use crate::types::{EngineOutput, PlantEvent, RawSample, Reminder};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Serializable snapshot of everything an engine learned from its samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EngineSnapshot {
    temporal: TemporalState,
    events: EventLog,
    reminders: ReminderManager,
}

/// Stateful engine for one plant.
///
/// Samples must be ingested one at a time in arrival order. The engine is
/// `Send` but not synchronized: hosts with several producers must serialize
/// calls to [`PlantEngine::ingest`] themselves.
pub struct PlantEngine {
    config: EngineConfig,
    temporal: TemporalState,
    events: EventLog,
    reminders: ReminderManager,
    store: Option<Box<dyn KeyValueStore>>,
}

impl Default for PlantEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlantEngine {
    /// Create a new engine with default settings
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with a specific configuration. Invalid fields fall back to defaults.
    pub fn with_config(config: EngineConfig) -> Self {
        let config = config.sanitized();
        Self {
            temporal: TemporalState::new(config.benchmark_days, config.tracker.gas_window),
            events: EventLog::new(),
            reminders: ReminderManager::new(),
            store: None,
            config,
        }
    }

    /// Process one sample
    pub fn ingest(&mut self, sample: RawSample) -> EngineOutput {
        let sensor_scores = Normalizer::normalize(&sample, self.config.gas_baseline);
        let scores = ComfortAggregator::score_set(&sensor_scores);
        let overall_health = ComfortAggregator::overall_health(&sensor_scores);
        let indices = ComfortAggregator::indices(&sample, &self.config.care_targets);

        let update = self.temporal.update(
            &sample,
            &indices,
            &self.config.tracker,
            self.config.realtime,
        );
        if update.watering_detected {
            self.persist_last_watered_at(sample.received_at);
        }

        let emotion_state = derive_state(&scores, &sample);
        let event = self.events.observe(emotion_state, sample.received_at);
        let reminder = self.reminders.update(&scores, sample.received_at).cloned();

        debug!(
            "Ingested sample: state={} hydration={} comfort={} air={} bio={} changed={}",
            emotion_state,
            scores.hydration,
            scores.comfort,
            scores.air_quality,
            scores.bio_signal,
            update.changed
        );

        EngineOutput {
            timestamp: sample.received_at,
            scores,
            overall_health,
            comfort_metrics: update.published,
            emotion_state,
            is_new_event: event.is_some(),
            event,
            reminder,
            changed: update.changed,
        }
    }

    /// Parse one transport frame and process it
    pub fn ingest_frame(
        &mut self,
        adapter: &dyn FrameAdapter,
        frame: &str,
    ) -> Result<EngineOutput, EngineError> {
        let sample = adapter.parse_frame(frame, Utc::now())?;
        Ok(self.ingest(sample))
    }

    /// Attach a key-value store and restore watering history from it.
    ///
    /// Unreadable values are logged and skipped.
    pub fn attach_store(&mut self, store: Box<dyn KeyValueStore>) {
        match read_last_watered_at(store.as_ref()) {
            Ok(Some(watered_at)) => {
                info!("Restored last watering time {}", watered_at.to_rfc3339());
                self.temporal
                    .watering_mut()
                    .set_last_watered_at(Some(watered_at));
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring stored watering time: {e}"),
        }

        match read_benchmark_days(store.as_ref()) {
            Ok(Some(days)) => {
                if self.temporal.watering_mut().set_benchmark_days(days) {
                    self.config.benchmark_days = days;
                } else {
                    warn!("Ignoring stored benchmark days: {days}");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring stored benchmark days: {e}"),
        }

        self.store = Some(store);
    }

    /// Detach and return the store
    pub fn detach_store(&mut self) -> Option<Box<dyn KeyValueStore>> {
        self.store.take()
    }

    pub fn store(&self) -> Option<&dyn KeyValueStore> {
        self.store.as_deref()
    }

    fn persist_last_watered_at(&mut self, watered_at: DateTime<Utc>) {
        if let Some(store) = self.store.as_deref_mut() {
            if let Err(e) = write_last_watered_at(store, watered_at) {
                warn!("Failed to persist watering time: {e}");
            }
        }
    }

    fn persist_benchmark_days(&mut self, days: f64) {
        if let Some(store) = self.store.as_deref_mut() {
            if let Err(e) = write_benchmark_days(store, days) {
                warn!("Failed to persist benchmark days: {e}");
            }
        }
    }

    /// Replace the care targets used for comfort indices
    pub fn set_care_targets(&mut self, targets: CareTargets) {
        self.config.care_targets = targets;
    }

    /// Replace the clean-air gas baseline. Non-finite values are ignored.
    pub fn set_gas_baseline(&mut self, baseline: f64) -> bool {
        if baseline.is_finite() {
            self.config.gas_baseline = baseline;
            true
        } else {
            false
        }
    }

    /// Replace the expected watering interval and persist it.
    /// Non-positive or non-finite values are ignored.
    pub fn set_benchmark_days(&mut self, days: f64) -> bool {
        if !self.temporal.watering_mut().set_benchmark_days(days) {
            return false;
        }
        self.config.benchmark_days = days;
        self.persist_benchmark_days(days);
        true
    }

    /// Apply a species care profile: its targets, and its watering interval when readable
    pub fn apply_care_profile(&mut self, profile: &CareProfile) {
        self.set_care_targets(profile.targets);
        if let Some(days) = profile.benchmark_days() {
            self.set_benchmark_days(days);
        }
        if let Some(species) = &profile.species {
            info!("Applied care profile for {species}");
        }
    }

    /// Publish every sample instead of only noticeable changes
    pub fn set_realtime(&mut self, realtime: bool) {
        self.config.realtime = realtime;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only view of temporal state
    pub fn temporal(&self) -> &TemporalState {
        &self.temporal
    }

    /// Logged state transitions, oldest first
    pub fn events(&self) -> impl Iterator<Item = &PlantEvent> {
        self.events.events()
    }

    /// The outstanding reminder, if any
    pub fn reminder(&self) -> Option<&Reminder> {
        self.reminders.current()
    }

    /// Load learned state from JSON
    pub fn load_state(&mut self, json: &str) -> Result<(), EngineError> {
        let snapshot: EngineSnapshot = serde_json::from_str(json)?;
        self.temporal = snapshot.temporal;
        self.events = snapshot.events;
        self.reminders = snapshot.reminders;
        self.config.benchmark_days = self.temporal.watering().benchmark_days();
        Ok(())
    }

    /// Save learned state to JSON
    pub fn save_state(&self) -> Result<String, EngineError> {
        let snapshot = EngineSnapshot {
            temporal: self.temporal.clone(),
            events: self.events.clone(),
            reminders: self.reminders.clone(),
        };
        Ok(serde_json::to_string(&snapshot)?)
    }
}
