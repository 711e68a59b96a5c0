//! Events and reminders
//!
//! Turns state labels into side effects: a bounded transition log and a
//! single water reminder with hysteresis, so the reminder does not flicker
//! around its threshold.

use crate::types::{EmotionState, EventKind, PlantEvent, Reminder, ReminderKind, ScoreSet};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Maximum number of retained events
pub const MAX_EVENTS: usize = 20;

/// Hydration below which a water reminder is raised or refreshed
pub const REMINDER_RAISE_HYDRATION: u8 = 40;
/// Hydration at or below which the reminder is urgent
pub const REMINDER_URGENT_HYDRATION: u8 = 20;

// All of these must hold before an outstanding reminder clears
pub const REMINDER_CLEAR_HYDRATION: u8 = 60;
pub const REMINDER_CLEAR_COMFORT: u8 = 50;
pub const REMINDER_CLEAR_AIR: u8 = 50;
pub const REMINDER_CLEAR_BIO: u8 = 30;

/// Bounded FIFO log of state transitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: VecDeque<PlantEvent>,
    last_state: Option<EmotionState>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest label. Returns the appended event on a transition.
    ///
    /// The first label of a session only sets the reference point.
    pub fn observe(&mut self, state: EmotionState, at: DateTime<Utc>) -> Option<PlantEvent> {
        let previous = self.last_state.replace(state);
        match previous {
            Some(previous) if previous != state => {
                info!("Plant state changed: {previous} -> {state}");
                let event = PlantEvent {
                    id: Uuid::new_v4(),
                    kind: if state == EmotionState::BeingWatered {
                        EventKind::Watered
                    } else {
                        EventKind::Warning
                    },
                    state,
                    message: state.message().to_string(),
                    timestamp: at,
                };
                self.push(event.clone());
                Some(event)
            }
            _ => None,
        }
    }

    fn push(&mut self, event: PlantEvent) {
        self.events.push_back(event);
        while self.events.len() > MAX_EVENTS {
            self.events.pop_front();
        }
    }

    /// Events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &PlantEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last_state(&self) -> Option<EmotionState> {
        self.last_state
    }
}

/// Holder of the single outstanding water reminder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReminderManager {
    current: Option<Reminder>,
}

impl ReminderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the reminder rules to the latest scores and return the outstanding reminder
    pub fn update(&mut self, scores: &ScoreSet, at: DateTime<Utc>) -> Option<&Reminder> {
        if scores.hydration < REMINDER_RAISE_HYDRATION {
            let is_urgent = scores.hydration <= REMINDER_URGENT_HYDRATION;
            let message = if is_urgent {
                "Water me now, my soil is nearly dry!"
            } else {
                "Time to water me soon."
            };
            let created_at = self.current.as_ref().map_or(at, |r| r.created_at);
            if self.current.is_none() {
                info!("Water reminder raised (urgent: {is_urgent})");
            }
            self.current = Some(Reminder {
                kind: ReminderKind::Water,
                is_urgent,
                message: message.to_string(),
                created_at,
                updated_at: at,
            });
        } else if self.current.is_some() && all_clear(scores) {
            info!("Water reminder cleared");
            self.current = None;
        }

        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&Reminder> {
        self.current.as_ref()
    }
}

fn all_clear(scores: &ScoreSet) -> bool {
    scores.hydration >= REMINDER_CLEAR_HYDRATION
        && scores.comfort >= REMINDER_CLEAR_COMFORT
        && scores.air_quality >= REMINDER_CLEAR_AIR
        && scores.bio_signal >= REMINDER_CLEAR_BIO
}
