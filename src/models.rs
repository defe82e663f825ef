//! Core Data Models
//!
//! This module defines the primary data structures of the analytics engine:
//! the session record, the single persisted aggregate document, and the
//! derived caches the document carries.
//!
//! ## Data Flow
//!
//! 1. **Recording**: [`Session`] - One completed exercise attempt
//! 2. **Aggregation**: [`AggregateDocument`] - The one persisted object holding
//!    all sessions plus derived caches
//! 3. **Caches**: [`Totals`], [`Streaks`], [`ModuleStats`] - Rolling statistics
//!    updated on every recorded session
//!
//! ## Wire Format
//!
//! All persisted types serialize with camelCase field names so that documents
//! exported by older builds of the app import cleanly. The aggregate document
//! is written as a single JSON object; see [`crate::store`].
//!
//! ## Invariants
//!
//! - `totals.sessions_completed == sessions.len()`
//! - `totals.time_spent == sum(sessions[i].duration)`
//! - every `session.id` is unique
//! - `streaks.current <= streaks.longest`
//! - `module_stats[m].sessions` equals the count of sessions recorded for `m`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::modules::ModuleRegistry;

/// One completed (or substantially attempted) unit of exercise activity.
///
/// Immutable once created. `metrics` is a module-specific payload the engine
/// treats as opaque except for the fields the accumulation policies read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub module: String,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
    /// Duration in whole seconds.
    pub duration: u64,
    /// Integer percentage in [0, 100]; absent for modules without a score.
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub metrics: Map<String, Value>,
}

/// Rolling totals across all recorded sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Totals {
    /// Sum of all session durations, in seconds.
    #[serde(rename = "timeSpent")]
    pub time_spent: u64,
    #[serde(rename = "sessionsCompleted")]
    pub sessions_completed: u64,
}

/// Consecutive-day activity tracking.
///
/// `last_date` is the local calendar day of the most recent recorded session.
/// The transition is applied once per recording in insertion order and is not
/// recomputable from the session list alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
    #[serde(rename = "lastDate", default)]
    pub last_date: Option<NaiveDate>,
}

impl Streaks {
    /// Advance the streak for a session recorded on `today`.
    ///
    /// First session ever starts a streak of 1; a second session the same day
    /// is a no-op; the day after the last session extends the streak; any
    /// longer gap resets `current` to 1 while `longest` keeps its max.
    pub fn advance(&mut self, today: NaiveDate) {
        match self.last_date {
            None => {
                self.current = 1;
                self.longest = self.longest.max(1);
            }
            Some(last) if last == today => return,
            Some(last) if today.pred_opt() == Some(last) => {
                self.current += 1;
                self.longest = self.longest.max(self.current);
            }
            Some(_) => {
                self.current = 1;
            }
        }
        self.last_date = Some(today);
    }
}

/// Per-module rolling statistics.
///
/// The populated fields depend on the module's accumulation policy: score
/// modules carry `total_score`/`best_score`, reaction modules carry
/// `total_time`/`best_time`, level modules `best_level`, duration-only
/// modules `total_time`. `best_time` starts absent rather than at infinity
/// so the document stays valid JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleStats {
    pub sessions: u64,
    #[serde(rename = "totalScore", default, skip_serializing_if = "Option::is_none")]
    pub total_score: Option<u64>,
    #[serde(rename = "bestScore", default, skip_serializing_if = "Option::is_none")]
    pub best_score: Option<u32>,
    #[serde(rename = "totalTime", default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(rename = "bestTime", default, skip_serializing_if = "Option::is_none")]
    pub best_time: Option<f64>,
    #[serde(rename = "bestLevel", default, skip_serializing_if = "Option::is_none")]
    pub best_level: Option<u32>,
}

/// Color theme for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

/// User-adjustable settings, independent of session data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// 0-100.
    #[serde(rename = "masterVolume")]
    pub master_volume: u8,
    #[serde(rename = "soundEffects")]
    pub sound_effects: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 70,
            sound_effects: true,
            theme: Theme::Dark,
        }
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    #[serde(rename = "masterVolume")]
    pub master_volume: Option<u8>,
    #[serde(rename = "soundEffects")]
    pub sound_effects: Option<bool>,
    pub theme: Option<Theme>,
}

impl Settings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(volume) = patch.master_volume {
            self.master_volume = volume.min(100);
        }
        if let Some(sound) = patch.sound_effects {
            self.sound_effects = sound;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
    }
}

/// The single persisted object: all sessions plus the derived caches.
///
/// `sessions` is append-only; insertion order is the order of recording,
/// which after an import merge is not necessarily `start_time` order.
/// A missing `settings` block deserializes to the defaults; the other
/// top-level fields are required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateDocument {
    pub sessions: Vec<Session>,
    pub totals: Totals,
    pub streaks: Streaks,
    #[serde(rename = "moduleStats")]
    pub module_stats: HashMap<String, ModuleStats>,
    #[serde(default)]
    pub settings: Settings,
}

impl AggregateDocument {
    /// The default skeleton: empty history, zeroed caches, stat slots
    /// pre-seeded for every module the registry knows about.
    pub fn skeleton(registry: &ModuleRegistry) -> Self {
        Self {
            sessions: Vec::new(),
            totals: Totals::default(),
            streaks: Streaks::default(),
            module_stats: registry.seed_stats(),
            settings: Settings::default(),
        }
    }
}

impl Default for AggregateDocument {
    fn default() -> Self {
        Self::skeleton(&ModuleRegistry::new())
    }
}
