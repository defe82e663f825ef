//! Module Registry
//!
//! Maps exercise module keys to their display names and stat accumulation
//! policies. Adding an exercise type is a registration call, not a new code
//! path: the engine looks the policy up by key and applies it blindly.
//!
//! ## Policies
//!
//! - [`StatPolicy::ScoreBearing`] - accumulates `total_score`, tracks `best_score`
//! - [`StatPolicy::ReactionTime`] - accumulates average reaction times, tracks the fastest
//! - [`StatPolicy::LevelProgression`] - tracks the highest level reached
//! - [`StatPolicy::DurationOnly`] - accumulates time spent, nothing else

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::models::ModuleStats;

/// How a module's rolling statistics accumulate per recorded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatPolicy {
    /// Exercises producing a 0-100 score per session.
    ScoreBearing,
    /// Exercises reporting `avgTime`/`bestTime` metrics in milliseconds.
    ReactionTime,
    /// Exercises reporting a `level` metric.
    LevelProgression,
    /// Exercises where only the time spent matters.
    DurationOnly,
}

impl StatPolicy {
    /// The empty stats shape this policy maintains.
    pub fn seed(&self) -> ModuleStats {
        let mut stats = ModuleStats::default();
        match self {
            StatPolicy::ScoreBearing => {
                stats.total_score = Some(0);
                stats.best_score = Some(0);
            }
            StatPolicy::ReactionTime => {
                stats.total_time = Some(0.0);
            }
            StatPolicy::LevelProgression => {
                stats.best_level = Some(0);
            }
            StatPolicy::DurationOnly => {
                stats.total_time = Some(0.0);
            }
        }
        stats
    }

    /// Fold one session into `stats`.
    pub fn accumulate(
        &self,
        stats: &mut ModuleStats,
        duration: u64,
        score: Option<u32>,
        metrics: &Map<String, Value>,
    ) {
        stats.sessions += 1;

        match self {
            StatPolicy::ScoreBearing => {
                if let Some(score) = score {
                    *stats.total_score.get_or_insert(0) += u64::from(score);
                    let best = stats.best_score.get_or_insert(0);
                    *best = (*best).max(score);
                }
            }
            StatPolicy::ReactionTime => {
                if let Some(avg) = metrics.get("avgTime").and_then(Value::as_f64) {
                    *stats.total_time.get_or_insert(0.0) += avg;
                    if let Some(best) = metrics.get("bestTime").and_then(Value::as_f64) {
                        stats.best_time = Some(match stats.best_time {
                            Some(current) => current.min(best),
                            None => best,
                        });
                    }
                }
            }
            StatPolicy::LevelProgression => {
                if let Some(level) = metrics.get("level").and_then(Value::as_u64) {
                    let level = level.min(u64::from(u32::MAX)) as u32;
                    let best = stats.best_level.get_or_insert(0);
                    *best = (*best).max(level);
                }
            }
            StatPolicy::DurationOnly => {
                *stats.total_time.get_or_insert(0.0) += duration as f64;
            }
        }
    }
}

/// The set of known exercise modules.
///
/// Unknown keys are silently ignored by the stats update and echoed verbatim
/// by [`ModuleRegistry::display_name`].
pub struct ModuleRegistry {
    policies: HashMap<String, StatPolicy>,
    names: HashMap<String, String>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// Registry pre-loaded with the built-in exercise modules.
    pub fn new() -> Self {
        let mut registry = Self {
            policies: HashMap::new(),
            names: HashMap::new(),
        };

        registry.register("beep-tracker", StatPolicy::ScoreBearing, "Beep Tracker");
        registry.register("time-estimation", StatPolicy::ScoreBearing, "Time Estimation");
        registry.register("reaction-test", StatPolicy::ReactionTime, "Reaction Test");
        registry.register("memory-sequence", StatPolicy::LevelProgression, "Memory Sequence");
        registry.register("focus-counter", StatPolicy::ScoreBearing, "SART Test");
        registry.register("meditation", StatPolicy::DurationOnly, "Guided Meditation");
        registry.register("meditation-timer", StatPolicy::DurationOnly, "Meditation Timer");
        // Display-only alias; the room records through the plain meditation module.
        registry.alias("meditation-room", "Meditation Room");

        registry
    }

    /// Register a module key with its accumulation policy and display name.
    pub fn register(&mut self, key: &str, policy: StatPolicy, name: &str) {
        self.policies.insert(key.to_string(), policy);
        self.names.insert(key.to_string(), name.to_string());
    }

    /// Register a display name without a stats policy.
    pub fn alias(&mut self, key: &str, name: &str) {
        self.names.insert(key.to_string(), name.to_string());
    }

    pub fn policy(&self, key: &str) -> Option<StatPolicy> {
        self.policies.get(key).copied()
    }

    /// Friendly name for a module key; unknown keys come back unchanged.
    pub fn display_name(&self, key: &str) -> String {
        self.names
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Empty stat slots for every module with a policy.
    pub fn seed_stats(&self) -> HashMap<String, ModuleStats> {
        self.policies
            .iter()
            .map(|(key, policy)| (key.clone(), policy.seed()))
            .collect()
    }
}
