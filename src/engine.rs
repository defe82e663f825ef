//! Analytics Engine
//!
//! The engine is the sole owner and mutator of the aggregate document. Every
//! mutation (recording a session, importing a backup, changing settings,
//! clearing history) runs to completion and ends with a full-document save
//! through the [`AnalyticsStore`]; there is no partial write and no other
//! writer.
//!
//! ## Recording Pipeline
//!
//! 1. **Construct**: a fresh [`Session`] with a unique id, `end_time = now`
//!    and `start_time` backdated by the duration
//! 2. **Append**: push onto the session list, bump the rolling totals
//! 3. **Accumulate**: apply the module's stat policy from the
//!    [`ModuleRegistry`]; unknown module keys record a session but no stats
//! 4. **Streak**: advance the consecutive-day state machine on the local
//!    calendar day
//! 5. **Persist**: save the whole document
//!
//! ## Read Queries
//!
//! All read queries are pure functions over the in-memory document. They are
//! pull-based: presentation asks when it wants fresh data, nothing is pushed.
//!
//! ## Import / Export
//!
//! Export serializes the full document. Import merges sessions from a
//! previously exported document by unseen id, recomputes the totals
//! wholesale, and deliberately leaves `module_stats` and `streaks` alone;
//! re-importing the same artifact is a no-op.
//!
//! Every operation that needs the wall clock has an `_at` variant taking the
//! time explicitly; the plain variants use [`Local::now`].

use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::format::{format_duration, format_local_date, format_relative_time};
use crate::models::{AggregateDocument, Session, Settings, SettingsPatch};
use crate::modules::ModuleRegistry;
use crate::store::AnalyticsStore;

/// Chart labels for the weekly activity buckets, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A recently recorded session annotated for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct RecentSession {
    #[serde(flatten)]
    pub session: Session,
    #[serde(rename = "moduleName")]
    pub module_name: String,
    #[serde(rename = "formattedTime")]
    pub formatted_time: String,
    #[serde(rename = "formattedDuration")]
    pub formatted_duration: String,
}

/// A history row: every session, newest-recorded first.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub session: Session,
    #[serde(rename = "moduleName")]
    pub module_name: String,
    #[serde(rename = "formattedDate")]
    pub formatted_date: String,
    #[serde(rename = "formattedDuration")]
    pub formatted_duration: String,
}

/// One point of the performance trend series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendEntry {
    pub label: String,
    pub score: u32,
}

/// Total practice time per module, for the breakdown chart.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleBreakdown {
    pub module: String,
    pub name: String,
    pub minutes: u64,
}

pub struct AnalyticsEngine {
    store: AnalyticsStore,
    registry: ModuleRegistry,
    data: AggregateDocument,
}

impl AnalyticsEngine {
    pub fn new(store: AnalyticsStore) -> Self {
        Self::with_registry(store, ModuleRegistry::new())
    }

    pub fn with_registry(store: AnalyticsStore, registry: ModuleRegistry) -> Self {
        let data = store.load();
        Self {
            store,
            registry,
            data,
        }
    }

    pub fn data(&self) -> &AggregateDocument {
        &self.data
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    // --- Recording ---------------------------------------------------------

    /// Record one completed exercise attempt and persist the document.
    ///
    /// Returns the session as stored. Exercises call this exactly once per
    /// completed (or abandoned-but-substantial) attempt.
    pub fn record_session(
        &mut self,
        module: &str,
        duration: u64,
        score: Option<u32>,
        metrics: Map<String, Value>,
    ) -> Session {
        self.record_session_at(Local::now(), module, duration, score, metrics)
    }

    /// Clock-explicit variant of [`Self::record_session`].
    pub fn record_session_at(
        &mut self,
        now: DateTime<Local>,
        module: &str,
        duration: u64,
        score: Option<u32>,
        metrics: Map<String, Value>,
    ) -> Session {
        let end_time = now.with_timezone(&Utc);
        let start_time = end_time - Duration::seconds(duration as i64);

        let session = Session {
            id: generate_session_id(end_time),
            module: module.to_string(),
            start_time,
            end_time,
            duration,
            score,
            metrics,
        };

        self.data.sessions.push(session.clone());
        self.data.totals.time_spent += duration;
        self.data.totals.sessions_completed += 1;

        if let Some(policy) = self.registry.policy(module) {
            let stats = self
                .data
                .module_stats
                .entry(module.to_string())
                .or_insert_with(|| policy.seed());
            policy.accumulate(stats, duration, score, &session.metrics);
        }

        self.data.streaks.advance(now.date_naive());

        debug!(
            session_id = %session.id,
            module = %session.module,
            duration = session.duration,
            score = ?session.score,
            "Recorded session"
        );

        self.store.save(&self.data);
        session
    }

    // --- Settings ----------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.data.settings
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) {
        self.data.settings.apply(patch);
        self.store.save(&self.data);
    }

    /// Reset the document to the default skeleton and persist. Settings reset
    /// along with everything else.
    pub fn clear_all_data(&mut self) {
        self.data = AggregateDocument::skeleton(&self.registry);
        self.store.save(&self.data);
    }

    // --- Import / export ---------------------------------------------------

    /// The full aggregate document as pretty-printed JSON.
    pub fn export_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    /// Suggested file name for a backup taken on `date`.
    pub fn backup_filename(date: NaiveDate) -> String {
        format!("mindgym-backup-{}.json", date.format("%Y-%m-%d"))
    }

    /// Merge a previously exported document into this one.
    ///
    /// Sessions are added only when their id is unseen, then both totals are
    /// recomputed by folding over the merged list. Module stats and streaks
    /// are left as they are. Returns `false` and changes nothing on malformed
    /// input or when the payload lacks the `sessions`/`totals`/`streaks`
    /// structure.
    pub fn import_data(&mut self, raw: &str) -> bool {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Rejecting import: not valid JSON");
                return false;
            }
        };

        let has_shape = value.get("totals").is_some() && value.get("streaks").is_some();
        let Some(sessions_value) = value.get("sessions").filter(|_| has_shape) else {
            debug!("Rejecting import: missing sessions/totals/streaks");
            return false;
        };

        let imported: Vec<Session> = match serde_json::from_value(sessions_value.clone()) {
            Ok(imported) => imported,
            Err(e) => {
                debug!(error = %e, "Rejecting import: unreadable session list");
                return false;
            }
        };

        let existing: HashSet<String> =
            self.data.sessions.iter().map(|s| s.id.clone()).collect();
        let mut merged = 0usize;
        for session in imported {
            if !existing.contains(&session.id) {
                self.data.sessions.push(session);
                merged += 1;
            }
        }

        self.data.totals.time_spent = self.data.sessions.iter().map(|s| s.duration).sum();
        self.data.totals.sessions_completed = self.data.sessions.len() as u64;

        debug!(merged, total = self.data.sessions.len(), "Imported sessions");
        self.store.save(&self.data);
        true
    }

    // --- Read queries ------------------------------------------------------

    /// Sessions whose `start_time` falls within `[start, end]`.
    pub fn sessions_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Session> {
        self.data
            .sessions
            .iter()
            .filter(|s| s.start_time >= start && s.start_time <= end)
            .collect()
    }

    pub fn today_sessions(&self) -> Vec<&Session> {
        self.today_sessions_at(Local::now())
    }

    pub fn today_sessions_at(&self, now: DateTime<Local>) -> Vec<&Session> {
        let day_start = local_day_start(now.date_naive());
        let day_end = day_start + Duration::days(1);
        self.sessions_between(day_start, day_end)
    }

    /// Seconds of practice recorded today.
    pub fn today_seconds(&self) -> u64 {
        self.today_seconds_at(Local::now())
    }

    pub fn today_seconds_at(&self, now: DateTime<Local>) -> u64 {
        self.today_sessions_at(now).iter().map(|s| s.duration).sum()
    }

    /// Sessions from the start of the current week (Sunday, local) until now.
    pub fn week_sessions(&self) -> Vec<&Session> {
        self.week_sessions_at(Local::now())
    }

    pub fn week_sessions_at(&self, now: DateTime<Local>) -> Vec<&Session> {
        let week_start = local_day_start(start_of_week(now.date_naive()));
        self.sessions_between(week_start, now.with_timezone(&Utc))
    }

    /// Minutes of practice per weekday for the current week, Sunday first.
    /// Pairs with [`WEEKDAY_LABELS`].
    pub fn weekly_activity(&self) -> [f64; 7] {
        self.weekly_activity_at(Local::now())
    }

    pub fn weekly_activity_at(&self, now: DateTime<Local>) -> [f64; 7] {
        let week_start = local_day_start(start_of_week(now.date_naive()));
        let mut minutes = [0.0f64; 7];

        for session in &self.data.sessions {
            if session.start_time >= week_start {
                let local = session.start_time.with_timezone(&Local);
                let day_index = local.weekday().num_days_from_sunday() as usize;
                minutes[day_index] += session.duration as f64 / 60.0;
            }
        }

        minutes
    }

    /// Total practice minutes per module across all history, sorted by
    /// display name.
    pub fn module_breakdown(&self) -> Vec<ModuleBreakdown> {
        let mut totals: Vec<(String, u64)> = Vec::new();
        for session in &self.data.sessions {
            match totals.iter_mut().find(|(m, _)| *m == session.module) {
                Some((_, seconds)) => *seconds += session.duration,
                None => totals.push((session.module.clone(), session.duration)),
            }
        }

        let mut breakdown: Vec<ModuleBreakdown> = totals
            .into_iter()
            .map(|(module, seconds)| ModuleBreakdown {
                name: self.registry.display_name(&module),
                module,
                minutes: (seconds as f64 / 60.0).round() as u64,
            })
            .collect();
        breakdown.sort_by(|a, b| a.name.cmp(&b.name));
        breakdown
    }

    /// Score series for the most recent 10 scored sessions, oldest first,
    /// optionally narrowed to one module.
    pub fn performance_trend(&self, module: Option<&str>) -> Vec<TrendEntry> {
        let scored: Vec<&Session> = self
            .data
            .sessions
            .iter()
            .filter(|s| module.map_or(true, |m| s.module == m))
            .filter(|s| s.score.is_some())
            .collect();

        let start = scored.len().saturating_sub(10);
        scored[start..]
            .iter()
            .enumerate()
            .map(|(i, s)| TrendEntry {
                label: format!("Session {}", i + 1),
                score: s.score.unwrap_or(0),
            })
            .collect()
    }

    /// The most recently recorded sessions, newest first, annotated for
    /// presentation. Order is insertion order, not `start_time`.
    pub fn recent_sessions(&self, limit: usize) -> Vec<RecentSession> {
        self.recent_sessions_at(Utc::now(), limit)
    }

    pub fn recent_sessions_at(&self, now: DateTime<Utc>, limit: usize) -> Vec<RecentSession> {
        let start = self.data.sessions.len().saturating_sub(limit);
        self.data.sessions[start..]
            .iter()
            .rev()
            .map(|session| RecentSession {
                module_name: self.registry.display_name(&session.module),
                formatted_time: format_relative_time(session.start_time, now),
                formatted_duration: format_duration(session.duration),
                session: session.clone(),
            })
            .collect()
    }

    /// Every session, newest-recorded first, annotated for the history view.
    pub fn all_sessions(&self) -> Vec<HistoryEntry> {
        self.data
            .sessions
            .iter()
            .rev()
            .map(|session| HistoryEntry {
                module_name: self.registry.display_name(&session.module),
                formatted_date: format_local_date(session.start_time),
                formatted_duration: format_duration(session.duration),
                session: session.clone(),
            })
            .collect()
    }
}

/// Local midnight of `date`, as a UTC instant.
fn local_day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_local_timezone(Local).single())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::from_naive_utc_and_offset(
            date.and_hms_opt(0, 0, 0).unwrap_or_default(),
            Utc,
        ))
}

/// The Sunday that begins the week containing `date`.
fn start_of_week(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Time-based id: base-36 millisecond timestamp plus a random suffix.
/// Collisions are negligible; the id doubles as the import dedup key.
fn generate_session_id(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().max(0) as u64;
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", to_base36(millis), &suffix[..9])
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
