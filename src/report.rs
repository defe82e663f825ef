//! Reporting / Filter Layer
//!
//! Stateless transformations of the session collection into
//! presentation-ready views: filtering, chart series, sorting, pagination,
//! summary statistics, and CSV/JSON export of the filtered set.
//!
//! Everything here is recomputed from scratch on each call; the layer keeps
//! no incremental state and never touches persistence. Presentation builds a
//! [`SessionReport`] from the engine's document whenever its filters change
//! and derives all views from that one snapshot.
//!
//! ## Filter Semantics
//!
//! The filter is a predicate over an inclusive calendar-day range and an
//! optional module key. Day boundaries are local: the range covers local
//! midnight of the start day through 23:59:59 of the end day, so a session
//! starting exactly at 23:59:59 is in and one second later is out.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, SecondsFormat, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::Session;
use crate::modules::ModuleRegistry;

/// Rows shown per page in the session table.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// The report view defaults to the last 90 days.
pub const DEFAULT_WINDOW_DAYS: u64 = 90;

/// Predicate over calendar-day range and module.
#[derive(Debug, Clone)]
pub struct SessionFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// `None` means all modules.
    pub module: Option<String>,
}

impl SessionFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            module: None,
        }
    }

    /// The default dashboard window: the `days` days ending `today`,
    /// inclusive.
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        let start = today
            .checked_sub_days(Days::new(days.saturating_sub(1)))
            .unwrap_or(today);
        Self::new(start, today)
    }

    pub fn with_module(mut self, module: Option<String>) -> Self {
        self.module = module.filter(|m| m != "all");
        self
    }

    /// UTC instants of the local day boundaries: start-day midnight and
    /// end-day 23:59:59.
    fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            local_instant(self.start, 0, 0, 0),
            local_instant(self.end, 23, 59, 59),
        )
    }

    pub fn matches(&self, session: &Session) -> bool {
        let (start, end) = self.bounds();
        if session.start_time < start || session.start_time > end {
            return false;
        }
        match &self.module {
            Some(module) => session.module == *module,
            None => true,
        }
    }
}

/// How chart points are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// One point per session, chronological.
    None,
    /// Group by local calendar day.
    Day,
    /// Group by the Sunday that begins the session's week.
    Week,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Module,
    Duration,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One chart point: mean score over the scored sessions of the group (absent
/// when none scored) and summed minutes to one decimal place.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub score: Option<u32>,
    pub minutes: f64,
}

/// Statistics over the scored subset of the filtered sessions.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreStats {
    pub mean: u32,
    pub best: u32,
    pub worst: u32,
    #[serde(rename = "stdDev")]
    pub std_dev: f64,
}

/// Summary of the filtered set. `scores` is absent, not zeroed, when no
/// session in the set has a score.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredStats {
    pub sessions: usize,
    #[serde(rename = "totalDuration")]
    pub total_duration: u64,
    pub scores: Option<ScoreStats>,
}

/// One page of the sorted session table.
#[derive(Debug)]
pub struct Page<'a> {
    pub items: Vec<&'a Session>,
    pub page: usize,
    pub total_pages: usize,
}

/// A filtered snapshot of the session collection, insertion order preserved.
pub struct SessionReport {
    sessions: Vec<Session>,
}

impl SessionReport {
    pub fn build(all: &[Session], filter: &SessionFilter) -> Self {
        Self {
            sessions: all.iter().filter(|s| filter.matches(s)).cloned().collect(),
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Stable sort of the filtered set. Sessions without a score sort as -1
    /// when sorting by score.
    pub fn sorted(&self, key: SortKey, direction: SortDirection) -> Vec<&Session> {
        let mut rows: Vec<&Session> = self.sessions.iter().collect();
        rows.sort_by(|a, b| {
            let ordering = match key {
                SortKey::Date => a.start_time.cmp(&b.start_time),
                SortKey::Module => a.module.cmp(&b.module),
                SortKey::Duration => a.duration.cmp(&b.duration),
                SortKey::Score => score_rank(a).cmp(&score_rank(b)),
            };
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        rows
    }

    /// Slice one page out of a sorted row set. The page index is clamped to
    /// `[1, total_pages]`; an empty set still has one (empty) page.
    pub fn page<'a>(rows: &[&'a Session], page: usize, page_size: usize) -> Page<'a> {
        let page_size = page_size.max(1);
        let total_pages = ((rows.len() + page_size - 1) / page_size).max(1);
        let page = page.clamp(1, total_pages);
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(rows.len());
        Page {
            items: rows.get(start..end).unwrap_or(&[]).to_vec(),
            page,
            total_pages,
        }
    }

    /// Chart series for the filtered set under the given grouping.
    pub fn trend(&self, aggregation: Aggregation) -> Vec<TrendPoint> {
        let mut chronological: Vec<&Session> = self.sessions.iter().collect();
        chronological.sort_by_key(|s| s.start_time);

        if aggregation == Aggregation::None {
            return chronological
                .iter()
                .map(|s| TrendPoint {
                    label: local_date_label(s.start_time),
                    score: s.score,
                    minutes: round_minutes(s.duration),
                })
                .collect();
        }

        #[derive(Default)]
        struct Group {
            total_duration: u64,
            total_score: u64,
            scored: u32,
        }

        let mut groups: BTreeMap<NaiveDate, Group> = BTreeMap::new();
        for session in chronological {
            let local_day = session.start_time.with_timezone(&Local).date_naive();
            let key = match aggregation {
                Aggregation::Week => start_of_week(local_day),
                _ => local_day,
            };
            let group = groups.entry(key).or_default();
            group.total_duration += session.duration;
            if let Some(score) = session.score {
                group.total_score += u64::from(score);
                group.scored += 1;
            }
        }

        groups
            .into_iter()
            .map(|(key, group)| TrendPoint {
                label: key.format("%-m/%-d/%Y").to_string(),
                score: (group.scored > 0).then(|| {
                    (group.total_score as f64 / group.scored as f64).round() as u32
                }),
                minutes: round_minutes(group.total_duration),
            })
            .collect()
    }

    /// Count, total duration, and score statistics over the filtered set.
    pub fn statistics(&self) -> FilteredStats {
        let total_duration = self.sessions.iter().map(|s| s.duration).sum();
        let scores: Vec<u32> = self.sessions.iter().filter_map(|s| s.score).collect();

        let score_stats = if scores.is_empty() {
            None
        } else {
            let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
            let mean = sum as f64 / scores.len() as f64;
            let variance = scores
                .iter()
                .map(|&s| (f64::from(s) - mean).powi(2))
                .sum::<f64>()
                / scores.len() as f64;
            Some(ScoreStats {
                mean: mean.round() as u32,
                best: scores.iter().copied().max().unwrap_or(0),
                worst: scores.iter().copied().min().unwrap_or(0),
                std_dev: (variance.sqrt() * 10.0).round() / 10.0,
            })
        };

        FilteredStats {
            sessions: self.sessions.len(),
            total_duration,
            scores: score_stats,
        }
    }

    /// Session counts per local hour of day, 24 buckets.
    pub fn time_of_day(&self) -> [u32; 24] {
        let mut buckets = [0u32; 24];
        for session in &self.sessions {
            let hour = session.start_time.with_timezone(&Local).hour() as usize;
            buckets[hour.min(23)] += 1;
        }
        buckets
    }

    /// Session counts per module display name, in first-seen order.
    pub fn module_distribution(&self, registry: &ModuleRegistry) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for session in &self.sessions {
            let name = registry.display_name(&session.module);
            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }
        counts
    }

    /// The filtered sessions as CSV, one row per session. Absent scores are
    /// empty fields.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Date,Module,Duration (s),Accuracy,Score\n");
        for session in &self.sessions {
            let score = session
                .score
                .map(|s| s.to_string())
                .unwrap_or_default();
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                session.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
                session.module,
                session.duration,
                score,
                score
            ));
        }
        out
    }

    /// The filtered sessions as pretty-printed JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.sessions)?)
    }
}

fn score_rank(session: &Session) -> i64 {
    session.score.map_or(-1, i64::from)
}

fn round_minutes(seconds: u64) -> f64 {
    (seconds as f64 / 60.0 * 10.0).round() / 10.0
}

fn local_date_label(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%-m/%-d/%Y")
        .to_string()
}

fn local_instant(date: NaiveDate, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour, min, sec)
        .and_then(|dt| dt.and_local_timezone(Local).single())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| {
            DateTime::from_naive_utc_and_offset(
                date.and_hms_opt(hour, min, sec).unwrap_or_default(),
                Utc,
            )
        })
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::Map;

    fn session_at(local: DateTime<Local>, module: &str, duration: u64, score: Option<u32>) -> Session {
        let start = local.with_timezone(&Utc);
        Session {
            id: format!("{}-{}", module, start.timestamp_millis()),
            module: module.to_string(),
            start_time: start,
            end_time: start + Duration::seconds(duration as i64),
            duration,
            score,
            metrics: Map::new(),
        }
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, s).single().unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filter_end_day_boundary() {
        let inside = session_at(local(2024, 3, 10, 23, 59, 59), "meditation", 60, None);
        let outside = session_at(local(2024, 3, 11, 0, 0, 0), "meditation", 60, None);
        let filter = SessionFilter::new(day(2024, 3, 1), day(2024, 3, 10));
        assert!(filter.matches(&inside));
        assert!(!filter.matches(&outside));
    }

    #[test]
    fn test_filter_start_day_boundary() {
        let inside = session_at(local(2024, 3, 1, 0, 0, 0), "meditation", 60, None);
        let outside = session_at(local(2024, 2, 29, 23, 59, 59), "meditation", 60, None);
        let filter = SessionFilter::new(day(2024, 3, 1), day(2024, 3, 10));
        assert!(filter.matches(&inside));
        assert!(!filter.matches(&outside));
    }

    #[test]
    fn test_filter_module_all_is_no_filter() {
        let session = session_at(local(2024, 3, 5, 12, 0, 0), "beep-tracker", 60, Some(80));
        let filter = SessionFilter::new(day(2024, 3, 1), day(2024, 3, 10))
            .with_module(Some("all".to_string()));
        assert!(filter.matches(&session));

        let narrowed = SessionFilter::new(day(2024, 3, 1), day(2024, 3, 10))
            .with_module(Some("reaction-test".to_string()));
        assert!(!narrowed.matches(&session));
    }

    #[test]
    fn test_statistics_std_dev() {
        let sessions = vec![
            session_at(local(2024, 3, 5, 9, 0, 0), "beep-tracker", 60, Some(80)),
            session_at(local(2024, 3, 5, 10, 0, 0), "beep-tracker", 60, Some(90)),
            session_at(local(2024, 3, 5, 11, 0, 0), "beep-tracker", 60, Some(100)),
        ];
        let report = SessionReport {
            sessions,
        };
        let stats = report.statistics();
        let scores = stats.scores.unwrap();
        assert_eq!(scores.mean, 90);
        assert_eq!(scores.best, 100);
        assert_eq!(scores.worst, 80);
        assert_eq!(scores.std_dev, 8.2);
    }

    #[test]
    fn test_statistics_without_scores_is_absent() {
        let report = SessionReport {
            sessions: vec![session_at(local(2024, 3, 5, 9, 0, 0), "meditation", 300, None)],
        };
        let stats = report.statistics();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.total_duration, 300);
        assert!(stats.scores.is_none());
    }

    #[test]
    fn test_sort_by_score_nulls_last_descending() {
        let report = SessionReport {
            sessions: vec![
                session_at(local(2024, 3, 5, 9, 0, 0), "meditation", 60, None),
                session_at(local(2024, 3, 5, 10, 0, 0), "beep-tracker", 60, Some(70)),
                session_at(local(2024, 3, 5, 11, 0, 0), "beep-tracker", 60, Some(95)),
            ],
        };
        let rows = report.sorted(SortKey::Score, SortDirection::Descending);
        assert_eq!(rows[0].score, Some(95));
        assert_eq!(rows[1].score, Some(70));
        assert_eq!(rows[2].score, None);
    }

    #[test]
    fn test_sort_is_stable_across_equal_keys() {
        let a = session_at(local(2024, 3, 5, 9, 0, 0), "beep-tracker", 60, Some(80));
        let b = session_at(local(2024, 3, 5, 10, 0, 0), "focus-counter", 60, Some(80));
        let report = SessionReport {
            sessions: vec![a.clone(), b.clone()],
        };
        let rows = report.sorted(SortKey::Score, SortDirection::Ascending);
        assert_eq!(rows[0].id, a.id);
        assert_eq!(rows[1].id, b.id);
    }

    #[test]
    fn test_pagination_clamps_page_index() {
        let sessions: Vec<Session> = (0..7)
            .map(|i| session_at(local(2024, 3, 5, 9, i, 0), "meditation", 60, None))
            .collect();
        let report = SessionReport { sessions };
        let rows = report.sorted(SortKey::Date, SortDirection::Ascending);

        let page = SessionReport::page(&rows, 99, 3);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 1);

        let page = SessionReport::page(&rows, 0, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn test_pagination_empty_set_has_one_page() {
        let report = SessionReport { sessions: vec![] };
        let rows = report.sorted(SortKey::Date, SortDirection::Ascending);
        let page = SessionReport::page(&rows, 1, 15);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_trend_day_aggregation_means_scores() {
        let report = SessionReport {
            sessions: vec![
                session_at(local(2024, 3, 5, 9, 0, 0), "beep-tracker", 120, Some(80)),
                session_at(local(2024, 3, 5, 11, 0, 0), "beep-tracker", 60, Some(91)),
                session_at(local(2024, 3, 5, 13, 0, 0), "meditation", 60, None),
                session_at(local(2024, 3, 6, 9, 0, 0), "meditation", 300, None),
            ],
        };
        let points = report.trend(Aggregation::Day);
        assert_eq!(points.len(), 2);
        // Scored mean rounds half up: (80 + 91) / 2 = 85.5 -> 86.
        assert_eq!(points[0].score, Some(86));
        assert_eq!(points[0].minutes, 4.0);
        assert_eq!(points[1].score, None);
        assert_eq!(points[1].minutes, 5.0);
    }

    #[test]
    fn test_trend_week_aggregation_groups_by_sunday() {
        let report = SessionReport {
            sessions: vec![
                // 2024-03-05 (Tue) and 2024-03-06 (Wed) share the 03-03 Sunday.
                session_at(local(2024, 3, 5, 9, 0, 0), "meditation", 60, None),
                session_at(local(2024, 3, 6, 9, 0, 0), "meditation", 60, None),
                // 2024-03-12 (Tue) belongs to the 03-10 week.
                session_at(local(2024, 3, 12, 9, 0, 0), "meditation", 60, None),
            ],
        };
        let points = report.trend(Aggregation::Week);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].minutes, 2.0);
        assert_eq!(points[1].minutes, 1.0);
    }

    #[test]
    fn test_trend_none_has_one_point_per_session() {
        let report = SessionReport {
            sessions: vec![
                session_at(local(2024, 3, 6, 9, 0, 0), "beep-tracker", 90, Some(75)),
                session_at(local(2024, 3, 5, 9, 0, 0), "beep-tracker", 60, Some(80)),
            ],
        };
        let points = report.trend(Aggregation::None);
        assert_eq!(points.len(), 2);
        // Chronological, so the March 5th session leads despite insertion order.
        assert_eq!(points[0].score, Some(80));
        assert_eq!(points[1].minutes, 1.5);
    }

    #[test]
    fn test_csv_shape() {
        let report = SessionReport {
            sessions: vec![
                session_at(local(2024, 3, 5, 9, 0, 0), "beep-tracker", 60, Some(90)),
                session_at(local(2024, 3, 5, 10, 0, 0), "meditation", 300, None),
            ],
        };
        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Module,Duration (s),Accuracy,Score");
        assert!(lines[1].contains(",beep-tracker,60,90,90"));
        assert!(lines[2].ends_with(",meditation,300,,"));
    }

    #[test]
    fn test_time_of_day_buckets() {
        let report = SessionReport {
            sessions: vec![
                session_at(local(2024, 3, 5, 9, 15, 0), "meditation", 60, None),
                session_at(local(2024, 3, 6, 9, 45, 0), "meditation", 60, None),
                session_at(local(2024, 3, 5, 21, 0, 0), "meditation", 60, None),
            ],
        };
        let buckets = report.time_of_day();
        assert_eq!(buckets[9], 2);
        assert_eq!(buckets[21], 1);
        assert_eq!(buckets.iter().sum::<u32>(), 3);
    }

    #[test]
    fn test_module_distribution_uses_display_names() {
        let registry = ModuleRegistry::new();
        let report = SessionReport {
            sessions: vec![
                session_at(local(2024, 3, 5, 9, 0, 0), "focus-counter", 60, Some(80)),
                session_at(local(2024, 3, 5, 10, 0, 0), "focus-counter", 60, Some(85)),
                session_at(local(2024, 3, 5, 11, 0, 0), "meditation", 300, None),
            ],
        };
        let distribution = report.module_distribution(&registry);
        assert_eq!(distribution[0], ("SART Test".to_string(), 2));
        assert_eq!(distribution[1], ("Guided Meditation".to_string(), 1));
    }

    #[test]
    fn test_last_days_window_is_inclusive() {
        let filter = SessionFilter::last_days(day(2024, 3, 10), 90);
        assert_eq!(filter.end, day(2024, 3, 10));
        assert_eq!(filter.start, day(2023, 12, 12));
    }
}
