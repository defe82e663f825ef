//! Output Formatting and Display Management
//!
//! Terminal presentation for the dashboard, report, history, and settings
//! views. Provides both human-readable colored output and structured JSON
//! for programmatic consumption.
//!
//! The display layer is pull-only: it renders whatever the engine's read
//! queries and the reporting layer hand it, and never touches persistence.

use colored::Colorize;
use serde_json::json;

use crate::engine::{AnalyticsEngine, HistoryEntry, WEEKDAY_LABELS};
use crate::format::{format_duration, format_local_date, format_total_time};
use crate::models::Settings;
use crate::report::{FilteredStats, Page, TrendPoint};

pub struct DisplayManager;

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayManager {
    pub fn new() -> Self {
        Self
    }

    pub fn display_dashboard(&self, engine: &AnalyticsEngine, json_output: bool) {
        let data = engine.data();
        let today_seconds = engine.today_seconds();
        let weekly = engine.weekly_activity();
        let breakdown = engine.module_breakdown();
        let recent = engine.recent_sessions(10);

        if json_output {
            let output = json!({
                "totals": data.totals,
                "streaks": data.streaks,
                "todaySeconds": today_seconds,
                "weeklyActivity": {
                    "labels": WEEKDAY_LABELS,
                    "minutes": weekly,
                },
                "moduleBreakdown": breakdown,
                "recentSessions": recent,
            });
            match serde_json::to_string_pretty(&output) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Error serializing dashboard to JSON: {}", e),
            }
            return;
        }

        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", "Mind Gym - Dashboard".bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());

        println!(
            "\n{} {} sessions • {} total practice • today {}\n",
            "📊".bright_yellow(),
            data.totals
                .sessions_completed
                .to_string()
                .bright_white()
                .bold(),
            format_total_time(data.totals.time_spent).bright_green().bold(),
            format_duration(today_seconds).bright_white().bold()
        );

        println!(
            "{} Streak: {} day(s) (longest {})",
            "🔥".bright_yellow(),
            data.streaks.current.to_string().bright_white().bold(),
            data.streaks.longest.to_string().bright_white()
        );

        println!("\n{} This week:", "📅".bright_blue());
        for (label, minutes) in WEEKDAY_LABELS.iter().zip(weekly.iter()) {
            println!(
                "   {}: {} min",
                label.bright_cyan(),
                format!("{:.0}", minutes).bright_white()
            );
        }

        if !breakdown.is_empty() {
            println!("\n{} Practice by exercise:", "🧠".bright_yellow());
            for entry in &breakdown {
                println!(
                    "   {}: {} min",
                    entry.name.bright_cyan(),
                    entry.minutes.to_string().bright_white()
                );
            }
        }

        if !recent.is_empty() {
            println!("\n{} Recent sessions:", "🕑".bright_blue());
            for session in &recent {
                let score = session
                    .session
                    .score
                    .map(|s| format!("{}%", s))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "   {} — {} ({}, {})",
                    session.module_name.bright_cyan(),
                    session.formatted_time.bright_white(),
                    session.formatted_duration,
                    score.bright_green()
                );
            }
        }

        println!();
    }

    pub fn display_report(
        &self,
        stats: &FilteredStats,
        trend: &[TrendPoint],
        page: &Page<'_>,
        registry: &crate::modules::ModuleRegistry,
        json_output: bool,
    ) {
        if json_output {
            let rows: Vec<_> = page
                .items
                .iter()
                .map(|s| {
                    json!({
                        "id": s.id,
                        "module": s.module,
                        "startTime": s.start_time,
                        "duration": s.duration,
                        "score": s.score,
                    })
                })
                .collect();
            let output = json!({
                "statistics": stats,
                "trend": trend,
                "page": page.page,
                "totalPages": page.total_pages,
                "sessions": rows,
            });
            match serde_json::to_string_pretty(&output) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Error serializing report to JSON: {}", e),
            }
            return;
        }

        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", "Mind Gym - Session Report".bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());

        println!(
            "\n{} {} sessions • {} total\n",
            "📊".bright_yellow(),
            stats.sessions.to_string().bright_white().bold(),
            format_duration(stats.total_duration).bright_green().bold()
        );

        match &stats.scores {
            Some(scores) => {
                println!(
                    "   Accuracy: avg {} • best {} • worst {} • ±{}",
                    format!("{}%", scores.mean).bright_green().bold(),
                    format!("{}%", scores.best).bright_white(),
                    format!("{}%", scores.worst).bright_white(),
                    scores.std_dev.to_string().bright_yellow()
                );
            }
            None => println!("   Accuracy: {}", "no data".bright_black()),
        }

        if !trend.is_empty() {
            println!("\n{} Trend:", "📈".bright_blue());
            for point in trend {
                let score = point
                    .score
                    .map(|s| format!("{}%", s))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "   {}: {} ({} min)",
                    point.label.bright_cyan(),
                    score.bright_green(),
                    format!("{:.1}", point.minutes).bright_white()
                );
            }
        }

        println!(
            "\n{} Sessions (page {} of {}):",
            "📋".bright_blue(),
            page.page.to_string().bright_white().bold(),
            page.total_pages.to_string().bright_white()
        );
        for session in &page.items {
            let score = session
                .score
                .map(|s| format!("{}%", s))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "   {} — {} ({}, {})",
                format_local_date(session.start_time).bright_white(),
                registry.display_name(&session.module).bright_cyan(),
                format_duration(session.duration),
                score.bright_green()
            );
        }
        println!();
    }

    pub fn display_history(&self, entries: &[HistoryEntry], json_output: bool) {
        if json_output {
            match serde_json::to_string_pretty(&entries) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Error serializing history to JSON: {}", e),
            }
            return;
        }

        if entries.is_empty() {
            println!("No sessions recorded yet.");
            return;
        }

        println!("\n{} {} session(s):\n", "📋".bright_blue(), entries.len());
        for entry in entries {
            let score = entry
                .session
                .score
                .map(|s| format!("{}%", s))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "   {} — {} ({}, {})",
                entry.formatted_date.bright_white(),
                entry.module_name.bright_cyan(),
                entry.formatted_duration,
                score.bright_green()
            );
        }
        println!();
    }

    pub fn display_settings(&self, settings: &Settings, json_output: bool) {
        if json_output {
            match serde_json::to_string_pretty(settings) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Error serializing settings to JSON: {}", e),
            }
            return;
        }

        println!("\n{} Settings:", "⚙️".bright_yellow());
        println!(
            "   Master volume: {}",
            settings.master_volume.to_string().bright_white().bold()
        );
        println!(
            "   Sound effects: {}",
            if settings.sound_effects {
                "on".bright_green()
            } else {
                "off".bright_black()
            }
        );
        println!("   Theme: {:?}\n", settings.theme);
    }
}
