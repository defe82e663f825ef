use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process;

use mind_gym::config::Config;
use mind_gym::display::DisplayManager;
use mind_gym::engine::AnalyticsEngine;
use mind_gym::models::{SettingsPatch, Theme};
use mind_gym::report::{Aggregation, SessionFilter, SessionReport, SortDirection, SortKey};
use mind_gym::store::AnalyticsStore;
use mind_gym::{format, logging};

#[derive(Parser)]
#[command(name = "mind-gym")]
#[command(about = "Session analytics for attention-training exercises")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a completed exercise session
    Record {
        /// Exercise module key (e.g. beep-tracker, meditation)
        #[arg(long)]
        module: String,
        /// Session duration in seconds
        #[arg(long)]
        duration: u64,
        /// Score percentage (0-100), for score-bearing exercises
        #[arg(long)]
        score: Option<u32>,
        /// Module-specific metrics as a JSON object
        #[arg(long)]
        metrics: Option<String>,
        /// Output the recorded session in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show totals, streaks, weekly activity, and recent sessions
    Dashboard {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Filtered, sorted, paginated session report
    Report {
        /// Start date filter (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Restrict to one module key
        #[arg(long)]
        module: Option<String>,
        /// Chart grouping
        #[arg(long, value_enum, default_value = "none")]
        aggregate: AggregateArg,
        /// Table sort column
        #[arg(long, value_enum, default_value = "date")]
        sort: SortArg,
        /// Sort descending instead of ascending
        #[arg(long)]
        desc: bool,
        /// Page of the session table to show
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,
        /// Output the filtered sessions as CSV instead of a report
        #[arg(long)]
        csv: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// List every recorded session, newest first
    History {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Write a full backup of the analytics document
    Export {
        /// Destination file (defaults to mindgym-backup-<date>.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Merge a previously exported backup into the current data
    Import {
        /// Backup file to import
        file: PathBuf,
    },
    /// Show or update settings
    Settings {
        /// Master volume (0-100)
        #[arg(long)]
        volume: Option<u8>,
        /// Enable or disable sound effects
        #[arg(long)]
        sound_effects: Option<bool>,
        /// Color theme
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Delete all recorded data and reset settings
    Clear {
        /// Skip the confirmation requirement
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AggregateArg {
    None,
    Day,
    Week,
}

impl From<AggregateArg> for Aggregation {
    fn from(arg: AggregateArg) -> Self {
        match arg {
            AggregateArg::None => Aggregation::None,
            AggregateArg::Day => Aggregation::Day,
            AggregateArg::Week => Aggregation::Week,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Date,
    Module,
    Duration,
    Score,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Date => SortKey::Date,
            SortArg::Module => SortKey::Module,
            SortArg::Duration => SortKey::Duration,
            SortArg::Score => SortKey::Score,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    logging::init_logging(&config);

    let store = AnalyticsStore::in_dir(&config.paths.data_dir);
    let mut analytics = AnalyticsEngine::new(store);
    let display = DisplayManager::new();

    match cli.command.unwrap_or(Commands::Dashboard { json: false }) {
        Commands::Record {
            module,
            duration,
            score,
            metrics,
            json,
        } => {
            let metrics = match metrics {
                Some(raw) => match serde_json::from_str(&raw) {
                    Ok(map) => map,
                    Err(e) => {
                        eprintln!("❌ Invalid --metrics JSON: {}", e);
                        process::exit(1);
                    }
                },
                None => serde_json::Map::new(),
            };

            let session = analytics.record_session(&module, duration, score, metrics);
            if json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!(
                    "✅ Recorded {} session ({})",
                    analytics.registry().display_name(&session.module),
                    format::format_duration(session.duration)
                );
            }
            Ok(())
        }
        Commands::Dashboard { json } => {
            display.display_dashboard(&analytics, json);
            Ok(())
        }
        Commands::Report {
            since,
            until,
            module,
            aggregate,
            sort,
            desc,
            page,
            page_size,
            csv,
            json,
        } => {
            let today = Local::now().date_naive();
            let default_window = SessionFilter::last_days(today, config.report.window_days);
            let start = parse_date_arg(since, json).unwrap_or(default_window.start);
            let end = parse_date_arg(until, json).unwrap_or(default_window.end);
            let filter = SessionFilter::new(start, end).with_module(module);

            let report = SessionReport::build(&analytics.data().sessions, &filter);

            if csv {
                print!("{}", report.to_csv());
                return Ok(());
            }

            let stats = report.statistics();
            let trend = report.trend(aggregate.into());
            let direction = if desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            let rows = report.sorted(sort.into(), direction);
            let page = SessionReport::page(
                &rows,
                page,
                page_size.unwrap_or(config.report.page_size),
            );

            display.display_report(&stats, &trend, &page, analytics.registry(), json);
            Ok(())
        }
        Commands::History { json } => {
            display.display_history(&analytics.all_sessions(), json);
            Ok(())
        }
        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| {
                PathBuf::from(AnalyticsEngine::backup_filename(Local::now().date_naive()))
            });
            let payload = analytics.export_json()?;
            fs::write(&path, payload)
                .with_context(|| format!("Failed to write backup to {}", path.display()))?;
            println!(
                "✅ Exported {} sessions to {}",
                analytics.data().sessions.len(),
                path.display()
            );
            Ok(())
        }
        Commands::Import { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if analytics.import_data(&raw) {
                println!(
                    "✅ Import complete: {} sessions total",
                    analytics.data().sessions.len()
                );
                Ok(())
            } else {
                eprintln!("❌ Failed to import data. Invalid format.");
                process::exit(1);
            }
        }
        Commands::Settings {
            volume,
            sound_effects,
            theme,
            json,
        } => {
            if volume.is_some() || sound_effects.is_some() || theme.is_some() {
                analytics.update_settings(&SettingsPatch {
                    master_volume: volume,
                    sound_effects,
                    theme: theme.map(Theme::from),
                });
            }
            display.display_settings(analytics.settings(), json);
            Ok(())
        }
        Commands::Clear { yes } => {
            if !yes {
                eprintln!("Refusing to delete all data without --yes.");
                process::exit(1);
            }
            analytics.clear_all_data();
            println!("✅ All data cleared.");
            Ok(())
        }
    }
}

fn parse_date_arg(value: Option<String>, json: bool) -> Option<NaiveDate> {
    let raw = value?;
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            if !json {
                eprintln!("❌ Invalid date format: {}. Use YYYY-MM-DD", raw);
            }
            process::exit(1);
        }
    }
}
