//! Mind Gym Analytics Library
//!
//! Session analytics and persistence for a collection of attention-training
//! exercises. The library owns the data model, the derived statistics, the
//! consecutive-day streak tracking, import/export with merge semantics, and
//! the filtering/aggregation behind the dashboard and report views.
//!
//! ## Architecture Overview
//!
//! The library is organized around several key modules:
//!
//! - [`models`] - Session records, the persisted aggregate document, and its
//!   derived caches
//! - [`modules`] - Registry mapping exercise module keys to display names and
//!   stat accumulation policies
//! - [`store`] - Durable storage of the single JSON document
//! - [`engine`] - The analytics engine: recording, streaks, read queries,
//!   import/export/merge, settings
//! - [`report`] - Stateless filtering, aggregation, sorting, pagination, and
//!   CSV/JSON export for the report views
//! - [`format`] - Duration and relative-time display formatting
//! - [`scoring`] - Accuracy formulas shared by the exercise frontends
//! - [`display`] - Terminal presentation of the dashboard and report views
//! - [`config`] - Configuration management with environment variable support
//! - [`logging`] - Structured logging with JSON and pretty-print formats
//!
//! ## Main Entry Point
//!
//! The primary interface is [`AnalyticsEngine`], constructed explicitly on a
//! store and passed wherever it is needed:
//!
//! ```rust
//! use mind_gym::{AnalyticsEngine, AnalyticsStore};
//!
//! # fn example(data_dir: &std::path::Path) {
//! let store = AnalyticsStore::in_dir(data_dir);
//! let mut analytics = AnalyticsEngine::new(store);
//!
//! let session = analytics.record_session(
//!     "beep-tracker",
//!     95,
//!     Some(90),
//!     serde_json::Map::new(),
//! );
//! assert_eq!(session.duration, 95);
//! # }
//! ```
//!
//! Every mutation persists the full document before returning; expected
//! failures (malformed import, missing storage) surface as boolean results
//! or silent fallback to defaults rather than errors.

pub mod config;
pub mod display;
pub mod engine;
pub mod format;
pub mod logging;
pub mod models;
pub mod modules;
pub mod report;
pub mod scoring;
pub mod store;

pub use engine::AnalyticsEngine;
pub use models::{AggregateDocument, Session, Settings, SettingsPatch, Theme};
pub use modules::{ModuleRegistry, StatPolicy};
pub use report::{SessionFilter, SessionReport};
pub use store::AnalyticsStore;
