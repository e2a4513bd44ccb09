//! leaflog-core library.
//!
//! A plant care log with point-in-time status reconstruction. Every
//! operation takes the store handle (`&rusqlite::Connection`, opened with
//! [`db::open_store`]) and, where it derives anything time-dependent, an
//! explicit `now` captured once by the caller.
//!
//! # Conventions
//!
//! - **Errors**: core operations return [`Result`] with [`LeafError`];
//!   store opening and config loading use `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!` on writes, `debug!` on
//!   derivations, `warn!` on cache drift).
//! - **Time**: timestamps are UTC, stored as microseconds since the epoch.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod event;
pub mod growth;
pub mod history;
pub mod model;
pub mod notify;
pub mod records;
pub mod report;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod time;

pub use dashboard::{DashboardStats, dashboard_stats};
pub use error::{ErrorCode, LeafError, RecordKind, Result};
pub use event::{Event, EventFilter, EventId, EventOrder, EventType, NewEvent};
pub use growth::growth_trend;
pub use history::{StatusTransition, history};
pub use model::measurement::{MeasurementSample, NewMeasurement};
pub use model::notification::Notification;
pub use model::plant::{NewPlant, Plant, PlantUpdate};
pub use model::reminder::{DriftPolicy, Frequency, NewReminder, Reminder, ReminderType};
pub use model::status::PlantStatus;
pub use scheduler::{Completion, active_reminders, complete_reminder, is_overdue};
pub use status::status_at;
pub use store::{append_event, append_measurement, query_events};
