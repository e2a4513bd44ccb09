//! Event data model for the plant care log.
//!
//! An [`Event`] is an immutable, timestamped fact about one plant. Events are
//! ordered by `(event_date, event_id)`: the date first, then insertion order
//! for events that share a timestamp.
//!
//! Status-relevant events carry their *effective* status, resolved once at
//! append time from either the explicit `status_change` payload or the status
//! implied by the event type. Reconstruction never has to re-interpret the
//! event type.

pub mod types;

pub use types::{EventType, UnknownEventType};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use crate::error::{ErrorCode, LeafError, Result};
use crate::model::status::PlantStatus;

/// Row identifier assigned by the store on append.
pub type EventId = i64;

/// A stored event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_id: EventId,
    pub plant_id: i64,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,
    /// Effective status; `None` for care events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlantStatus>,
}

impl Event {
    /// Total log order: event date, then insertion order.
    #[must_use]
    pub fn log_order(&self, other: &Self) -> Ordering {
        self.event_date
            .cmp(&other.event_date)
            .then_with(|| self.event_id.cmp(&other.event_id))
    }
}

/// An event that has not been appended yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub plant_id: i64,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub performed_by: Option<String>,
    /// Explicit status payload. Required for `status_change`, rejected for
    /// every other type.
    pub status: Option<PlantStatus>,
}

impl NewEvent {
    /// A bare event of `event_type` at `event_date` with no payload.
    #[must_use]
    pub const fn new(plant_id: i64, event_type: EventType, event_date: DateTime<Utc>) -> Self {
        Self {
            plant_id,
            event_type,
            event_date,
            description: None,
            amount: None,
            performed_by: None,
            status: None,
        }
    }

    /// A `status_change` event to `status`.
    #[must_use]
    pub const fn status_change(
        plant_id: i64,
        status: PlantStatus,
        event_date: DateTime<Utc>,
    ) -> Self {
        let mut event = Self::new(plant_id, EventType::StatusChange, event_date);
        event.status = Some(status);
        event
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn performed_by(mut self, who: impl Into<String>) -> Self {
        self.performed_by = Some(who.into());
        self
    }

    /// Validate the payload and resolve the status this event records.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidEventPayload`] when a `status_change` has no
    /// status, when any other type carries one, or when `amount` is negative
    /// or not finite.
    pub fn effective_status(&self) -> Result<Option<PlantStatus>> {
        if let Some(amount) = self.amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(LeafError::validation(
                    ErrorCode::InvalidEventPayload,
                    format!("event amount must be a non-negative number, got {amount}"),
                ));
            }
        }

        match (self.event_type, self.status) {
            (EventType::StatusChange, Some(status)) => Ok(Some(status)),
            (EventType::StatusChange, None) => Err(LeafError::validation(
                ErrorCode::InvalidEventPayload,
                "status_change events require a status",
            )),
            (other, Some(status)) => Err(LeafError::validation(
                ErrorCode::InvalidEventPayload,
                format!("{other} events cannot carry an explicit status ({status})"),
            )),
            (other, None) => Ok(other.implied_status()),
        }
    }
}

/// Direction for event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

impl EventOrder {
    pub(crate) const fn sql_clause(self) -> &'static str {
        match self {
            Self::OldestFirst => "ORDER BY event_date_us ASC, event_id ASC",
            Self::NewestFirst => "ORDER BY event_date_us DESC, event_id DESC",
        }
    }
}

/// Filter criteria for [`crate::store::query_events`].
///
/// All fields are optional and combine with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to these types. Empty means all types.
    pub event_types: Vec<EventType>,
    /// Only events with a status (explicit or implied).
    pub status_relevant_only: bool,
    /// Inclusive lower bound on `event_date`.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `event_date`.
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub order: EventOrder,
}

impl EventFilter {
    /// Whether `event` passes the non-pagination criteria.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        (self.event_types.is_empty() || self.event_types.contains(&event.event_type))
            && (!self.status_relevant_only || event.status.is_some())
            && self.since.is_none_or(|since| event.event_date >= since)
            && self.until.is_none_or(|until| event.event_date <= until)
    }
}
