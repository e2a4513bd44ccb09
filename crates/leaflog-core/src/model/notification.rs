use chrono::{DateTime, Utc};
use serde::Serialize;

/// An alert raised for an overdue reminder.
///
/// Created unread; the only mutation is being marked read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub notification_id: i64,
    pub reminder_id: i64,
    pub plant_id: i64,
    pub message: String,
    /// The `next_due` of the reminder when the notification was raised.
    pub due_at: DateTime<Utc>,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
