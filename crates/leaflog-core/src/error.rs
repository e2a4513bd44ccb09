use std::fmt;

/// Machine-readable error codes surfaced by the CLI and any other front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    PlantNotFound,
    ReminderNotFound,
    NotificationNotFound,
    InvalidDateRange,
    InvalidTimestamp,
    InvalidEnumValue,
    InvalidEventPayload,
    InvalidMeasurement,
    InvalidFrequency,
    ReminderInactive,
    InvalidPlant,
    StorageFailure,
    CorruptStore,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::PlantNotFound => "E2001",
            Self::ReminderNotFound => "E2002",
            Self::NotificationNotFound => "E2003",
            Self::InvalidDateRange => "E3001",
            Self::InvalidTimestamp => "E3002",
            Self::InvalidEnumValue => "E3003",
            Self::InvalidEventPayload => "E3004",
            Self::InvalidMeasurement => "E3005",
            Self::InvalidFrequency => "E3006",
            Self::ReminderInactive => "E3007",
            Self::InvalidPlant => "E3008",
            Self::StorageFailure => "E5001",
            Self::CorruptStore => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::PlantNotFound => "Plant not found",
            Self::ReminderNotFound => "Reminder not found",
            Self::NotificationNotFound => "Notification not found",
            Self::InvalidDateRange => "Invalid date range",
            Self::InvalidTimestamp => "Invalid date or timestamp",
            Self::InvalidEnumValue => "Invalid status/event/reminder type",
            Self::InvalidEventPayload => "Invalid event payload",
            Self::InvalidMeasurement => "Invalid measurement",
            Self::InvalidFrequency => "Invalid reminder frequency",
            Self::ReminderInactive => "Reminder is inactive",
            Self::InvalidPlant => "Invalid plant record",
            Self::StorageFailure => "Storage read or write failed",
            Self::CorruptStore => "Corrupt SQLite store",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `leaf init` to create the plant database."),
            Self::ConfigParseError => Some("Fix syntax in .leaflog/config.toml and retry."),
            Self::PlantNotFound => Some("List plants with `leaf plant list`."),
            Self::ReminderNotFound => Some("List reminders with `leaf reminder list`."),
            Self::NotificationNotFound => Some("List unread notifications with `leaf notifications`."),
            Self::InvalidDateRange => Some("The start of the range must not be after its end."),
            Self::InvalidTimestamp => {
                Some("Use an ISO-8601 date (2024-03-01) or an RFC 3339 timestamp.")
            }
            Self::InvalidEnumValue => Some("Use one of the documented values."),
            Self::InvalidEventPayload => {
                Some("Only status_change events carry an explicit --status.")
            }
            Self::InvalidMeasurement => {
                Some("Record at least one non-negative metric (height, width, leaves, flowers).")
            }
            Self::InvalidFrequency => Some("Use a positive interval such as `7 days` or `P2W`."),
            Self::ReminderInactive => None,
            Self::InvalidPlant => Some("A plant needs a non-blank common name."),
            Self::StorageFailure => Some("Check disk space and write permissions, then retry."),
            Self::CorruptStore => Some(
                "Restore the store file from a backup, or move it aside and run `leaf init`.",
            ),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The kind of record a [`LeafError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Plant,
    Reminder,
    Notification,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plant => "plant",
            Self::Reminder => "reminder",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the leaflog core operations.
///
/// Nothing in the core retries a failed write; every error reaches the
/// caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LeafError {
    /// A referenced plant, reminder or notification does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: i64 },

    /// Malformed input: bad date range, unknown enum value, bad payload.
    #[error("invalid input: {message}")]
    Validation { code: ErrorCode, message: String },

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl LeafError {
    pub(crate) fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub(crate) const fn plant_not_found(id: i64) -> Self {
        Self::NotFound {
            kind: RecordKind::Plant,
            id,
        }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { kind, .. } => match kind {
                RecordKind::Plant => ErrorCode::PlantNotFound,
                RecordKind::Reminder => ErrorCode::ReminderNotFound,
                RecordKind::Notification => ErrorCode::NotificationNotFound,
            },
            Self::Validation { code, .. } => *code,
            Self::Storage(rusqlite::Error::SqliteFailure(failure, _))
                if matches!(
                    failure.code,
                    rusqlite::ErrorCode::DatabaseCorrupt | rusqlite::ErrorCode::NotADatabase
                ) =>
            {
                ErrorCode::CorruptStore
            }
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Remediation suggestion, falling back to the generic code message.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or(code.message()).to_string()
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Result alias for core operations.
pub type Result<T, E = LeafError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{ErrorCode, LeafError, RecordKind};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::PlantNotFound,
            ErrorCode::ReminderNotFound,
            ErrorCode::NotificationNotFound,
            ErrorCode::InvalidDateRange,
            ErrorCode::InvalidTimestamp,
            ErrorCode::InvalidEnumValue,
            ErrorCode::InvalidEventPayload,
            ErrorCode::InvalidMeasurement,
            ErrorCode::InvalidFrequency,
            ErrorCode::ReminderInactive,
            ErrorCode::InvalidPlant,
            ErrorCode::StorageFailure,
            ErrorCode::CorruptStore,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn corrupt_store_hint_points_at_recovery() {
        let hint = ErrorCode::CorruptStore.hint().expect("hint");
        assert!(hint.contains("backup"));
        assert!(!hint.contains("cache rebuild"));
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidDateRange.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn not_found_maps_to_kind_specific_code() {
        let err = LeafError::NotFound {
            kind: RecordKind::Reminder,
            id: 7,
        };
        assert_eq!(err.error_code(), ErrorCode::ReminderNotFound);
        assert_eq!(err.to_string(), "reminder 7 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn storage_errors_are_not_validation() {
        let err = LeafError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.error_code(), ErrorCode::StorageFailure);
        assert!(!err.is_validation());
    }
}
