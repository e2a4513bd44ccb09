use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{ErrorCode, LeafError};
use crate::event::EventType;

/// What a reminder asks the owner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    Watering,
    Fertilizing,
    Repotting,
    Pruning,
    Misting,
    Inspection,
}

impl ReminderType {
    pub const ALL: [Self; 6] = [
        Self::Watering,
        Self::Fertilizing,
        Self::Repotting,
        Self::Pruning,
        Self::Misting,
        Self::Inspection,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Watering => "watering",
            Self::Fertilizing => "fertilizing",
            Self::Repotting => "repotting",
            Self::Pruning => "pruning",
            Self::Misting => "misting",
            Self::Inspection => "inspection",
        }
    }

    /// The care event recorded when this reminder is completed, if any.
    #[must_use]
    pub const fn event_type(self) -> Option<EventType> {
        match self {
            Self::Watering => Some(EventType::Watering),
            Self::Fertilizing => Some(EventType::Fertilizing),
            Self::Repotting => Some(EventType::Repotting),
            Self::Pruning => Some(EventType::Pruning),
            Self::Misting | Self::Inspection => None,
        }
    }
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderType {
    type Err = LeafError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "watering" | "water" => Ok(Self::Watering),
            "fertilizing" | "fertilize" => Ok(Self::Fertilizing),
            "repotting" | "repot" => Ok(Self::Repotting),
            "pruning" | "prune" => Ok(Self::Pruning),
            "misting" | "mist" => Ok(Self::Misting),
            "inspection" | "inspect" => Ok(Self::Inspection),
            other => Err(LeafError::validation(
                ErrorCode::InvalidEnumValue,
                format!(
                    "unknown reminder type '{other}': expected one of watering, fertilizing, \
                     repotting, pruning, misting, inspection"
                ),
            )),
        }
    }
}

/// A positive recurrence interval, stored as whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency {
    secs: i64,
}

const MINUTE_SECS: i64 = 60;
const HOUR_SECS: i64 = 60 * MINUTE_SECS;
const DAY_SECS: i64 = 24 * HOUR_SECS;
const WEEK_SECS: i64 = 7 * DAY_SECS;

impl Frequency {
    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidFrequency`] unless `secs > 0`.
    pub fn from_secs(secs: i64) -> Result<Self, LeafError> {
        if secs <= 0 {
            return Err(LeafError::validation(
                ErrorCode::InvalidFrequency,
                format!("reminder frequency must be positive, got {secs}s"),
            ));
        }
        Ok(Self { secs })
    }

    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidFrequency`] unless `days > 0`.
    pub fn days(days: i64) -> Result<Self, LeafError> {
        Self::from_secs(days.saturating_mul(DAY_SECS))
    }

    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.secs
    }

    #[must_use]
    pub const fn as_micros(self) -> i64 {
        self.secs.saturating_mul(1_000_000)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, unit) = if self.secs % WEEK_SECS == 0 {
            (self.secs / WEEK_SECS, "week")
        } else if self.secs % DAY_SECS == 0 {
            (self.secs / DAY_SECS, "day")
        } else if self.secs % HOUR_SECS == 0 {
            (self.secs / HOUR_SECS, "hour")
        } else if self.secs % MINUTE_SECS == 0 {
            (self.secs / MINUTE_SECS, "minute")
        } else {
            (self.secs, "second")
        };
        if n == 1 {
            write!(f, "1 {unit}")
        } else {
            write!(f, "{n} {unit}s")
        }
    }
}

impl FromStr for Frequency {
    type Err = LeafError;

    /// Accepts `"7 days"`, `"2 weeks"`, `"12 hours"`, `"7d"`, ISO-8601
    /// durations (`P7D`, `P2W`, `PT12H`, `P1DT12H`) and bare integers (days).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || {
            LeafError::validation(
                ErrorCode::InvalidFrequency,
                format!("cannot parse '{raw}' as a reminder frequency"),
            )
        };

        if let Ok(days) = raw.parse::<i64>() {
            return Self::days(days);
        }

        let upper = raw.to_ascii_uppercase();
        let secs = if let Some(iso) = upper.strip_prefix('P') {
            parse_iso_duration(iso).ok_or_else(invalid)?
        } else {
            parse_human_duration(raw).ok_or_else(invalid)?
        };
        Self::from_secs(secs)
    }
}

fn unit_secs(unit: &str) -> Option<i64> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MINUTE_SECS),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(HOUR_SECS),
        "d" | "day" | "days" => Some(DAY_SECS),
        "w" | "wk" | "wks" | "week" | "weeks" => Some(WEEK_SECS),
        _ => None,
    }
}

/// `"7 days"`, `"1 week 2 days"`, `"7d"`.
fn parse_human_duration(raw: &str) -> Option<i64> {
    let lower = raw.to_ascii_lowercase();
    let mut total: i64 = 0;
    let mut pending: Option<i64> = None;
    let mut seen_any = false;

    for token in lower.split_whitespace() {
        if let Ok(n) = token.parse::<i64>() {
            if pending.is_some() {
                return None;
            }
            pending = Some(n);
            continue;
        }

        let digits_end = token.find(|c: char| !c.is_ascii_digit()).unwrap_or(token.len());
        let (number, unit) = token.split_at(digits_end);
        let n = if number.is_empty() {
            pending.take()?
        } else {
            if pending.is_some() {
                return None;
            }
            number.parse::<i64>().ok()?
        };
        total = total.checked_add(n.checked_mul(unit_secs(unit)?)?)?;
        seen_any = true;
    }

    if pending.is_some() || !seen_any {
        return None;
    }
    Some(total)
}

/// The part of an ISO-8601 duration after the leading `P`.
fn parse_iso_duration(iso: &str) -> Option<i64> {
    let mut total: i64 = 0;
    let mut number = String::new();
    let mut in_time = false;
    let mut seen_any = false;

    for c in iso.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if c == 'T' {
            if in_time || !number.is_empty() {
                return None;
            }
            in_time = true;
            continue;
        }
        let n: i64 = number.parse().ok()?;
        number.clear();
        let unit = match (in_time, c) {
            (false, 'W') => WEEK_SECS,
            (false, 'D') => DAY_SECS,
            (true, 'H') => HOUR_SECS,
            (true, 'M') => MINUTE_SECS,
            (true, 'S') => 1,
            _ => return None,
        };
        total = total.checked_add(n.checked_mul(unit)?)?;
        seen_any = true;
    }

    if !number.is_empty() || !seen_any {
        return None;
    }
    Some(total)
}

/// A stored reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub reminder_id: i64,
    pub plant_id: i64,
    pub reminder_type: ReminderType,
    #[serde(serialize_with = "serialize_frequency")]
    pub frequency: Frequency,
    pub next_due: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn serialize_frequency<S: serde::Serializer>(
    frequency: &Frequency,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(frequency)
}

/// Input for [`crate::records::insert_reminder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub plant_id: i64,
    pub reminder_type: ReminderType,
    pub frequency: Frequency,
    /// Defaults to the insert instant when `None`.
    pub next_due: Option<DateTime<Utc>>,
}

/// How `next_due` advances when a reminder is completed.
///
/// Neither policy ever uses "now + frequency": the completion instant is
/// supplied by the caller and may be backdated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftPolicy {
    /// Advance the previous `next_due` by whole frequencies until it is
    /// strictly after the completion. The cadence never shifts, and missed
    /// cycles are skipped rather than queued.
    #[default]
    Anchored,
    /// `completed_at + frequency`.
    FromOccurrence,
}

impl DriftPolicy {
    /// Compute the next due instant, in microseconds.
    #[must_use]
    pub fn next_due_us(self, previous_due_us: i64, frequency: Frequency, occurred_us: i64) -> i64 {
        let step = frequency.as_micros();
        match self {
            Self::FromOccurrence => occurred_us.saturating_add(step),
            Self::Anchored => {
                if previous_due_us > occurred_us {
                    return previous_due_us.saturating_add(step);
                }
                // Smallest k >= 1 with previous + k*step > occurred.
                let behind = occurred_us.saturating_sub(previous_due_us);
                let k = behind / step + 1;
                previous_due_us.saturating_add(k.saturating_mul(step))
            }
        }
    }
}

impl FromStr for DriftPolicy {
    type Err = LeafError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "anchored" | "schedule" => Ok(Self::Anchored),
            "from_occurrence" | "occurrence" => Ok(Self::FromOccurrence),
            other => Err(LeafError::validation(
                ErrorCode::InvalidEnumValue,
                format!("unknown drift policy '{other}': expected anchored or from_occurrence"),
            )),
        }
    }
}
