//! Event type enum for the plant care log.
//!
//! Care events (watering, fertilizing, repotting, pruning) never move a
//! plant's status. Observation events imply a status, and `status_change`
//! carries one explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::status::PlantStatus;

/// The nine event types a plant's log can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Watering,
    Fertilizing,
    /// Explicit status transition; the only type with a status payload.
    StatusChange,
    Repotting,
    Pruning,
    /// Implies [`PlantStatus::Sick`].
    DiseaseObserved,
    /// Implies [`PlantStatus::NeedsAttention`].
    PestObserved,
    /// Implies [`PlantStatus::Recovering`].
    Treatment,
    /// Implies [`PlantStatus::Dead`].
    Death,
}

/// Error returned when parsing an unknown event type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown event type '{}': expected one of watering, fertilizing, \
             status_change, repotting, pruning, disease_observed, pest_observed, \
             treatment, death",
            self.raw
        )
    }
}

impl std::error::Error for UnknownEventType {}

impl EventType {
    /// All known event types in catalog order.
    pub const ALL: [Self; 9] = [
        Self::Watering,
        Self::Fertilizing,
        Self::StatusChange,
        Self::Repotting,
        Self::Pruning,
        Self::DiseaseObserved,
        Self::PestObserved,
        Self::Treatment,
        Self::Death,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Watering => "watering",
            Self::Fertilizing => "fertilizing",
            Self::StatusChange => "status_change",
            Self::Repotting => "repotting",
            Self::Pruning => "pruning",
            Self::DiseaseObserved => "disease_observed",
            Self::PestObserved => "pest_observed",
            Self::Treatment => "treatment",
            Self::Death => "death",
        }
    }

    /// The status an event of this type implies on its own.
    ///
    /// `StatusChange` returns `None` because its status comes from the
    /// payload, not the type.
    #[must_use]
    pub const fn implied_status(self) -> Option<PlantStatus> {
        match self {
            Self::DiseaseObserved => Some(PlantStatus::Sick),
            Self::PestObserved => Some(PlantStatus::NeedsAttention),
            Self::Treatment => Some(PlantStatus::Recovering),
            Self::Death => Some(PlantStatus::Dead),
            Self::Watering
            | Self::Fertilizing
            | Self::StatusChange
            | Self::Repotting
            | Self::Pruning => None,
        }
    }

    /// Whether events of this type can move a plant's status.
    #[must_use]
    pub const fn is_status_relevant(self) -> bool {
        matches!(self, Self::StatusChange) || self.implied_status().is_some()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "watering" | "water" => Ok(Self::Watering),
            "fertilizing" | "fertilize" => Ok(Self::Fertilizing),
            "status_change" | "status" => Ok(Self::StatusChange),
            "repotting" | "repot" => Ok(Self::Repotting),
            "pruning" | "prune" => Ok(Self::Pruning),
            "disease_observed" | "disease" => Ok(Self::DiseaseObserved),
            "pest_observed" | "pests" => Ok(Self::PestObserved),
            "treatment" | "treat" => Ok(Self::Treatment),
            "death" | "died" => Ok(Self::Death),
            _ => Err(UnknownEventType { raw: s.to_string() }),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
