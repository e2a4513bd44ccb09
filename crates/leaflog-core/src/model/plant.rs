use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::status::PlantStatus;

/// A plant record.
///
/// `current_status` is a cache of the latest status-relevant event in the
/// log; the log is the source of truth (see [`crate::status`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plant {
    pub plant_id: i64,
    pub common_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub planting_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub current_status: PlantStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::records::insert_plant`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPlant {
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub variety: Option<String>,
    pub location: Option<String>,
    /// Defaults to the insert date when `None`.
    pub planting_date: Option<NaiveDate>,
    pub acquisition_source: Option<String>,
    pub notes: Option<String>,
}

impl NewPlant {
    #[must_use]
    pub fn named(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn planted_on(mut self, date: NaiveDate) -> Self {
        self.planting_date = Some(date);
        self
    }

    #[must_use]
    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Descriptive fields to change with [`crate::records::update_plant`].
///
/// `None` keeps the stored value. For the optional text fields an empty
/// string clears the value. `current_status` has no counterpart here: it is
/// only ever written by the status cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantUpdate {
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub variety: Option<String>,
    pub location: Option<String>,
    pub planting_date: Option<NaiveDate>,
    pub acquisition_source: Option<String>,
    pub notes: Option<String>,
}

impl PlantUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.common_name.is_none()
            && self.scientific_name.is_none()
            && self.variety.is_none()
            && self.location.is_none()
            && self.planting_date.is_none()
            && self.acquisition_source.is_none()
            && self.notes.is_none()
    }

    /// Apply the changes to `plant` in memory.
    pub fn apply_to(&self, plant: &mut Plant) {
        if let Some(name) = &self.common_name {
            plant.common_name = name.trim().to_string();
        }
        if let Some(date) = self.planting_date {
            plant.planting_date = date;
        }
        merge_text(&mut plant.scientific_name, self.scientific_name.as_ref());
        merge_text(&mut plant.variety, self.variety.as_ref());
        merge_text(&mut plant.location, self.location.as_ref());
        merge_text(&mut plant.acquisition_source, self.acquisition_source.as_ref());
        merge_text(&mut plant.notes, self.notes.as_ref());
    }
}

fn merge_text(field: &mut Option<String>, change: Option<&String>) {
    if let Some(value) = change {
        *field = if value.trim().is_empty() {
            None
        } else {
            Some(value.clone())
        };
    }
}
