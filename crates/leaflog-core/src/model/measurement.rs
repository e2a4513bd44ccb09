use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ErrorCode, LeafError, Result};

/// Row identifier for a growth measurement.
pub type MeasurementId = i64;

/// One sample of a growth trend.
///
/// A `None` metric means "not recorded at this sample", never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSample {
    pub measurement_id: MeasurementId,
    pub taken_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flower_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A measurement that has not been appended yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub plant_id: i64,
    pub taken_at: DateTime<Utc>,
    pub height_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub leaf_count: Option<u32>,
    pub flower_count: Option<u32>,
    pub notes: Option<String>,
}

impl NewMeasurement {
    #[must_use]
    pub const fn new(plant_id: i64, taken_at: DateTime<Utc>) -> Self {
        Self {
            plant_id,
            taken_at,
            height_cm: None,
            width_cm: None,
            leaf_count: None,
            flower_count: None,
            notes: None,
        }
    }

    #[must_use]
    pub const fn height(mut self, cm: f64) -> Self {
        self.height_cm = Some(cm);
        self
    }

    #[must_use]
    pub const fn width(mut self, cm: f64) -> Self {
        self.width_cm = Some(cm);
        self
    }

    #[must_use]
    pub const fn leaves(mut self, count: u32) -> Self {
        self.leaf_count = Some(count);
        self
    }

    #[must_use]
    pub const fn flowers(mut self, count: u32) -> Self {
        self.flower_count = Some(count);
        self
    }

    /// At least one metric, and lengths must be finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidMeasurement`] on an empty or negative sample.
    pub fn validate(&self) -> Result<()> {
        if self.height_cm.is_none()
            && self.width_cm.is_none()
            && self.leaf_count.is_none()
            && self.flower_count.is_none()
        {
            return Err(LeafError::validation(
                ErrorCode::InvalidMeasurement,
                "a measurement needs at least one of height, width, leaf count, flower count",
            ));
        }

        for (name, value) in [("height_cm", self.height_cm), ("width_cm", self.width_cm)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(LeafError::validation(
                        ErrorCode::InvalidMeasurement,
                        format!("{name} must be a non-negative number, got {v}"),
                    ));
                }
            }
        }

        Ok(())
    }
}
