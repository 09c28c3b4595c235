use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Audit;
use crate::validation::{FieldErrors, Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateUncertaintyUnit {
    #[serde(rename = "m")]
    Meter,
}

impl CoordinateUncertaintyUnit {
    pub const ALL: &'static [&'static str] = &["m"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub coordinate_uncertainty: Option<f64>,
    pub coordinate_uncertainty_unit: Option<CoordinateUncertaintyUnit>,
    pub elevation: Option<f64>,
    pub temperature: Option<f64>,
    pub location_comment: Option<String>,
    pub region_env_id: Option<Uuid>,
    pub region_nr_id: Option<Uuid>,
    pub wmu_id: Option<Uuid>,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(Location, "location", "location_id", [
    ("location_id", Uuid),
    ("latitude", Double),
    ("longitude", Double),
    ("coordinate_uncertainty", Double),
    ("coordinate_uncertainty_unit", Text),
    ("elevation", Double),
    ("temperature", Double),
    ("location_comment", Text),
    ("region_env_id", Uuid),
    ("region_nr_id", Uuid),
    ("wmu_id", Uuid),
]);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationCreate {
    pub location_id: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub coordinate_uncertainty: Option<f64>,
    pub coordinate_uncertainty_unit: Option<CoordinateUncertaintyUnit>,
    pub elevation: Option<f64>,
    pub temperature: Option<f64>,
    pub location_comment: Option<String>,
    pub region_env_id: Option<Uuid>,
    pub region_nr_id: Option<Uuid>,
    pub wmu_id: Option<Uuid>,
}

impl LocationCreate {
    /// An uncertainty without a unit is recorded in meters
    pub fn with_default_unit(mut self) -> Self {
        if self.coordinate_uncertainty.is_some() && self.coordinate_uncertainty_unit.is_none() {
            self.coordinate_uncertainty_unit = Some(CoordinateUncertaintyUnit::Meter);
        }
        self
    }
}

impl Validate for LocationCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        check_location(
            &mut errors,
            self.latitude,
            self.longitude,
            self.coordinate_uncertainty,
            self.elevation,
            self.temperature,
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationUpdate {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub coordinate_uncertainty: Option<f64>,
    pub coordinate_uncertainty_unit: Option<CoordinateUncertaintyUnit>,
    pub elevation: Option<f64>,
    pub temperature: Option<f64>,
    pub location_comment: Option<String>,
    pub region_env_id: Option<Uuid>,
    pub region_nr_id: Option<Uuid>,
    pub wmu_id: Option<Uuid>,
}

impl Validate for LocationUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        check_location(
            &mut errors,
            self.latitude,
            self.longitude,
            self.coordinate_uncertainty,
            self.elevation,
            self.temperature,
        );
        errors.finish()
    }
}

/// Used when an update supplies a location the parent row does not have yet
impl From<LocationUpdate> for LocationCreate {
    fn from(update: LocationUpdate) -> Self {
        Self {
            location_id: None,
            latitude: update.latitude,
            longitude: update.longitude,
            coordinate_uncertainty: update.coordinate_uncertainty,
            coordinate_uncertainty_unit: update.coordinate_uncertainty_unit,
            elevation: update.elevation,
            temperature: update.temperature,
            location_comment: update.location_comment,
            region_env_id: update.region_env_id,
            region_nr_id: update.region_nr_id,
            wmu_id: update.wmu_id,
        }
    }
}

fn check_location(
    errors: &mut FieldErrors,
    latitude: Option<f64>,
    longitude: Option<f64>,
    coordinate_uncertainty: Option<f64>,
    elevation: Option<f64>,
    temperature: Option<f64>,
) {
    errors.range("latitude", latitude, -90.0, 90.0);
    errors.range("longitude", longitude, -180.0, 180.0);
    errors.non_negative("coordinate_uncertainty", coordinate_uncertainty);
    errors.finite("elevation", elevation);
    errors.finite("temperature", temperature);
}
