use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Audit;
use crate::validation::{FieldErrors, Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    Millimeter,
    Centimeter,
    Meter,
    Milligram,
    Gram,
    Kilogram,
}

impl MeasurementUnit {
    pub const ALL: &'static [&'static str] = &["millimeter", "centimeter", "meter", "milligram", "gram", "kilogram"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeMeasurement {
    pub measurement_qualitative_id: Uuid,
    pub critter_id: Uuid,
    pub taxon_measurement_id: Uuid,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub qualitative_option_id: Uuid,
    pub measurement_comment: Option<String>,
    pub measured_timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(QualitativeMeasurement, "measurement_qualitative", "measurement_qualitative_id", [
    ("measurement_qualitative_id", Uuid),
    ("critter_id", Uuid),
    ("taxon_measurement_id", Uuid),
    ("capture_id", Uuid),
    ("mortality_id", Uuid),
    ("qualitative_option_id", Uuid),
    ("measurement_comment", Text),
    ("measured_timestamp", Timestamp),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualitativeMeasurementCreate {
    pub measurement_qualitative_id: Option<Uuid>,
    pub critter_id: Uuid,
    pub taxon_measurement_id: Uuid,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub qualitative_option_id: Uuid,
    pub measurement_comment: Option<String>,
    pub measured_timestamp: Option<DateTime<Utc>>,
}

impl Validate for QualitativeMeasurementCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.exclusive(
            "capture_id",
            self.capture_id.is_some(),
            self.mortality_id.is_some(),
            "mortality_id",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualitativeMeasurementUpdate {
    pub critter_id: Option<Uuid>,
    pub taxon_measurement_id: Option<Uuid>,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub qualitative_option_id: Option<Uuid>,
    pub measurement_comment: Option<String>,
    pub measured_timestamp: Option<DateTime<Utc>>,
}

impl Validate for QualitativeMeasurementUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.exclusive(
            "capture_id",
            self.capture_id.is_some(),
            self.mortality_id.is_some(),
            "mortality_id",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeMeasurement {
    pub measurement_quantitative_id: Uuid,
    pub critter_id: Uuid,
    pub taxon_measurement_id: Uuid,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub value: f64,
    pub measurement_comment: Option<String>,
    pub measured_timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(QuantitativeMeasurement, "measurement_quantitative", "measurement_quantitative_id", [
    ("measurement_quantitative_id", Uuid),
    ("critter_id", Uuid),
    ("taxon_measurement_id", Uuid),
    ("capture_id", Uuid),
    ("mortality_id", Uuid),
    ("value", Double),
    ("measurement_comment", Text),
    ("measured_timestamp", Timestamp),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuantitativeMeasurementCreate {
    pub measurement_quantitative_id: Option<Uuid>,
    pub critter_id: Uuid,
    pub taxon_measurement_id: Uuid,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub value: f64,
    pub measurement_comment: Option<String>,
    pub measured_timestamp: Option<DateTime<Utc>>,
}

impl Validate for QuantitativeMeasurementCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.finite("value", Some(self.value));
        errors.exclusive(
            "capture_id",
            self.capture_id.is_some(),
            self.mortality_id.is_some(),
            "mortality_id",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuantitativeMeasurementUpdate {
    pub critter_id: Option<Uuid>,
    pub taxon_measurement_id: Option<Uuid>,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub value: Option<f64>,
    pub measurement_comment: Option<String>,
    pub measured_timestamp: Option<DateTime<Utc>>,
}

impl Validate for QuantitativeMeasurementUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.finite("value", self.value);
        errors.exclusive(
            "capture_id",
            self.capture_id.is_some(),
            self.mortality_id.is_some(),
            "mortality_id",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CritterMeasurements {
    pub qualitative: Vec<QualitativeMeasurement>,
    pub quantitative: Vec<QuantitativeMeasurement>,
}

/// Body of `POST /measurements/verify`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasurementVerify {
    #[serde(default)]
    pub qualitative: Vec<QualitativeMeasurementCreate>,
    #[serde(default)]
    pub quantitative: Vec<QuantitativeMeasurementCreate>,
}

impl Validate for MeasurementVerify {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.each("qualitative", &self.qualitative);
        errors.each("quantitative", &self.quantitative);
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn units_are_lowercase() {
        assert_eq!(serde_json::to_value(MeasurementUnit::Kilogram).unwrap(), json!("kilogram"));
        assert!(serde_json::from_value::<MeasurementUnit>(json!("Kilogram")).is_err());
    }

    #[test]
    fn measurement_belongs_to_one_event() {
        let measurement: QuantitativeMeasurementCreate = serde_json::from_value(json!({
            "critter_id": "0f3c2b1a-9d8e-4f7a-8b6c-5d4e3f2a1b0c",
            "taxon_measurement_id": "6f2a3c7e-1b5d-4c0a-9e8f-0a1b2c3d4e5f",
            "capture_id": "1a2b3c4d-1b5d-4c0a-9e8f-0a1b2c3d4e5f",
            "mortality_id": "2a2b3c4d-1b5d-4c0a-9e8f-0a1b2c3d4e5f",
            "value": 410.5
        }))
        .unwrap();
        assert!(measurement.validate().unwrap_err().field_errors.contains_key("capture_id"));
    }

    #[test]
    fn verify_lists_default_to_empty() {
        let verify: MeasurementVerify = serde_json::from_value(json!({})).unwrap();
        assert!(verify.qualitative.is_empty());
        assert!(verify.quantitative.is_empty());
    }
}
