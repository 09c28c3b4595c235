use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Audit, Location, LocationCreate, LocationUpdate};
use crate::validation::{FieldErrors, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub capture_id: Uuid,
    pub critter_id: Uuid,
    pub capture_location_id: Option<Uuid>,
    pub release_location_id: Option<Uuid>,
    pub capture_timestamp: DateTime<Utc>,
    pub release_timestamp: Option<DateTime<Utc>>,
    pub capture_comment: Option<String>,
    pub release_comment: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(Capture, "capture", "capture_id", [
    ("capture_id", Uuid),
    ("critter_id", Uuid),
    ("capture_location_id", Uuid),
    ("release_location_id", Uuid),
    ("capture_timestamp", Timestamp),
    ("release_timestamp", Timestamp),
    ("capture_comment", Text),
    ("release_comment", Text),
]);

/// New capture; `capture_location` / `release_location` are created alongside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureCreate {
    pub capture_id: Option<Uuid>,
    pub critter_id: Uuid,
    pub capture_location_id: Option<Uuid>,
    pub release_location_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub capture_location: Option<LocationCreate>,
    #[serde(skip_serializing)]
    pub release_location: Option<LocationCreate>,
    pub capture_timestamp: DateTime<Utc>,
    pub release_timestamp: Option<DateTime<Utc>>,
    pub capture_comment: Option<String>,
    pub release_comment: Option<String>,
}

impl Validate for CaptureCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.chronological(
            "release_timestamp",
            Some(&self.capture_timestamp),
            self.release_timestamp.as_ref(),
            "capture_timestamp",
        );
        errors.exclusive(
            "capture_location",
            self.capture_location.is_some(),
            self.capture_location_id.is_some(),
            "capture_location_id",
        );
        errors.exclusive(
            "release_location",
            self.release_location.is_some(),
            self.release_location_id.is_some(),
            "release_location_id",
        );
        errors.nested("capture_location", &self.capture_location);
        errors.nested("release_location", &self.release_location);
        errors.finish()
    }
}

/// Capture changes; nested locations update the linked rows, or create them
/// when the capture has none yet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureUpdate {
    pub critter_id: Option<Uuid>,
    pub capture_location_id: Option<Uuid>,
    pub release_location_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub capture_location: Option<LocationUpdate>,
    #[serde(skip_serializing)]
    pub release_location: Option<LocationUpdate>,
    pub capture_timestamp: Option<DateTime<Utc>>,
    pub release_timestamp: Option<DateTime<Utc>>,
    pub capture_comment: Option<String>,
    pub release_comment: Option<String>,
}

impl CaptureUpdate {
    /// Whether any capture column changes, nested locations aside
    pub fn has_columns(&self) -> bool {
        self.critter_id.is_some()
            || self.capture_location_id.is_some()
            || self.release_location_id.is_some()
            || self.capture_timestamp.is_some()
            || self.release_timestamp.is_some()
            || self.capture_comment.is_some()
            || self.release_comment.is_some()
    }
}

impl Validate for CaptureUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.chronological(
            "release_timestamp",
            self.capture_timestamp.as_ref(),
            self.release_timestamp.as_ref(),
            "capture_timestamp",
        );
        errors.exclusive(
            "capture_location",
            self.capture_location.is_some(),
            self.capture_location_id.is_some(),
            "capture_location_id",
        );
        errors.exclusive(
            "release_location",
            self.release_location.is_some(),
            self.release_location_id.is_some(),
            "release_location_id",
        );
        errors.nested("capture_location", &self.capture_location);
        errors.nested("release_location", &self.release_location);
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureDetailed {
    #[serde(flatten)]
    pub capture: Capture,
    pub capture_location: Option<Location>,
    pub release_location: Option<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::to_columns;
    use serde_json::json;

    fn payload(extra: serde_json::Value) -> serde_json::Value {
        let mut base = json!({
            "critter_id": "0f3c2b1a-9d8e-4f7a-8b6c-5d4e3f2a1b0c",
            "capture_timestamp": "2024-02-01T10:00:00Z"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        base
    }

    #[test]
    fn release_before_capture_is_rejected() {
        let capture: CaptureCreate =
            serde_json::from_value(payload(json!({ "release_timestamp": "2024-01-01T10:00:00Z" }))).unwrap();
        let err = capture.validate().unwrap_err();
        assert!(err.field_errors.contains_key("release_timestamp"));
    }

    #[test]
    fn nested_location_errors_are_prefixed() {
        let capture: CaptureCreate =
            serde_json::from_value(payload(json!({ "capture_location": { "latitude": 120.0 } }))).unwrap();
        let err = capture.validate().unwrap_err();
        assert!(err.field_errors.contains_key("capture_location.latitude"));
    }

    #[test]
    fn location_and_location_id_are_exclusive() {
        let capture: CaptureCreate = serde_json::from_value(payload(json!({
            "capture_location": { "latitude": 50.0 },
            "capture_location_id": "6f2a3c7e-1b5d-4c0a-9e8f-0a1b2c3d4e5f"
        })))
        .unwrap();
        assert!(capture.validate().is_err());
    }

    #[test]
    fn nested_locations_are_not_columns() {
        let capture: CaptureCreate =
            serde_json::from_value(payload(json!({ "capture_location": { "latitude": 50.0 } }))).unwrap();
        let columns = to_columns(&capture).unwrap();
        assert!(!columns.contains_key("capture_location"));
        assert!(columns.contains_key("critter_id"));
        assert!(!columns.contains_key("capture_id"));
    }

    #[test]
    fn update_with_only_locations_has_no_columns() {
        let update: CaptureUpdate =
            serde_json::from_value(json!({ "release_location": { "longitude": -120.0 } })).unwrap();
        assert!(!update.has_columns());
        assert!(update.validate().is_ok());
    }
}
