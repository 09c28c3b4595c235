//! Row models and request payloads for every Critterbase table.
//!
//! Row structs deserialize from `row_to_json` output. Create and update
//! payloads serialize into column maps for [`Repository`](super::Repository);
//! fields that are not columns (nested locations, bulk flags) are skipped
//! when serializing.

pub mod capture;
pub mod collection_unit;
pub mod critter;
pub mod family;
pub mod location;
pub mod lookup;
pub mod marking;
pub mod measurement;
pub mod mortality;
pub mod user;
pub mod xref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use capture::{Capture, CaptureCreate, CaptureDetailed, CaptureUpdate};
pub use collection_unit::{CritterCollectionUnit, CritterCollectionUnitCreate, CritterCollectionUnitUpdate};
pub use critter::{Critter, CritterCreate, CritterDetailed, CritterFilter, CritterSimilar, CritterUpdate, Sex};
pub use family::{
    Family, FamilyChild, FamilyChildLink, FamilyCreate, FamilyDetailed, FamilyParent, FamilyParentLink, FamilyUpdate,
    ImmediateFamily,
};
pub use location::{CoordinateUncertaintyUnit, Location, LocationCreate, LocationUpdate};
pub use marking::{FrequencyUnit, Marking, MarkingCreate, MarkingUpdate};
pub use measurement::{
    CritterMeasurements, MeasurementUnit, QualitativeMeasurement, QualitativeMeasurementCreate,
    QualitativeMeasurementUpdate, QuantitativeMeasurement, QuantitativeMeasurementCreate,
    QuantitativeMeasurementUpdate,
};
pub use mortality::{CodConfidence, Mortality, MortalityCreate, MortalityDetailed, MortalityUpdate};
pub use user::{User, UserCreate, UserUpdate};

/// Audit columns present on every mutable row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub create_user: Option<Uuid>,
    pub update_user: Option<Uuid>,
    pub create_timestamp: DateTime<Utc>,
    pub update_timestamp: DateTime<Utc>,
}

/// Result of a taxon verification request (markings, measurements)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub verified: bool,
    pub invalid: Vec<InvalidEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub reason: String,
}

impl Verification {
    pub fn from_invalid(invalid: Vec<InvalidEntry>) -> Self {
        Self {
            verified: invalid.is_empty(),
            invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn audit_reads_row_to_json_timestamps() {
        let audit: Audit = serde_json::from_value(json!({
            "create_user": null,
            "update_user": "6f2a3c7e-1b5d-4c0a-9e8f-0a1b2c3d4e5f",
            "create_timestamp": "2024-05-01T12:00:00.123456-07:00",
            "update_timestamp": "2024-05-01T19:00:00+00:00"
        }))
        .unwrap();
        assert!(audit.create_user.is_none());
        assert_eq!(
            audit.create_timestamp - audit.update_timestamp,
            chrono::Duration::microseconds(123456)
        );
    }

    #[test]
    fn verification_flags_invalid_entries() {
        assert!(Verification::from_invalid(vec![]).verified);
        let v = Verification::from_invalid(vec![InvalidEntry {
            kind: None,
            index: 2,
            id: None,
            reason: "not in hierarchy".into(),
        }]);
        assert!(!v.verified);
        assert_eq!(serde_json::to_value(&v).unwrap()["invalid"][0], json!({"index": 2, "reason": "not in hierarchy"}));
    }
}
