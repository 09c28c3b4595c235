use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Audit, Location, LocationCreate, LocationUpdate};
use crate::validation::{FieldErrors, Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodConfidence {
    Probable,
    Definite,
}

impl CodConfidence {
    pub const ALL: &'static [&'static str] = &["Probable", "Definite"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mortality {
    pub mortality_id: Uuid,
    pub critter_id: Uuid,
    pub location_id: Option<Uuid>,
    pub mortality_timestamp: DateTime<Utc>,
    pub proximate_cause_of_death_id: Uuid,
    pub proximate_cause_of_death_confidence: Option<CodConfidence>,
    pub proximate_predated_by_itis_tsn: Option<i32>,
    pub ultimate_cause_of_death_id: Option<Uuid>,
    pub ultimate_cause_of_death_confidence: Option<CodConfidence>,
    pub ultimate_predated_by_itis_tsn: Option<i32>,
    pub mortality_comment: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(Mortality, "mortality", "mortality_id", [
    ("mortality_id", Uuid),
    ("critter_id", Uuid),
    ("location_id", Uuid),
    ("mortality_timestamp", Timestamp),
    ("proximate_cause_of_death_id", Uuid),
    ("proximate_cause_of_death_confidence", Text),
    ("proximate_predated_by_itis_tsn", Integer),
    ("ultimate_cause_of_death_id", Uuid),
    ("ultimate_cause_of_death_confidence", Text),
    ("ultimate_predated_by_itis_tsn", Integer),
    ("mortality_comment", Text),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MortalityCreate {
    pub mortality_id: Option<Uuid>,
    pub critter_id: Uuid,
    pub location_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub location: Option<LocationCreate>,
    pub mortality_timestamp: DateTime<Utc>,
    pub proximate_cause_of_death_id: Uuid,
    pub proximate_cause_of_death_confidence: Option<CodConfidence>,
    pub proximate_predated_by_itis_tsn: Option<i32>,
    pub ultimate_cause_of_death_id: Option<Uuid>,
    pub ultimate_cause_of_death_confidence: Option<CodConfidence>,
    pub ultimate_predated_by_itis_tsn: Option<i32>,
    pub mortality_comment: Option<String>,
}

impl MortalityCreate {
    pub fn predator_tsns(&self) -> Vec<i32> {
        [self.proximate_predated_by_itis_tsn, self.ultimate_predated_by_itis_tsn]
            .into_iter()
            .flatten()
            .collect()
    }
}

impl Validate for MortalityCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.tsn("proximate_predated_by_itis_tsn", self.proximate_predated_by_itis_tsn);
        errors.tsn("ultimate_predated_by_itis_tsn", self.ultimate_predated_by_itis_tsn);
        if self.ultimate_cause_of_death_confidence.is_some() && self.ultimate_cause_of_death_id.is_none() {
            errors.add("ultimate_cause_of_death_confidence", "requires ultimate_cause_of_death_id");
        }
        errors.exclusive("location", self.location.is_some(), self.location_id.is_some(), "location_id");
        errors.nested("location", &self.location);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MortalityUpdate {
    pub critter_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub location: Option<LocationUpdate>,
    pub mortality_timestamp: Option<DateTime<Utc>>,
    pub proximate_cause_of_death_id: Option<Uuid>,
    pub proximate_cause_of_death_confidence: Option<CodConfidence>,
    pub proximate_predated_by_itis_tsn: Option<i32>,
    pub ultimate_cause_of_death_id: Option<Uuid>,
    pub ultimate_cause_of_death_confidence: Option<CodConfidence>,
    pub ultimate_predated_by_itis_tsn: Option<i32>,
    pub mortality_comment: Option<String>,
}

impl MortalityUpdate {
    pub fn predator_tsns(&self) -> Vec<i32> {
        [self.proximate_predated_by_itis_tsn, self.ultimate_predated_by_itis_tsn]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn has_columns(&self) -> bool {
        self.critter_id.is_some()
            || self.location_id.is_some()
            || self.mortality_timestamp.is_some()
            || self.proximate_cause_of_death_id.is_some()
            || self.proximate_cause_of_death_confidence.is_some()
            || self.proximate_predated_by_itis_tsn.is_some()
            || self.ultimate_cause_of_death_id.is_some()
            || self.ultimate_cause_of_death_confidence.is_some()
            || self.ultimate_predated_by_itis_tsn.is_some()
            || self.mortality_comment.is_some()
    }
}

impl Validate for MortalityUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.tsn("proximate_predated_by_itis_tsn", self.proximate_predated_by_itis_tsn);
        errors.tsn("ultimate_predated_by_itis_tsn", self.ultimate_predated_by_itis_tsn);
        errors.exclusive("location", self.location.is_some(), self.location_id.is_some(), "location_id");
        errors.nested("location", &self.location);
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortalityDetailed {
    #[serde(flatten)]
    pub mortality: Mortality,
    pub location: Option<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "critter_id": "0f3c2b1a-9d8e-4f7a-8b6c-5d4e3f2a1b0c",
            "mortality_timestamp": "2024-03-03T00:00:00Z",
            "proximate_cause_of_death_id": "6f2a3c7e-1b5d-4c0a-9e8f-0a1b2c3d4e5f"
        })
    }

    #[test]
    fn collects_predator_tsns() {
        let mut value = base();
        value["proximate_predated_by_itis_tsn"] = json!(180596);
        let mortality: MortalityCreate = serde_json::from_value(value).unwrap();
        assert_eq!(mortality.predator_tsns(), vec![180596]);
        assert!(mortality.validate().is_ok());
    }

    #[test]
    fn ultimate_confidence_needs_a_cause() {
        let mut value = base();
        value["ultimate_cause_of_death_confidence"] = json!("Definite");
        let mortality: MortalityCreate = serde_json::from_value(value).unwrap();
        let err = mortality.validate().unwrap_err();
        assert!(err.field_errors.contains_key("ultimate_cause_of_death_confidence"));
    }

    #[test]
    fn confidence_is_an_enum() {
        let mut value = base();
        value["proximate_cause_of_death_confidence"] = json!("Maybe");
        assert!(serde_json::from_value::<MortalityCreate>(value).is_err());
    }
}
