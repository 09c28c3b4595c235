use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Audit;
use crate::validation::{FieldErrors, Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyUnit {
    Hz,
    KHz,
    MHz,
}

impl FrequencyUnit {
    pub const ALL: &'static [&'static str] = &["Hz", "KHz", "MHz"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marking {
    pub marking_id: Uuid,
    pub critter_id: Uuid,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub taxon_marking_body_location_id: Uuid,
    pub marking_type_id: Option<Uuid>,
    pub marking_material_id: Option<Uuid>,
    pub primary_colour_id: Option<Uuid>,
    pub secondary_colour_id: Option<Uuid>,
    pub text_colour_id: Option<Uuid>,
    pub identifier: Option<String>,
    pub frequency: Option<f64>,
    pub frequency_unit: Option<FrequencyUnit>,
    pub order: Option<i32>,
    pub comment: Option<String>,
    pub attached_timestamp: DateTime<Utc>,
    pub removed_timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(Marking, "marking", "marking_id", [
    ("marking_id", Uuid),
    ("critter_id", Uuid),
    ("capture_id", Uuid),
    ("mortality_id", Uuid),
    ("taxon_marking_body_location_id", Uuid),
    ("marking_type_id", Uuid),
    ("marking_material_id", Uuid),
    ("primary_colour_id", Uuid),
    ("secondary_colour_id", Uuid),
    ("text_colour_id", Uuid),
    ("identifier", Text),
    ("frequency", Double),
    ("frequency_unit", Text),
    ("order", Integer),
    ("comment", Text),
    ("attached_timestamp", Timestamp),
    ("removed_timestamp", Timestamp),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkingCreate {
    pub marking_id: Option<Uuid>,
    pub critter_id: Uuid,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub taxon_marking_body_location_id: Uuid,
    pub marking_type_id: Option<Uuid>,
    pub marking_material_id: Option<Uuid>,
    pub primary_colour_id: Option<Uuid>,
    pub secondary_colour_id: Option<Uuid>,
    pub text_colour_id: Option<Uuid>,
    pub identifier: Option<String>,
    pub frequency: Option<f64>,
    pub frequency_unit: Option<FrequencyUnit>,
    pub order: Option<i32>,
    pub comment: Option<String>,
    #[serde(default = "Utc::now")]
    pub attached_timestamp: DateTime<Utc>,
    pub removed_timestamp: Option<DateTime<Utc>>,
}

impl Validate for MarkingCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        check_marking(
            &mut errors,
            self.identifier.as_deref(),
            self.frequency,
            self.frequency_unit,
            self.order,
        );
        errors.chronological(
            "removed_timestamp",
            Some(&self.attached_timestamp),
            self.removed_timestamp.as_ref(),
            "attached_timestamp",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkingUpdate {
    pub critter_id: Option<Uuid>,
    pub capture_id: Option<Uuid>,
    pub mortality_id: Option<Uuid>,
    pub taxon_marking_body_location_id: Option<Uuid>,
    pub marking_type_id: Option<Uuid>,
    pub marking_material_id: Option<Uuid>,
    pub primary_colour_id: Option<Uuid>,
    pub secondary_colour_id: Option<Uuid>,
    pub text_colour_id: Option<Uuid>,
    pub identifier: Option<String>,
    pub frequency: Option<f64>,
    pub frequency_unit: Option<FrequencyUnit>,
    pub order: Option<i32>,
    pub comment: Option<String>,
    pub attached_timestamp: Option<DateTime<Utc>>,
    pub removed_timestamp: Option<DateTime<Utc>>,
}

impl Validate for MarkingUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        check_marking(
            &mut errors,
            self.identifier.as_deref(),
            self.frequency,
            self.frequency_unit,
            self.order,
        );
        errors.chronological(
            "removed_timestamp",
            self.attached_timestamp.as_ref(),
            self.removed_timestamp.as_ref(),
            "attached_timestamp",
        );
        errors.finish()
    }
}

fn check_marking(
    errors: &mut FieldErrors,
    identifier: Option<&str>,
    frequency: Option<f64>,
    frequency_unit: Option<FrequencyUnit>,
    order: Option<i32>,
) {
    errors.not_blank("identifier", identifier);
    errors.positive("frequency", frequency);
    if frequency.is_some() && frequency_unit.is_none() {
        errors.add("frequency_unit", "is required when frequency is set");
    }
    if frequency.is_none() && frequency_unit.is_some() {
        errors.add("frequency", "is required when frequency_unit is set");
    }
    if order.is_some_and(|o| o < 0) {
        errors.add("order", "must be zero or greater");
    }
}

/// One marking in a `POST /markings/verify` request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkingVerifyEntry {
    pub marking_id: Option<Uuid>,
    pub critter_id: Uuid,
    pub taxon_marking_body_location_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkingVerify {
    pub markings: Vec<MarkingVerifyEntry>,
}
