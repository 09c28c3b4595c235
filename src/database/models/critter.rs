use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{
    Audit, CaptureDetailed, CritterCollectionUnit, CritterMeasurements, FamilyChild, FamilyParent, Marking,
    MortalityDetailed,
};
use crate::validation::{FieldErrors, Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Unknown,
    Hermaphroditic,
}

impl Sex {
    pub const ALL: &'static [&'static str] = &["Male", "Female", "Unknown", "Hermaphroditic"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critter {
    pub critter_id: Uuid,
    pub itis_tsn: i32,
    pub itis_scientific_name: String,
    pub wlh_id: Option<String>,
    pub animal_id: Option<String>,
    pub sex: Sex,
    pub responsible_region_nr_id: Option<Uuid>,
    pub critter_comment: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(Critter, "critter", "critter_id", [
    ("critter_id", Uuid),
    ("itis_tsn", Integer),
    ("itis_scientific_name", Text),
    ("wlh_id", Text),
    ("animal_id", Text),
    ("sex", Text),
    ("responsible_region_nr_id", Uuid),
    ("critter_comment", Text),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CritterCreate {
    pub critter_id: Option<Uuid>,
    pub itis_tsn: i32,
    pub itis_scientific_name: Option<String>,
    pub wlh_id: Option<String>,
    pub animal_id: Option<String>,
    pub sex: Sex,
    pub responsible_region_nr_id: Option<Uuid>,
    pub critter_comment: Option<String>,
}

impl Validate for CritterCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.tsn("itis_tsn", Some(self.itis_tsn));
        errors.wlh_id("wlh_id", self.wlh_id.as_deref());
        errors.not_blank("animal_id", self.animal_id.as_deref());
        errors.not_blank("itis_scientific_name", self.itis_scientific_name.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CritterUpdate {
    pub itis_tsn: Option<i32>,
    pub itis_scientific_name: Option<String>,
    pub wlh_id: Option<String>,
    pub animal_id: Option<String>,
    pub sex: Option<Sex>,
    pub responsible_region_nr_id: Option<Uuid>,
    pub critter_comment: Option<String>,
}

impl Validate for CritterUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.tsn("itis_tsn", self.itis_tsn);
        errors.wlh_id("wlh_id", self.wlh_id.as_deref());
        errors.not_blank("animal_id", self.animal_id.as_deref());
        errors.not_blank("itis_scientific_name", self.itis_scientific_name.as_deref());
        errors.finish()
    }
}

/// One list condition of a critter filter request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterList<T> {
    pub body: Vec<T>,
    #[serde(default)]
    pub negate: bool,
}

impl<T: Serialize> FilterList<T> {
    fn condition(&self) -> Value {
        let op = if self.negate { "$nin" } else { "$in" };
        let values = serde_json::to_value(&self.body).unwrap_or(Value::Array(Vec::new()));
        let mut map = Map::new();
        map.insert(op.to_string(), values);
        Value::Object(map)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CritterFilter {
    pub critter_ids: Option<FilterList<Uuid>>,
    pub animal_ids: Option<FilterList<String>>,
    pub wlh_ids: Option<FilterList<String>>,
    pub itis_tsns: Option<FilterList<i32>>,
    pub itis_scientific_names: Option<FilterList<String>>,
}

impl CritterFilter {
    /// Repository where-object; all present conditions are ANDed
    pub fn to_where(&self) -> Value {
        let mut map = Map::new();
        if let Some(list) = &self.critter_ids {
            map.insert("critter_id".into(), list.condition());
        }
        if let Some(list) = &self.animal_ids {
            map.insert("animal_id".into(), list.condition());
        }
        if let Some(list) = &self.wlh_ids {
            map.insert("wlh_id".into(), list.condition());
        }
        if let Some(list) = &self.itis_tsns {
            map.insert("itis_tsn".into(), list.condition());
        }
        if let Some(list) = &self.itis_scientific_names {
            map.insert("itis_scientific_name".into(), list.condition());
        }
        Value::Object(map)
    }
}

impl Validate for CritterFilter {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        let lists = [
            ("critter_ids", self.critter_ids.as_ref().map(|l| l.body.len())),
            ("animal_ids", self.animal_ids.as_ref().map(|l| l.body.len())),
            ("wlh_ids", self.wlh_ids.as_ref().map(|l| l.body.len())),
            ("itis_tsns", self.itis_tsns.as_ref().map(|l| l.body.len())),
            ("itis_scientific_names", self.itis_scientific_names.as_ref().map(|l| l.body.len())),
        ];
        for (field, len) in lists {
            if len == Some(0) {
                errors.add(format!("{}.body", field), "must not be empty");
            }
        }
        errors.finish()
    }
}

/// Body of `POST /critters/unique`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CritterSimilar {
    #[serde(default)]
    pub critter: SimilarCritterFields,
    #[serde(default)]
    pub markings: Vec<SimilarMarking>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimilarCritterFields {
    pub wlh_id: Option<String>,
    pub animal_id: Option<String>,
    pub itis_tsn: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimilarMarking {
    pub identifier: Option<String>,
}

/// `?format=detailed` view of a critter with everything attached to it
#[derive(Debug, Clone, Serialize)]
pub struct CritterDetailed {
    #[serde(flatten)]
    pub critter: Critter,
    pub captures: Vec<CaptureDetailed>,
    pub mortality: Vec<MortalityDetailed>,
    pub markings: Vec<Marking>,
    pub measurements: CritterMeasurements,
    pub collection_units: Vec<CritterCollectionUnit>,
    pub family_parent: Vec<FamilyParent>,
    pub family_child: Vec<FamilyChild>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_lists_must_not_be_empty() {
        let filter: CritterFilter = serde_json::from_value(json!({ "animal_ids": { "body": [] } })).unwrap();
        let err = filter.validate().unwrap_err();
        assert!(err.field_errors.contains_key("animal_ids.body"));
    }

    #[test]
    fn filter_builds_in_and_not_in_conditions() {
        let filter: CritterFilter = serde_json::from_value(json!({
            "wlh_ids": { "body": ["17-10779"] },
            "itis_tsns": { "body": [180703, 180692], "negate": true }
        }))
        .unwrap();
        assert_eq!(
            filter.to_where(),
            json!({
                "wlh_id": { "$in": ["17-10779"] },
                "itis_tsn": { "$nin": [180703, 180692] }
            })
        );
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert_eq!(CritterFilter::default().to_where(), json!({}));
    }

    #[test]
    fn create_rejects_bad_sex_and_fields() {
        assert!(serde_json::from_value::<CritterCreate>(json!({ "itis_tsn": 1, "sex": "Other" })).is_err());
        assert!(serde_json::from_value::<CritterCreate>(json!({ "itis_tsn": 1, "sex": "Male", "colour": "x" })).is_err());
    }

    #[test]
    fn create_validates_wlh_id_and_tsn() {
        let payload: CritterCreate =
            serde_json::from_value(json!({ "itis_tsn": 0, "sex": "Female", "wlh_id": "abc" })).unwrap();
        let err = payload.validate().unwrap_err();
        assert!(err.field_errors.contains_key("itis_tsn"));
        assert!(err.field_errors.contains_key("wlh_id"));
    }

    #[test]
    fn row_deserializes_with_audit() {
        let critter: Critter = serde_json::from_value(json!({
            "critter_id": "0f3c2b1a-9d8e-4f7a-8b6c-5d4e3f2a1b0c",
            "itis_tsn": 180703,
            "itis_scientific_name": "Alces alces",
            "wlh_id": null,
            "animal_id": "M-12",
            "sex": "Male",
            "responsible_region_nr_id": null,
            "critter_comment": null,
            "create_user": null,
            "update_user": null,
            "create_timestamp": "2024-01-01T00:00:00+00:00",
            "update_timestamp": "2024-01-01T00:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(critter.sex, Sex::Male);
        let back = serde_json::to_value(&critter).unwrap();
        assert_eq!(back["itis_scientific_name"], "Alces alces");
        assert!(back.get("audit").is_none());
    }
}
