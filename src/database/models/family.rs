use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Audit, Critter};
use crate::validation::{FieldErrors, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub family_id: Uuid,
    pub family_label: String,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(Family, "family", "family_id", [
    ("family_id", Uuid),
    ("family_label", Text),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyCreate {
    pub family_id: Option<Uuid>,
    pub family_label: String,
}

impl Validate for FamilyCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.not_blank("family_label", Some(&self.family_label));
        errors.max_len("family_label", Some(&self.family_label), 200);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyUpdate {
    pub family_label: Option<String>,
}

impl Validate for FamilyUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.not_blank("family_label", self.family_label.as_deref());
        errors.max_len("family_label", self.family_label.as_deref(), 200);
        errors.finish()
    }
}

/// `family_parent` row, keyed by (`family_id`, `parent_critter_id`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyParent {
    pub family_id: Uuid,
    pub parent_critter_id: Uuid,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(FamilyParent, "family_parent", "family_id", [
    ("family_id", Uuid),
    ("parent_critter_id", Uuid),
]);

/// `family_child` row, keyed by (`family_id`, `child_critter_id`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyChild {
    pub family_id: Uuid,
    pub child_critter_id: Uuid,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(FamilyChild, "family_child", "family_id", [
    ("family_id", Uuid),
    ("child_critter_id", Uuid),
]);

/// Body of `POST`/`DELETE /family/parents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyParentLink {
    pub family_id: Uuid,
    pub parent_critter_id: Uuid,
}

/// Body of `POST`/`DELETE /family/children`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyChildLink {
    pub family_id: Uuid,
    pub child_critter_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyDetailed {
    #[serde(flatten)]
    pub family: Family,
    pub parents: Vec<Critter>,
    pub children: Vec<Critter>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImmediateFamily {
    pub parents: Vec<Critter>,
    pub siblings: Vec<Critter>,
    pub children: Vec<Critter>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_label_is_rejected() {
        let family: FamilyCreate = serde_json::from_value(json!({ "family_label": "  " })).unwrap();
        assert!(family.validate().is_err());
    }

    #[test]
    fn links_require_both_ids() {
        assert!(serde_json::from_value::<FamilyParentLink>(json!({
            "family_id": "0f3c2b1a-9d8e-4f7a-8b6c-5d4e3f2a1b0c"
        }))
        .is_err());
    }
}
