use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Audit;
use crate::validation::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritterCollectionUnit {
    pub critter_collection_unit_id: Uuid,
    pub critter_id: Uuid,
    pub collection_unit_id: Uuid,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(CritterCollectionUnit, "critter_collection_unit", "critter_collection_unit_id", [
    ("critter_collection_unit_id", Uuid),
    ("critter_id", Uuid),
    ("collection_unit_id", Uuid),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CritterCollectionUnitCreate {
    pub critter_collection_unit_id: Option<Uuid>,
    pub critter_id: Uuid,
    pub collection_unit_id: Uuid,
}

impl Validate for CritterCollectionUnitCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CritterCollectionUnitUpdate {
    pub critter_id: Option<Uuid>,
    pub collection_unit_id: Option<Uuid>,
}

impl Validate for CritterCollectionUnitUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
