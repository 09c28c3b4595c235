use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Audit;
use crate::validation::{FieldErrors, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub user_identifier: String,
    pub keycloak_uuid: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

crate::entity!(User, "user", "user_id", [
    ("user_id", Uuid),
    ("user_identifier", Text),
    ("keycloak_uuid", Text),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserCreate {
    pub user_id: Option<Uuid>,
    pub user_identifier: String,
    pub keycloak_uuid: Option<String>,
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.not_blank("user_identifier", Some(&self.user_identifier));
        errors.max_len("user_identifier", Some(&self.user_identifier), 200);
        errors.not_blank("keycloak_uuid", self.keycloak_uuid.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    pub user_identifier: Option<String>,
    pub keycloak_uuid: Option<String>,
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.not_blank("user_identifier", self.user_identifier.as_deref());
        errors.max_len("user_identifier", self.user_identifier.as_deref(), 200);
        errors.not_blank("keycloak_uuid", self.keycloak_uuid.as_deref());
        errors.finish()
    }
}
