//! Business rules that span more than one row.
//!
//! Each service owns a `Database` handle. Operations that bulk requests also
//! need are exposed as associated `*_in` functions taking a connection, so
//! they can run inside a caller's transaction.

pub mod bulk;
pub mod capture;
pub mod collection_unit;
pub mod critter;
pub mod family;
pub mod location;
pub mod lookup;
pub mod marking;
pub mod measurement;
pub mod mortality;
pub mod taxon;
pub mod user;
pub mod xref;

use thiserror::Error;

use crate::database::DatabaseError;
use crate::itis::ItisError;
use crate::validation::ValidationError;

pub use bulk::{BulkCreate, BulkPatch, BulkService, BulkSummary};
pub use capture::CaptureService;
pub use collection_unit::CollectionUnitService;
pub use critter::CritterService;
pub use family::FamilyService;
pub use location::LocationService;
pub use lookup::LookupService;
pub use marking::MarkingService;
pub use measurement::MeasurementService;
pub use mortality::MortalityService;
pub use user::UserService;
pub use xref::XrefService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Taxonomy(#[from] ItisError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

impl ServiceError {
    /// Re-key validation errors under `prefix`, for entries of a bulk request
    pub fn at(self, prefix: &str) -> Self {
        match self {
            ServiceError::Validation(err) => ServiceError::Validation(ValidationError {
                message: err.message,
                field_errors: err
                    .field_errors
                    .into_iter()
                    .map(|(field, message)| (format!("{}.{}", prefix, field), message))
                    .collect(),
            }),
            ServiceError::NotFound(msg) => ServiceError::NotFound(format!("{}: {}", prefix, msg)),
            ServiceError::Conflict(msg) => ServiceError::Conflict(format!("{}: {}", prefix, msg)),
            ServiceError::BadRequest(msg) => ServiceError::BadRequest(format!("{}: {}", prefix, msg)),
            other => other,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_prefix_rekeys_field_errors() {
        let err = ServiceError::from(ValidationError::field("latitude", "out of range")).at("locations[3]");
        match err {
            ServiceError::Validation(v) => assert!(v.field_errors.contains_key("locations[3].latitude")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bulk_prefix_names_the_entry() {
        let err = ServiceError::Conflict("already a child".into()).at("family_parents[0]");
        assert_eq!(err.to_string(), "family_parents[0]: already a child");
    }
}
