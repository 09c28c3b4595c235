use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id, answering 400 for anything that is not a UUID
pub fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("'{}' is not a valid UUID", id)))
}

/// `?format=` query shared by endpoints with alternate views
#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
}

impl FormatQuery {
    pub fn is(&self, format: &str) -> bool {
        self.format.as_deref() == Some(format)
    }
}
