pub mod auth;
pub mod query_params;
pub mod response;
pub mod validated_json;

pub use auth::{keycloak_auth_middleware, AuthUser};
pub use query_params::QueryParams;
pub use response::{ApiResponse, ApiResult};
pub use validated_json::{JsonBody, ValidatedJson};
