// handlers/protected/mod.rs - Protected handlers (Keycloak bearer token required)
//
// Route prefix: /api. The auth middleware injects `AuthUser`, whose id is
// written to the audit columns of every row a handler creates or updates.
pub mod bulk;
pub mod captures;
pub mod collection_units;
pub mod critters;
pub mod family;
pub mod locations;
pub mod lookups;
pub mod markings;
pub mod measurements;
pub mod mortality;
pub mod users;
pub mod utils;
pub mod xref;
