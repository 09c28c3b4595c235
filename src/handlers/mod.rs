// handlers/mod.rs - Two handler tiers
//
// Public (no auth): service info and health
// Protected (Keycloak bearer token): everything under /api
pub mod protected;
pub mod public;
