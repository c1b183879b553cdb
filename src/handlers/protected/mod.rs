// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every router in this tier is wrapped in `jwt_auth_middleware` followed by
// `access_middleware`, so handlers can rely on both `AuthUser` and
// `AccessScope` being present in the request extensions.

pub mod auth;
pub mod employee;
pub mod imam_profile;
pub mod records;

pub use auth::*;
pub use records::*;
