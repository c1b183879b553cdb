// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth + RBAC access gate)

pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Record ids are integer primary keys.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw)))
}
