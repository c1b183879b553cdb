// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and self-registration live here. Everything else sits
// behind the JWT layer in `protected`.

pub mod auth;

pub use auth::*;
