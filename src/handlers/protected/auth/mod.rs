// handlers/protected/auth/mod.rs - Account endpoints for authenticated users

pub mod whoami; // GET /api/auth/whoami - current identity and access scope

pub use whoami::whoami_get;
