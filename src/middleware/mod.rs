pub mod access;
pub mod auth;
pub mod response;

pub use access::{access_middleware, authorize, AccessOptions, AccessScope};
pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
