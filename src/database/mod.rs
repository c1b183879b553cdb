pub mod fragments;
pub mod manager;
pub mod params;
pub mod repository;
pub mod scope;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::Repository;
pub use scope::{apply_center_filter, scope_query, ScopeOptions, ScopeRequest, ScopeSubject};
