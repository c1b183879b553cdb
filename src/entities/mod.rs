//! Entity definitions and per-entity behaviour for the generic CRUD handlers.

pub mod audit;
pub mod catalog;
pub mod employee;
pub mod imam_profile;
pub mod supplier_evaluation;
pub mod ticket;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::middleware::{AccessScope, AuthUser};
use crate::rbac::{module_for_route, AppModule, Role};
use crate::types::Operation;

pub use catalog::{entity, CATALOG};

/// A table exposed under `/api/<route>`.
pub struct EntityDef {
    /// Human-readable name used in logs
    pub name: &'static str,
    pub route: &'static str,
    pub table: &'static str,
    /// Rows carry a `center_id` and non-admin callers are confined to theirs
    pub center_scoped: bool,
    /// Query-string keys accepted as equality filters on list
    pub filter_columns: &'static [&'static str],
    /// Empty means every role the matrix admits
    pub allowed_roles: &'static [Role],
    pub hooks: &'static dyn RecordHooks,
}

impl EntityDef {
    pub fn path(&self) -> String {
        format!("/api/{}", self.route)
    }

    pub fn module(&self) -> AppModule {
        module_for_route(&self.path())
    }
}

impl std::fmt::Debug for EntityDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityDef")
            .field("route", &self.route)
            .field("table", &self.table)
            .field("center_scoped", &self.center_scoped)
            .finish()
    }
}

/// Everything a hook may need about the request in flight.
pub struct HookContext<'a> {
    pub operation: Operation,
    pub entity: &'static EntityDef,
    pub user: &'a AuthUser,
    pub access: &'a AccessScope,
    pub repo: &'a Repository,
}

/// Per-entity seams around the generic CRUD flow. Every method has a
/// pass-through default.
#[async_trait]
pub trait RecordHooks: Send + Sync {
    /// Add list predicates for this caller.
    async fn scope_list(&self, _ctx: &HookContext<'_>, _where_data: &mut Map<String, Value>) -> Result<(), ApiError> {
        Ok(())
    }

    /// Adjust the body after audit stamping, before INSERT.
    async fn before_create(&self, _ctx: &HookContext<'_>, _fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        Ok(())
    }

    /// Adjust the body after audit stamping, before UPDATE.
    async fn before_update(
        &self,
        _ctx: &HookContext<'_>,
        _id: i64,
        _fields: &mut Map<String, Value>,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    /// Whether a single row fetched by id may be shown to this caller.
    /// Mirrors `scope_list` for the by-id routes.
    fn can_view(&self, _user: &AuthUser, _access: &AccessScope, _row: &Value) -> bool {
        true
    }

    /// Shape a stored row for the response.
    fn present(&self, row: Value) -> Value {
        row
    }
}

/// Plain CRUD with audit stamping and nothing else.
pub struct DefaultHooks;

impl RecordHooks for DefaultHooks {}
