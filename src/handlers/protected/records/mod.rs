// handlers/protected/records/mod.rs - Generic CRUD over the entity catalog
//
// One set of handlers serves every entity; the router hands each copy its
// `&'static EntityDef` as state and the entity's hooks supply the
// differences.

pub mod collection; // GET/POST /api/<entity>
pub mod record;     // GET/PUT/DELETE /api/<entity>/:id

pub use collection::{records_get, records_post};
pub use record::{record_delete, record_get, record_put};

use serde_json::{Map, Value};

use crate::database::repository::Repository;
use crate::database::scope::{ScopeOptions, ScopeSubject};
use crate::entities::EntityDef;
use crate::error::ApiError;
use crate::middleware::{AccessScope, AuthUser};

/// Center restriction for one request, present only for center-scoped
/// entities.
pub struct CenterScope {
    subject: ScopeSubject,
    options: ScopeOptions,
}

impl CenterScope {
    pub fn for_request(def: &EntityDef, user: &AuthUser, access: &AccessScope) -> Option<Self> {
        def.center_scoped.then(|| Self {
            subject: user.scope_subject(),
            options: ScopeOptions::default().enforce(access.enforce_center_filter),
        })
    }
}

pub fn scope_args(scope: &Option<CenterScope>) -> Option<(&ScopeSubject, &ScopeOptions)> {
    scope.as_ref().map(|s| (&s.subject, &s.options))
}

/// Fetch a row the caller is allowed to see, or 404. Rows outside the
/// caller's center or rejected by the entity's `can_view` both count as
/// missing.
pub async fn find_visible(
    repo: &Repository,
    def: &EntityDef,
    id: i64,
    user: &AuthUser,
    access: &AccessScope,
) -> Result<Value, ApiError> {
    let scope = CenterScope::for_request(def, user, access);
    repo.select_by_id(id, scope_args(&scope))
        .await?
        .filter(|row| def.hooks.can_view(user, access, row))
        .ok_or_else(|| ApiError::not_found("Not found"))
}

pub fn body_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}
