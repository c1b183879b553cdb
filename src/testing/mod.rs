//! Helpers for unit tests: callers with a given role and center.

use crate::auth::Claims;
use crate::middleware::{authorize, AccessOptions, AccessScope, AuthUser};
use crate::rbac::Role;

pub fn claims_for(role: Role, center_id: Option<i64>) -> Claims {
    Claims::new(100 + role.id(), format!("{}_user", role.key()), role.id(), role.label()).with_center(center_id)
}

pub fn auth_user(role: Role, center_id: Option<i64>) -> AuthUser {
    AuthUser::from(claims_for(role, center_id))
}

/// Run the access gate as a GET on `path` and return the resolved scope.
pub fn access_for(user: &AuthUser, path: &str) -> AccessScope {
    authorize(user, "GET", path, &AccessOptions::default()).expect("access granted")
}
