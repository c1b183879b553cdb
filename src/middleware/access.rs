use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::config::config;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::rbac::{
    can_mutate_policy, can_perform_method, is_module_allowed, is_read_only_method, module_for_route,
    needs_center_restriction, report_scope, AppModule, ReportScope, Role,
};

/// Per-router access options: an optional role whitelist and a fixed module
/// for routers whose path does not identify their module.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessOptions {
    pub allowed_roles: &'static [Role],
    pub module_override: Option<AppModule>,
}

impl AccessOptions {
    pub fn roles(allowed_roles: &'static [Role]) -> Self {
        Self { allowed_roles, module_override: None }
    }

    pub fn module(module: AppModule) -> Self {
        Self { allowed_roles: &[], module_override: Some(module) }
    }
}

/// Resolved access for the current request, available to handlers.
#[derive(Debug, Clone, Serialize)]
pub struct AccessScope {
    pub role: Role,
    pub role_id: i64,
    pub role_key: &'static str,
    pub report_scope: ReportScope,
    pub enforce_center_filter: bool,
    pub module: AppModule,
    pub is_app_admin: bool,
    pub is_super_admin: bool,
    pub is_hq: bool,
    pub is_global_admin: bool,
    pub center_id: Option<i64>,
}

impl AccessScope {
    pub fn resolve(user: &AuthUser, role: Role, module: AppModule) -> Self {
        let is_app_admin = role == Role::AppAdmin;
        let is_hq = role == Role::HQ;
        Self {
            role,
            role_id: role.id(),
            role_key: role.key(),
            report_scope: report_scope(Some(role)),
            enforce_center_filter: needs_center_restriction(Some(role)),
            module,
            is_app_admin,
            is_super_admin: is_app_admin,
            is_hq,
            is_global_admin: is_app_admin || is_hq,
            center_id: user.center_id,
        }
    }
}

/// Decide whether `user` may call `method` on `path`. Checks run in a fixed
/// order and the first failure is returned.
pub fn authorize(user: &AuthUser, method: &str, path: &str, options: &AccessOptions) -> Result<AccessScope, ApiError> {
    let role = user
        .role()
        .ok_or_else(|| ApiError::forbidden("Forbidden: unknown or missing role"))?;

    if !options.allowed_roles.is_empty() && !options.allowed_roles.contains(&role) {
        return Err(ApiError::forbidden("Forbidden: role not permitted for this resource"));
    }

    let module = options.module_override.unwrap_or_else(|| module_for_route(path));

    // Lookups are readable by everyone
    if module != AppModule::Lookup && !is_module_allowed(Some(role), module) {
        return Err(ApiError::forbidden("Forbidden: module access denied by RBAC rules"));
    }

    if !can_perform_method(Some(role), method, module) {
        return Err(ApiError::forbidden("Forbidden: HTTP method not allowed for this role"));
    }

    if module == AppModule::Policy && !can_mutate_policy(Some(role)) && !is_read_only_method(method) {
        return Err(ApiError::forbidden(
            "Forbidden: only AppAdmin and HQ can modify Policy & Procedure records",
        ));
    }

    Ok(AccessScope::resolve(user, role, module))
}

/// Role/module/method gate for protected routers. Must run after
/// `jwt_auth_middleware`.
pub async fn access_middleware(State(options): State<AccessOptions>, mut request: Request, next: Next) -> Response {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return ApiError::unauthorized("Authentication required").into_response(),
    };

    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    match authorize(&user, &method, &path, &options) {
        Ok(scope) => {
            request.extensions_mut().insert(scope);
            next.run(request).await
        }
        Err(err) => {
            if config().security.enable_audit_logging {
                tracing::warn!(
                    target: "audit",
                    user_id = user.id,
                    username = %user.username,
                    role_id = ?user.role_id,
                    %method,
                    %path,
                    "access denied: {}",
                    err.message()
                );
            }
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;

    fn user(role: i64) -> AuthUser {
        AuthUser::from(Claims::new(10, "tester", role, "Test User").with_center(Some(2)))
    }

    fn denied(role: i64, method: &str, path: &str, options: AccessOptions) -> String {
        match authorize(&user(role), method, path, &options) {
            Err(err) => err.message().to_string(),
            Ok(scope) => panic!("expected denial, got {:?}", scope),
        }
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert_eq!(denied(9, "GET", "/api/tickets", AccessOptions::default()), "Forbidden: unknown or missing role");
    }

    #[test]
    fn role_whitelist_applies_first() {
        let only_admin = AccessOptions::roles(&[Role::AppAdmin]);
        assert_eq!(
            denied(2, "GET", "/api/emailTemplates", only_admin),
            "Forbidden: role not permitted for this resource"
        );
        assert!(authorize(&user(1), "GET", "/api/emailTemplates", &only_admin).is_ok());
    }

    #[test]
    fn module_and_method_rules() {
        assert_eq!(
            denied(6, "GET", "/api/policyAndProcedure", AccessOptions::default()),
            "Forbidden: module access denied by RBAC rules"
        );
        assert_eq!(
            denied(4, "POST", "/api/employee", AccessOptions::default()),
            "Forbidden: HTTP method not allowed for this role"
        );
        assert_eq!(
            denied(3, "PUT", "/api/policyAndProcedure/3", AccessOptions::default()),
            "Forbidden: HTTP method not allowed for this role"
        );
    }

    #[test]
    fn caseworkers_read_lookups_and_write_nothing_there() {
        assert!(authorize(&user(5), "GET", "/api/lookup/Race", &AccessOptions::default()).is_ok());
        assert!(authorize(&user(5), "POST", "/api/lookup/Race", &AccessOptions::default()).is_err());
    }

    #[test]
    fn resolved_scope_reflects_role() {
        let scope = authorize(&user(3), "GET", "/api/employee", &AccessOptions::default()).unwrap();
        assert_eq!(scope.module, AppModule::Employee);
        assert!(scope.enforce_center_filter);
        assert!(!scope.is_global_admin);
        assert_eq!(scope.report_scope, ReportScope::Own);
        assert_eq!(scope.center_id, Some(2));

        let hq = authorize(&user(2), "DELETE", "/api/tickets/1", &AccessOptions::default()).unwrap();
        assert!(hq.is_global_admin && hq.is_hq && !hq.is_super_admin);
        assert_eq!(hq.module, AppModule::ImamProfiles);
    }

    #[test]
    fn module_override_replaces_the_path() {
        let options = AccessOptions::module(AppModule::Reports);
        assert_eq!(
            denied(6, "GET", "/api/anything", options),
            "Forbidden: module access denied by RBAC rules"
        );
    }
}
