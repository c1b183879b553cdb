use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{validate_jwt, AuthError, Claims};
use crate::database::scope::ScopeSubject;
use crate::error::ApiError;
use crate::rbac::Role;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role_id: Option<i64>,
    pub center_id: Option<i64>,
    pub claims: Claims,
}

impl AuthUser {
    pub fn role(&self) -> Option<Role> {
        self.role_id.and_then(Role::from_id)
    }

    pub fn is_global_admin(&self) -> bool {
        self.role().map(Role::is_global_admin).unwrap_or(false)
    }

    /// Username for `created_by`/`updated_by` stamps.
    pub fn audit_name(&self) -> &str {
        if self.username.is_empty() {
            "system"
        } else {
            &self.username
        }
    }

    pub fn scope_subject(&self) -> ScopeSubject {
        ScopeSubject { role_id: self.role_id, center_id: self.center_id }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username.clone(),
            full_name: claims.full_name.clone(),
            role_id: claims.role_id(),
            center_id: claims.center_id(),
            claims,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let token = match extract_jwt_from_headers(&headers) {
        Some(token) => token,
        None => return ApiError::unauthorized("No token, authorization denied").into_response(),
    };

    let claims = match validate_jwt(&token) {
        Ok(claims) => claims,
        Err(AuthError::InvalidToken(reason)) => {
            tracing::debug!("Rejected token: {}", reason);
            return ApiError::unauthorized("Token is not valid").into_response();
        }
        Err(other) => return ApiError::from(other).into_response(),
    };

    request.extensions_mut().insert(AuthUser::from(claims));
    next.run(request).await
}

/// Extract the token from `Authorization: Bearer <token>` or a bare token.
fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
