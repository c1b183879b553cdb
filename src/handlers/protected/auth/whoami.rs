use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{AccessScope, ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - who the token says the caller is, and what the
/// access gate resolved for them
pub async fn whoami_get(Extension(user): Extension<AuthUser>, Extension(access): Extension<AccessScope>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "user": {
            "id": user.id,
            "username": user.username,
            "full_name": user.full_name,
            "user_type": user.role_id,
            "center_id": user.center_id,
            "role": user.role().map(|r| r.label()),
        },
        "access": access,
        "exp": user.claims.exp,
    })))
}
