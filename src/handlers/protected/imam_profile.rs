use axum::extract::State;
use axum::Extension;
use serde_json::Value;

use crate::database::repository::Repository;
use crate::entities::imam_profile::find_by_employee_id;
use crate::entities::EntityDef;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/imamProfiles/my-profile - the profile owned by the caller
pub async fn my_profile_get(
    State(def): State<&'static EntityDef>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Value> {
    let repo = Repository::connect(def.table).await?;
    let profile = find_by_employee_id(&repo, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Imam profile not found"))?;
    Ok(ApiResponse::success(def.hooks.present(profile)))
}
