use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};

use super::{body_object, find_visible};
use crate::database::repository::Repository;
use crate::entities::{audit, EntityDef, HookContext};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{AccessScope, ApiResponse, ApiResult, AuthUser};
use crate::types::Operation;

/// GET /api/<entity>/:id
pub async fn record_get(
    State(def): State<&'static EntityDef>,
    Extension(user): Extension<AuthUser>,
    Extension(access): Extension<AccessScope>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let repo = Repository::connect(def.table).await?;
    let row = find_visible(&repo, def, id, &user, &access).await?;
    Ok(ApiResponse::success(def.hooks.present(row)))
}

/// PUT /api/<entity>/:id
///
/// The row must be visible to the caller before it is touched; the update
/// itself then goes by id.
pub async fn record_put(
    State(def): State<&'static EntityDef>,
    Extension(user): Extension<AuthUser>,
    Extension(access): Extension<AccessScope>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let Json(body) = payload?;
    let mut fields = body_object(body)?;

    let repo = Repository::connect(def.table).await?;
    find_visible(&repo, def, id, &user, &access).await?;

    fields.remove("id");
    audit::stamp_update(&mut fields, &user);
    if def.center_scoped {
        audit::assign_center(&mut fields, &user);
    }

    let ctx = HookContext { operation: Operation::Update, entity: def, user: &user, access: &access, repo: &repo };
    def.hooks.before_update(&ctx, id, &mut fields).await?;

    let row = repo
        .update_by_id(id, &fields)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found"))?;
    audit::log_change(Operation::Update, def.table, row.get("id"), &user);
    Ok(ApiResponse::success(def.hooks.present(row)))
}

/// DELETE /api/<entity>/:id
pub async fn record_delete(
    State(def): State<&'static EntityDef>,
    Extension(user): Extension<AuthUser>,
    Extension(access): Extension<AccessScope>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let repo = Repository::connect(def.table).await?;
    find_visible(&repo, def, id, &user, &access).await?;

    let deleted = repo
        .delete_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found"))?;
    audit::log_change(Operation::Delete, def.table, deleted.get("id"), &user);
    Ok(ApiResponse::success(json!({ "message": "Deleted successfully" })))
}
