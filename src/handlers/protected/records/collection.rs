use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde_json::{Map, Value};

use super::{body_object, scope_args, CenterScope};
use crate::database::params::coerce_query_value;
use crate::database::repository::Repository;
use crate::entities::{audit, EntityDef, HookContext};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{AccessScope, ApiResponse, ApiResult, AuthUser};
use crate::types::Operation;

const DEFAULT_ORDER: &str = "id desc";

/// `employeeId` and `employee_id` both name the `employee_id` column.
fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn paging_value(params: &HashMap<String, String>, key: &str) -> Result<Option<i32>, ApiError> {
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid {}: {}", key, raw))),
    }
}

/// Translate the list query string into filter data.
fn list_filter(def: &EntityDef, params: &HashMap<String, String>) -> Result<(Map<String, Value>, FilterData), ApiError> {
    let mut where_data = Map::new();
    for (key, raw) in params {
        let column = to_snake_case(key);
        if def.filter_columns.contains(&column.as_str()) {
            where_data.insert(column, coerce_query_value(raw));
        }
    }

    let order = params
        .get("order")
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .unwrap_or(DEFAULT_ORDER);

    let filter_data = FilterData {
        select: None,
        where_clause: None,
        order: Some(Value::from(order)),
        limit: paging_value(params, "limit")?,
        offset: paging_value(params, "offset")?,
    };
    Ok((where_data, filter_data))
}

/// GET /api/<entity> - list rows visible to the caller
pub async fn records_get(
    State(def): State<&'static EntityDef>,
    Extension(user): Extension<AuthUser>,
    Extension(access): Extension<AccessScope>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Value>> {
    let (mut where_data, mut filter_data) = list_filter(def, &params)?;

    let repo = Repository::connect(def.table).await?;
    let ctx = HookContext { operation: Operation::Select, entity: def, user: &user, access: &access, repo: &repo };
    def.hooks.scope_list(&ctx, &mut where_data).await?;
    if !where_data.is_empty() {
        filter_data.where_clause = Some(Value::Object(where_data));
    }

    let scope = CenterScope::for_request(def, &user, &access);
    let rows = repo.select_any(filter_data, scope_args(&scope)).await?;
    Ok(ApiResponse::success(rows.into_iter().map(|row| def.hooks.present(row)).collect()))
}

/// POST /api/<entity> - create a row stamped with the caller
pub async fn records_post(
    State(def): State<&'static EntityDef>,
    Extension(user): Extension<AuthUser>,
    Extension(access): Extension<AccessScope>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(body) = payload?;
    let mut fields = body_object(body)?;
    fields.remove("id");

    audit::stamp_create(&mut fields, &user);
    if def.center_scoped {
        audit::assign_center(&mut fields, &user);
    }

    let repo = Repository::connect(def.table).await?;
    let ctx = HookContext { operation: Operation::Create, entity: def, user: &user, access: &access, repo: &repo };
    def.hooks.before_create(&ctx, &mut fields).await?;

    let row = repo.insert(&fields).await?;
    audit::log_change(Operation::Create, def.table, row.get("id"), &user);
    Ok(ApiResponse::created(def.hooks.present(row)))
}
