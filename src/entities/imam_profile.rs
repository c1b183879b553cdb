use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{HookContext, RecordHooks};
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::filter::SqlResult;

pub const TABLE: &str = "imam_profiles";

/// Default `status_id` for new profiles (Pending).
const PENDING_STATUS: i64 = 1;

pub async fn find_by_employee_id(repo: &Repository, employee_id: i64) -> Result<Option<Value>, ApiError> {
    let sql = SqlResult::with_params(
        format!("SELECT * FROM \"{}\" WHERE \"employee_id\" = $1 LIMIT 1", TABLE),
        vec![Value::from(employee_id)],
    );
    Ok(repo.fetch_rows(&sql).await?.into_iter().next())
}

/// One profile per employee, owned by the account that creates it.
pub struct ImamProfileHooks;

#[async_trait]
impl RecordHooks for ImamProfileHooks {
    async fn before_create(&self, ctx: &HookContext<'_>, fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        let employee_id = ctx.user.id;
        if employee_id <= 0 {
            return Err(ApiError::bad_request("Employee ID is required"));
        }

        if find_by_employee_id(ctx.repo, employee_id).await?.is_some() {
            return Err(ApiError::bad_request("Employee already has an imam profile"));
        }

        fields.insert("employee_id".to_string(), Value::from(employee_id));
        apply_default_status(fields);
        Ok(())
    }

    async fn before_update(&self, _ctx: &HookContext<'_>, _id: i64, fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        // Ownership is fixed at creation
        fields.remove("employee_id");
        Ok(())
    }
}

fn apply_default_status(fields: &mut Map<String, Value>) {
    let missing = match fields.get("status_id") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Number(n)) => n.as_i64() == Some(0),
        _ => false,
    };
    if missing {
        fields.insert("status_id".to_string(), Value::from(PENDING_STATUS));
    }
}
