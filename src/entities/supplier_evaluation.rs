use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{HookContext, RecordHooks};
use crate::error::ApiError;

/// Columns a client may write. Anything else in the body is ignored.
const WRITABLE: &[&str] = &[
    "supplier_id",
    "eval_date",
    "quality_score",
    "delivery_score",
    "cost_score",
    "ohs_score",
    "env_score",
    "quality_wt",
    "delivery_wt",
    "cost_wt",
    "ohs_wt",
    "env_wt",
    "overall_score",
    "status",
    "expiry_date",
    "notes",
    "created_by",
    "updated_by",
    "center_id",
];

pub struct SupplierEvaluationHooks;

/// Keep whitelisted, non-null values only.
fn retain_writable(fields: &mut Map<String, Value>) {
    fields.retain(|key, value| WRITABLE.contains(&key.as_str()) && !value.is_null());
}

#[async_trait]
impl RecordHooks for SupplierEvaluationHooks {
    async fn before_create(&self, _ctx: &HookContext<'_>, fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        retain_writable(fields);
        Ok(())
    }

    async fn before_update(&self, _ctx: &HookContext<'_>, _id: i64, fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        retain_writable(fields);
        Ok(())
    }
}
