//! Audit columns, center assignment and the audit log.

use serde_json::{Map, Value};

use crate::config::config;
use crate::middleware::AuthUser;
use crate::types::Operation;

/// `created_by` and `updated_by` both become the caller on create.
pub fn stamp_create(fields: &mut Map<String, Value>, user: &AuthUser) {
    let name = Value::from(user.audit_name());
    fields.insert("created_by".to_string(), name.clone());
    fields.insert("updated_by".to_string(), name);
}

/// Updates never rewrite `created_by`.
pub fn stamp_update(fields: &mut Map<String, Value>, user: &AuthUser) {
    fields.remove("created_by");
    fields.insert("updated_by".to_string(), Value::from(user.audit_name()));
}

/// Global admins may file a row under any center; everyone else writes to
/// their own, or to none when the token carries no center.
pub fn assign_center(fields: &mut Map<String, Value>, user: &AuthUser) {
    if user.is_global_admin() {
        return;
    }
    match user.center_id {
        Some(center_id) => {
            fields.insert("center_id".to_string(), Value::from(center_id));
        }
        None => {
            fields.remove("center_id");
        }
    }
}

pub fn log_change(operation: Operation, table: &str, id: Option<&Value>, user: &AuthUser) {
    if !config().security.enable_audit_logging {
        return;
    }
    tracing::info!(
        target: "audit",
        operation = operation.as_str(),
        table,
        id = %id.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
        user_id = user.id,
        username = %user.username,
        "record {}",
        operation.as_str()
    );
}
