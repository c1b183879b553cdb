//! Support tickets. The UI speaks in `classification`, `status`,
//! `created_time` and `closed_time`; the table stores `*_id` and `*_at`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{HookContext, RecordHooks};
use crate::error::ApiError;
use crate::rbac::parse_int_like;

const DEFAULT_STATUS: i64 = 1;
const MEDIA_FIELDS: [&str; 4] = ["media", "media_filename", "media_mime", "media_size"];

pub struct TicketHooks;

/// Blank strings and nulls count as absent.
fn int_or_null(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_int_like(s),
        _ => None,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

fn rename(fields: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = fields.remove(from) {
        if !is_blank(Some(&value)) {
            fields.insert(to.to_string(), value);
        }
    }
}

fn normalize(fields: &mut Map<String, Value>, creating: bool) {
    if fields.contains_key("classification") {
        let classification = fields.remove("classification");
        fields.insert(
            "classification_id".to_string(),
            int_or_null(classification.as_ref()).map(Value::from).unwrap_or(Value::Null),
        );
    }

    if let Some(status) = fields.remove("status") {
        fields.insert("status_id".to_string(), status);
    }
    if !is_blank(fields.get("status_id")) {
        let status = int_or_null(fields.get("status_id")).filter(|s| *s != 0).unwrap_or(DEFAULT_STATUS);
        fields.insert("status_id".to_string(), Value::from(status));
    } else if creating {
        fields.insert("status_id".to_string(), Value::from(DEFAULT_STATUS));
    } else {
        fields.remove("status_id");
    }

    if creating || fields.contains_key("allocated_to") {
        let allocated = int_or_null(fields.get("allocated_to"));
        fields.insert("allocated_to".to_string(), allocated.map(Value::from).unwrap_or(Value::Null));
    }

    rename(fields, "created_time", "created_at");
    rename(fields, "closed_time", "closed_at");

    // Attachments arrive through the upload endpoint only
    for key in MEDIA_FIELDS {
        fields.remove(key);
    }
}

#[async_trait]
impl RecordHooks for TicketHooks {
    async fn before_create(&self, _ctx: &HookContext<'_>, fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        normalize(fields, true);
        Ok(())
    }

    async fn before_update(&self, _ctx: &HookContext<'_>, _id: i64, fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        normalize(fields, false);
        Ok(())
    }

    fn present(&self, mut row: Value) -> Value {
        let obj = match row.as_object_mut() {
            Some(obj) => obj,
            None => return row,
        };
        for (column, alias) in [
            ("classification_id", "classification"),
            ("status_id", "status"),
            ("created_at", "created_time"),
            ("closed_at", "closed_time"),
        ] {
            if let Some(value) = obj.get(column).cloned() {
                obj.insert(alias.to_string(), value);
            }
        }
        let has_media = obj.get("media").map(|m| !m.is_null()).unwrap_or(false);
        let has_filename = obj.get("media_filename").map(|f| !f.is_null()).unwrap_or(false);
        if has_media && has_filename {
            obj.insert("media".to_string(), Value::from("exists"));
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_maps_ui_names_and_defaults() {
        let mut f = fields(json!({
            "classification": "2",
            "allocated_to": "",
            "created_time": "2024-05-01T08:00:00Z",
            "media": "raw"
        }));
        normalize(&mut f, true);
        assert_eq!(f["classification_id"], json!(2));
        assert_eq!(f["status_id"], json!(1));
        assert_eq!(f["allocated_to"], Value::Null);
        assert_eq!(f["created_at"], json!("2024-05-01T08:00:00Z"));
        assert!(!f.contains_key("classification"));
        assert!(!f.contains_key("media"));
    }

    #[test]
    fn update_leaves_absent_fields_alone() {
        let mut f = fields(json!({ "status": "3", "closed_time": "2024-05-02" }));
        normalize(&mut f, false);
        assert_eq!(f["status_id"], json!(3));
        assert_eq!(f["closed_at"], json!("2024-05-02"));
        assert!(!f.contains_key("allocated_to"));
        assert!(!f.contains_key("classification_id"));
    }

    #[test]
    fn present_adds_aliases_and_hides_media() {
        let row = json!({
            "id": 8, "classification_id": 2, "status_id": 1,
            "created_at": "2024-05-01", "closed_at": null,
            "media": "\\x89504e47", "media_filename": "shot.png"
        });
        let shown = TicketHooks.present(row);
        assert_eq!(shown["classification"], json!(2));
        assert_eq!(shown["status"], json!(1));
        assert_eq!(shown["created_time"], json!("2024-05-01"));
        assert_eq!(shown["closed_time"], Value::Null);
        assert_eq!(shown["media"], json!("exists"));
    }
}
