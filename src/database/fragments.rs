//! Column/placeholder fragments for INSERT and UPDATE statements built from
//! JSON request bodies.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::is_valid_identifier;

#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("No fields to write")]
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct FragmentOptions<'a> {
    /// Wrap column names in double quotes.
    pub quote: bool,
    /// Coerce each value to the column type of this table. Values are then
    /// sent as JSON text and converted by `jsonb_populate_record`.
    pub typed_as: Option<&'a str>,
}

impl Default for FragmentOptions<'_> {
    fn default() -> Self {
        Self { quote: true, typed_as: None }
    }
}

impl<'a> FragmentOptions<'a> {
    pub fn typed(table: &'a str) -> Self {
        Self { quote: true, typed_as: Some(table) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertFragments {
    pub columns: String,
    pub placeholders: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFragments {
    pub set_clause: String,
    pub values: Vec<Value>,
}

pub fn build_insert_fragments(fields: &Map<String, Value>, options: FragmentOptions<'_>) -> Result<InsertFragments, FragmentError> {
    check_table(options)?;
    let mut columns = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());

    for (index, (key, value)) in fields.iter().enumerate() {
        check_column(key)?;
        columns.push(wrap_identifier(key, options.quote));
        placeholders.push(placeholder(key, index + 1, options));
        values.push(encode_value(value, options));
    }

    Ok(InsertFragments { columns: columns.join(", "), placeholders: placeholders.join(", "), values })
}

/// `start` is the number of parameters already bound ahead of the SET list.
pub fn build_update_fragments(
    fields: &Map<String, Value>,
    options: FragmentOptions<'_>,
    start: usize,
) -> Result<UpdateFragments, FragmentError> {
    check_table(options)?;
    let mut assignments = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());

    for (index, (key, value)) in fields.iter().enumerate() {
        check_column(key)?;
        assignments.push(format!(
            "{} = {}",
            wrap_identifier(key, options.quote),
            placeholder(key, start + index + 1, options)
        ));
        values.push(encode_value(value, options));
    }

    Ok(UpdateFragments { set_clause: assignments.join(", "), values })
}

fn check_table(options: FragmentOptions<'_>) -> Result<(), FragmentError> {
    match options.typed_as {
        Some(table) if !is_valid_identifier(table) => Err(FragmentError::InvalidTable(table.to_string())),
        _ => Ok(()),
    }
}

fn check_column(key: &str) -> Result<(), FragmentError> {
    if is_valid_identifier(key) {
        Ok(())
    } else {
        Err(FragmentError::InvalidColumn(key.to_string()))
    }
}

fn wrap_identifier(key: &str, quote: bool) -> String {
    if quote {
        format!("\"{}\"", key)
    } else {
        key.to_string()
    }
}

fn placeholder(key: &str, index: usize, options: FragmentOptions<'_>) -> String {
    match options.typed_as {
        None => format!("${}", index),
        Some(table) => format!(
            "(jsonb_populate_record(NULL::\"{}\", jsonb_build_object('{}', ${}::jsonb))).\"{}\"",
            table, key, index, key
        ),
    }
}

fn encode_value(value: &Value, options: FragmentOptions<'_>) -> Value {
    match options.typed_as {
        None => value.clone(),
        Some(_) => Value::String(value.to_string()),
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
    fn insert_fragments_number_placeholders() {
        let f = build_insert_fragments(
            &fields(json!({ "name": "Masjid Noor", "center_id": 3, "notes": null })),
            FragmentOptions::default(),
        )
        .unwrap();
        assert_eq!(f.columns, "\"center_id\", \"name\", \"notes\"");
        assert_eq!(f.placeholders, "$1, $2, $3");
        assert_eq!(f.values, vec![json!(3), json!("Masjid Noor"), Value::Null]);
    }

    #[test]
    fn unquoted_columns() {
        let f = build_insert_fragments(&fields(json!({ "id": 1 })), FragmentOptions { quote: false, typed_as: None }).unwrap();
        assert_eq!(f.columns, "id");
    }

    #[test]
    fn update_fragments_start_after_existing_params() {
        let f = build_update_fragments(
            &fields(json!({ "status": "Approved", "updated_by": "aisha" })),
            FragmentOptions::default(),
            1,
        )
        .unwrap();
        assert_eq!(f.set_clause, "\"status\" = $2, \"updated_by\" = $3");
        assert_eq!(f.values.len(), 2);
    }

    #[test]
    fn typed_placeholders_go_through_the_row_type() {
        let f = build_update_fragments(
            &fields(json!({ "eval_date": "2024-03-01" })),
            FragmentOptions::typed("supplier_evaluation"),
            0,
        )
        .unwrap();
        assert_eq!(
            f.set_clause,
            "\"eval_date\" = (jsonb_populate_record(NULL::\"supplier_evaluation\", jsonb_build_object('eval_date', $1::jsonb))).\"eval_date\""
        );
        assert_eq!(f.values, vec![json!("\"2024-03-01\"")]);
    }

    #[test]
    fn rejects_unsafe_keys() {
        let bad = fields(json!({ "name\" = 'x'; --": 1 }));
        assert!(matches!(
            build_insert_fragments(&bad, FragmentOptions::default()),
            Err(FragmentError::InvalidColumn(_))
        ));
        assert!(build_update_fragments(&fields(json!({ "a": 1 })), FragmentOptions::typed("t; drop"), 0).is_err());
    }
}
