use serde_json::Value;

use super::error::FilterError;
use super::types::{is_valid_identifier, FilterOp};

/// Compiles a JSON where-object into a SQL predicate with positional params.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self { param_values: vec![], param_index: starting_param_index }
    }

    /// Returns an empty predicate when there is nothing to filter on.
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let clause = filter_where.build_clause(where_data)?;
        Ok((clause, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            Value::String(_) => Err(FilterError::InvalidWhere("raw SQL predicates are not supported")),
            _ => Err(FilterError::InvalidWhere("expected an object")),
        }
    }

    fn build_clause(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(String::new()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhere("expected an object")),
        };

        let mut parts = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                if let Some(sql) = self.logical_condition(key, value)? {
                    parts.push(sql);
                }
            } else {
                parts.extend(self.field_conditions(key, value)?);
            }
        }
        Ok(parts.join(" AND "))
    }

    fn logical_condition(&mut self, op: &str, value: &Value) -> Result<Option<String>, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperand { op: op.to_string(), expected: "an array" })?;
                let mut sql_parts = Vec::new();
                for v in arr {
                    let sql = self.build_clause(v)?;
                    if !sql.is_empty() {
                        sql_parts.push(format!("({})", sql));
                    }
                }
                if sql_parts.is_empty() {
                    // An empty disjunction matches nothing; an empty conjunction matches everything
                    return Ok(if op == "$or" { Some("1=0".to_string()) } else { None });
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(Some(format!("({})", sql_parts.join(joiner))))
            }
            "$not" => {
                let sql = self.build_clause(value)?;
                if sql.is_empty() {
                    return Ok(Some("1=0".to_string()));
                }
                Ok(Some(format!("NOT ({})", sql)))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn field_conditions(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        if !is_valid_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }

        if let Value::Object(obj) = value {
            let mut out = Vec::new();
            for (op_key, op_val) in obj {
                let operator =
                    FilterOp::parse(op_key).ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                out.push(self.condition(field, operator, op_val)?);
            }
            Ok(out)
        } else {
            // Implicit equality: { field: value }
            Ok(vec![self.condition(field, FilterOp::Eq, value)?])
        }
    }

    fn condition(&mut self, field: &str, operator: FilterOp, data: &Value) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", field);
        match operator {
            FilterOp::Eq if data.is_null() => Ok(format!("{} IS NULL", quoted_column)),
            FilterOp::Ne if data.is_null() => Ok(format!("{} IS NOT NULL", quoted_column)),
            FilterOp::In | FilterOp::NIn => {
                let negate = operator == FilterOp::NIn;
                match data {
                    Value::Array(values) if values.is_empty() => {
                        Ok(if negate { "1=1".to_string() } else { "1=0".to_string() })
                    }
                    Value::Array(values) => {
                        let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                        let keyword = if negate { "NOT IN" } else { "IN" };
                        Ok(format!("{} {} ({})", quoted_column, keyword, params.join(", ")))
                    }
                    other => {
                        let cmp = if negate { "<>" } else { "=" };
                        Ok(format!("{} {} {}", quoted_column, cmp, self.param(other.clone())))
                    }
                }
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => Ok(format!(
                    "{} BETWEEN {} AND {}",
                    quoted_column,
                    self.param(values[0].clone()),
                    self.param(values[1].clone())
                )),
                _ => Err(FilterError::InvalidOperand { op: "$between".to_string(), expected: "an array of two values" }),
            },
            op => {
                let sql_op = op
                    .comparison_sql()
                    .ok_or_else(|| FilterError::UnsupportedOperator(format!("{:?}", op)))?;
                Ok(format!("{} {} {}", quoted_column, sql_op, self.param(data.clone())))
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_and_null_checks() {
        let (sql, params) = FilterWhere::generate(&json!({ "status_id": 2, "closed_at": null }), 0).unwrap();
        // serde_json maps iterate in key order
        assert_eq!(sql, "\"closed_at\" IS NULL AND \"status_id\" = $1");
        assert_eq!(params, vec![json!(2)]);
    }

    #[test]
    fn nested_logic_numbers_params_contiguously() {
        let where_data = json!({
            "supplier_id": 4,
            "$or": [ { "status": "Approved" }, { "overall_score": { "$gte": 80 } } ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(sql, "((\"status\" = $1) OR (\"overall_score\" >= $2)) AND \"supplier_id\" = $3");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (sql, _) = FilterWhere::generate(&json!({ "id": { "$in": [1, 2] } }), 2).unwrap();
        assert_eq!(sql, "\"id\" IN ($3, $4)");
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "id": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_unsafe_columns_and_raw_sql() {
        assert!(FilterWhere::generate(&json!({ "id\" OR 1=1 --": 1 }), 0).is_err());
        assert!(FilterWhere::validate(&json!("1=1")).is_err());
        assert!(FilterWhere::generate(&json!({ "id": { "$regex": "x" } }), 0).is_err());
    }
}
