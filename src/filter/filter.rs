use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{is_valid_identifier, FilterData, FilterOrderInfo, SqlResult};
use crate::config::config;

/// A validated list query against one table. Everything the client sent is
/// checked when the filter is built, so rendering cannot fail on names.
#[derive(Debug)]
pub struct Filter {
    table: String,
    columns: Vec<String>,
    conditions: Option<Value>,
    ordering: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn build(table: &str, data: FilterData) -> Result<Self, FilterError> {
        if !is_valid_identifier(table) {
            return Err(FilterError::InvalidTable(table.to_string()));
        }

        let columns = data.select.unwrap_or_default();
        if let Some(bad) = columns.iter().find(|c| c.as_str() != "*" && !is_valid_identifier(c)) {
            return Err(FilterError::InvalidColumn(bad.clone()));
        }

        if let Some(conditions) = &data.where_clause {
            FilterWhere::validate(conditions)?;
        }

        let ordering = match &data.order {
            Some(order) => FilterOrder::validate_and_parse(order)?,
            None => Vec::new(),
        };

        if data.limit.map_or(false, |l| l < 0) {
            return Err(FilterError::NegativePaging("limit"));
        }
        if data.offset.map_or(false, |o| o < 0) {
            return Err(FilterError::NegativePaging("offset"));
        }

        Ok(Self {
            table: table.to_string(),
            columns,
            conditions: data.where_clause,
            ordering,
            limit: data.limit.map(cap_limit),
            offset: data.offset,
        })
    }

    /// `SELECT .. FROM .. [WHERE ..] [ORDER BY ..] [LIMIT n] [OFFSET m]`
    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (predicate, params) = self.predicate()?;

        let mut parts = vec![format!("SELECT {} FROM \"{}\"", self.column_list(), self.table)];
        if !predicate.is_empty() {
            parts.push(format!("WHERE {}", predicate));
        }
        if !self.ordering.is_empty() {
            parts.push(FilterOrder::generate(&self.ordering));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {}", offset));
        }

        Ok(SqlResult::with_params(parts.join(" "), params))
    }

    fn predicate(&self) -> Result<(String, Vec<Value>), FilterError> {
        match &self.conditions {
            Some(conditions) => FilterWhere::generate(conditions, 0),
            None => Ok((String::new(), Vec::new())),
        }
    }

    fn column_list(&self) -> String {
        if self.columns.is_empty() || self.columns.iter().any(|c| c == "*") {
            return "*".to_string();
        }
        self.columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
    }
}

fn cap_limit(requested: i32) -> i32 {
    let settings = &config().filter;
    match settings.max_limit {
        Some(max) if requested > max => {
            if settings.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping", requested, max);
            }
            max
        }
        _ => requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_full_select() {
        let filter = Filter::build(
            "supplier_evaluation",
            FilterData {
                where_clause: Some(json!({ "supplier_id": 7 })),
                order: Some(json!("id desc")),
                limit: Some(20),
                offset: Some(40),
                ..Default::default()
            },
        )
        .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"supplier_evaluation\" WHERE \"supplier_id\" = $1 ORDER BY \"id\" DESC LIMIT 20 OFFSET 40"
        );
        assert_eq!(sql.params, vec![json!(7)]);
    }

    #[test]
    fn bare_table_has_no_where() {
        let filter = Filter::build("tickets", FilterData::default()).unwrap();
        assert_eq!(filter.to_sql().unwrap().query, "SELECT * FROM \"tickets\"");
    }

    #[test]
    fn selected_columns_are_quoted() {
        let data = FilterData { select: Some(vec!["id".into(), "title".into()]), ..Default::default() };
        let sql = Filter::build("tickets", data).unwrap().to_sql().unwrap();
        assert_eq!(sql.query, "SELECT \"id\", \"title\" FROM \"tickets\"");
    }

    #[test]
    fn rejects_bad_names_and_negative_paging() {
        assert!(matches!(
            Filter::build("employee; --", FilterData::default()),
            Err(FilterError::InvalidTable(_))
        ));

        let negative = FilterData { limit: Some(-1), ..Default::default() };
        assert!(matches!(Filter::build("employee", negative), Err(FilterError::NegativePaging("limit"))));

        let bad_column = FilterData { select: Some(vec!["name".into(), "bad col".into()]), ..Default::default() };
        assert!(matches!(Filter::build("employee", bad_column), Err(FilterError::InvalidColumn(c)) if c == "bad col"));
    }

    #[test]
    fn oversized_limits_are_capped() {
        let max = config().filter.max_limit.unwrap_or(i32::MAX);
        let data = FilterData { limit: Some(i32::MAX), ..Default::default() };
        let sql = Filter::build("tickets", data).unwrap().to_sql().unwrap();
        assert_eq!(sql.query, format!("SELECT * FROM \"tickets\" LIMIT {}", max));
    }
}
