use serde_json::{Map, Value};
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::config;
use crate::database::fragments::{build_insert_fragments, build_update_fragments, FragmentError, FragmentOptions};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::params::{bind_param_query, bind_param_query_as};
use crate::database::scope::{apply_center_filter, ScopeOptions, ScopeSubject};
use crate::filter::{is_valid_identifier, Filter, FilterData, SqlResult};

/// JSON-row access to a single table.
///
/// Rows come back as JSON objects (`row_to_json`), so every entity shares
/// one code path regardless of its columns.
pub struct Repository {
    table_name: String,
    pool: PgPool,
}

impl Repository {
    pub fn new(table_name: impl Into<String>, pool: PgPool) -> Result<Self, DatabaseError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(DatabaseError::InvalidQuery(format!("Invalid table name: {}", table_name)));
        }
        Ok(Self { table_name, pool })
    }

    pub async fn connect(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        Self::new(table_name, DatabaseManager::pool().await?)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Build the filtered SELECT, optionally scoped to the caller's center.
    pub fn select_sql(&self, filter_data: FilterData, scope: Option<(&ScopeSubject, &ScopeOptions)>) -> Result<SqlResult, DatabaseError> {
        let sql = Filter::build(&self.table_name, filter_data)
            .and_then(|filter| filter.to_sql())
            .map_err(invalid_query)?;
        Ok(match scope {
            Some((subject, options)) => apply_center_filter(sql, subject, options),
            None => sql,
        })
    }

    pub async fn select_any(
        &self,
        filter_data: FilterData,
        scope: Option<(&ScopeSubject, &ScopeOptions)>,
    ) -> Result<Vec<Value>, DatabaseError> {
        let sql = self.select_sql(filter_data, scope)?;
        self.fetch_rows(&sql).await
    }

    pub async fn select_by_id(
        &self,
        id: i64,
        scope: Option<(&ScopeSubject, &ScopeOptions)>,
    ) -> Result<Option<Value>, DatabaseError> {
        let sql = SqlResult::with_params(
            format!("SELECT * FROM \"{}\" WHERE \"id\" = $1", self.table_name),
            vec![Value::from(id)],
        );
        let sql = match scope {
            Some((subject, options)) => apply_center_filter(sql, subject, options),
            None => sql,
        };
        Ok(self.fetch_rows(&sql).await?.into_iter().next())
    }

    pub async fn insert(&self, fields: &Map<String, Value>) -> Result<Value, DatabaseError> {
        if fields.is_empty() {
            return Err(invalid_query(FragmentError::Empty));
        }
        let fragments =
            build_insert_fragments(fields, FragmentOptions::typed(&self.table_name)).map_err(invalid_query)?;
        let sql = SqlResult::with_params(
            format!(
                "INSERT INTO \"{table}\" ({}) VALUES ({}) RETURNING row_to_json(\"{table}\".*) AS row",
                fragments.columns,
                fragments.placeholders,
                table = self.table_name
            ),
            fragments.values,
        );
        self.fetch_one_row(&sql).await
    }

    pub async fn update_by_id(&self, id: i64, fields: &Map<String, Value>) -> Result<Option<Value>, DatabaseError> {
        if fields.is_empty() {
            return Err(invalid_query(FragmentError::Empty));
        }
        let fragments =
            build_update_fragments(fields, FragmentOptions::typed(&self.table_name), 1).map_err(invalid_query)?;
        let mut params = vec![Value::from(id)];
        params.extend(fragments.values);
        let sql = SqlResult::with_params(
            format!(
                "UPDATE \"{table}\" SET {} WHERE \"id\" = $1 RETURNING row_to_json(\"{table}\".*) AS row",
                fragments.set_clause,
                table = self.table_name
            ),
            params,
        );
        Ok(self.fetch_rows(&sql).await?.into_iter().next())
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<Option<Value>, DatabaseError> {
        let sql = SqlResult::with_params(
            format!(
                "DELETE FROM \"{table}\" WHERE \"id\" = $1 RETURNING row_to_json(\"{table}\".*) AS row",
                table = self.table_name
            ),
            vec![Value::from(id)],
        );
        Ok(self.fetch_rows(&sql).await?.into_iter().next())
    }

    /// Run any SELECT and return each result row as a JSON object.
    pub async fn fetch_rows(&self, sql: &SqlResult) -> Result<Vec<Value>, DatabaseError> {
        let wrapped = if sql.query.trim_start().to_ascii_uppercase().starts_with("SELECT") {
            format!("SELECT row_to_json(t) AS row FROM ({}) t", sql.query)
        } else {
            // INSERT/UPDATE/DELETE already return `row`
            sql.query.clone()
        };

        let started = Instant::now();
        let mut q = sqlx::query(&wrapped);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        log_timing(&wrapped, started);

        rows.iter()
            .map(|row| row.try_get::<Value, _>("row").map_err(DatabaseError::from))
            .collect()
    }

    async fn fetch_one_row(&self, sql: &SqlResult) -> Result<Value, DatabaseError> {
        self.fetch_rows(sql)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::QueryError(format!("No row returned from {}", self.table_name)))
    }

    /// Run a `SELECT COUNT(*)::int8 AS count ...` query.
    pub async fn count(&self, sql: &SqlResult) -> Result<i64, DatabaseError> {
        let started = Instant::now();
        let mut q = sqlx::query_as::<_, (i64,)>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let (count,) = q.fetch_one(&self.pool).await?;
        log_timing(&sql.query, started);
        Ok(count)
    }
}

/// Filter and fragment errors stem from client input.
fn invalid_query(e: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::InvalidQuery(e.to_string())
}

fn log_timing(query: &str, started: Instant) {
    let settings = &config().database;
    let elapsed = started.elapsed().as_millis() as u64;
    if elapsed > settings.slow_query_threshold_ms {
        warn!(elapsed_ms = elapsed, "Slow query: {}", query);
    } else if settings.enable_query_logging {
        debug!(elapsed_ms = elapsed, "{}", query);
    }
}
