use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, Postgres};

type Query<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;
type QueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, PgArguments>;

/// Bind a JSON parameter with the closest native PostgreSQL type.
pub fn bind_param_query<'q>(q: Query<'q>, v: &'q Value) -> Query<'q> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // Arrays are expanded by FilterWhere; anything left over travels as JSONB
        Value::Array(_) | Value::Object(_) => q.bind(v),
    }
}

pub fn bind_param_query_as<'q, O>(q: QueryAs<'q, O>, v: &'q Value) -> QueryAs<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v),
    }
}

/// Query-string values arrive as text; numeric strings bind as integers and
/// `true`/`false` as booleans so they compare against typed columns.
pub fn coerce_query_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_query_strings() {
        assert_eq!(coerce_query_value("42"), json!(42));
        assert_eq!(coerce_query_value(" 7 "), json!(7));
        assert_eq!(coerce_query_value("true"), json!(true));
        assert_eq!(coerce_query_value("Approved"), json!("Approved"));
        assert_eq!(coerce_query_value("2024-01-05"), json!("2024-01-05"));
    }
}
