//! Center (tenant) scoping for hand-written and generated SQL.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::auth::Claims;
use crate::filter::SqlResult;
use crate::rbac::{needs_center_restriction, Role};

static WHERE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bwhere\b").expect("valid regex"));
static TRAILING_CLAUSES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)\border\s+by\b").expect("valid regex"),
        Regex::new(r"(?i)\bgroup\s+by\b").expect("valid regex"),
        Regex::new(r"(?i)\blimit\b").expect("valid regex"),
    ]
});

/// The parts of a caller's identity that scoping depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScopeSubject {
    pub role_id: Option<i64>,
    pub center_id: Option<i64>,
}

impl ScopeSubject {
    /// A caller with no role and no center: filtering is required but
    /// there is nothing to filter on.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl From<&Claims> for ScopeSubject {
    fn from(claims: &Claims) -> Self {
        Self { role_id: claims.role_id(), center_id: claims.center_id() }
    }
}

#[derive(Debug, Clone)]
pub struct ScopeOptions {
    pub alias: Option<String>,
    pub column: String,
    pub center_id: Option<i64>,
    pub enforce: Option<bool>,
    pub skip: bool,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self { alias: None, column: "center_id".to_string(), center_id: None, enforce: None, skip: false }
    }
}

impl ScopeOptions {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn enforce(mut self, enforce: bool) -> Self {
        self.enforce = Some(enforce);
        self
    }
}

/// Append `center_id = $n` to `query` when the caller must be confined to
/// their own center.
///
/// The predicate lands before any `ORDER BY`, `GROUP BY` or `LIMIT`, joined
/// with `AND` when the text already has a `WHERE`. Missing or non-numeric
/// center information leaves the query untouched.
pub fn apply_center_filter(query: SqlResult, user: &ScopeSubject, options: &ScopeOptions) -> SqlResult {
    if options.skip {
        return query;
    }

    let required = options
        .enforce
        .unwrap_or_else(|| needs_center_restriction(user.role_id.and_then(Role::from_id)));
    if !required {
        return query;
    }

    let center_id = match options.center_id.or(user.center_id) {
        Some(id) => id,
        None => return query,
    };

    let column_ref = match options.alias.as_deref() {
        Some(alias) if !alias.is_empty() => format!("{}.{}", alias, options.column),
        _ => options.column.clone(),
    };

    let SqlResult { query: text, mut params } = query;
    let placeholder = format!("${}", params.len() + 1);
    let text = append_center_clause(&text, &column_ref, &placeholder);
    params.push(serde_json::Value::from(center_id));

    SqlResult { query: text, params }
}

fn append_center_clause(sql: &str, column_ref: &str, placeholder: &str) -> String {
    let keyword = if WHERE_WORD.is_match(sql) { "AND" } else { "WHERE" };

    let insert_at = TRAILING_CLAUSES
        .iter()
        .filter_map(|re| re.find(sql).map(|m| m.start()))
        .min()
        .unwrap_or(sql.len());

    let before = sql[..insert_at].trim();
    let after = &sql[insert_at..];
    if after.is_empty() {
        format!("{} {} {} = {}", before, keyword, column_ref, placeholder)
    } else {
        format!("{} {} {} = {} {}", before, keyword, column_ref, placeholder, after)
    }
}

/// Model-level scoping request: the caller's center and whether they are a
/// super admin, without the rest of the token.
#[derive(Debug, Clone, Default)]
pub struct ScopeRequest {
    pub center_id: Option<i64>,
    pub is_super_admin: bool,
    pub column: Option<String>,
    pub alias: Option<String>,
    pub enforce: Option<bool>,
}

/// Scope `query` to `request.center_id` unless the request comes from a
/// super admin. An explicit `enforce` wins over the admin flag.
pub fn scope_query(query: SqlResult, request: &ScopeRequest) -> SqlResult {
    let options = ScopeOptions {
        alias: request.alias.clone(),
        column: request.column.clone().unwrap_or_else(|| "center_id".to_string()),
        center_id: request.center_id,
        enforce: Some(request.enforce.unwrap_or(!request.is_super_admin)),
        skip: false,
    };
    apply_center_filter(query, &ScopeSubject::anonymous(), &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caseworker(center: i64) -> ScopeSubject {
        ScopeSubject { role_id: Some(5), center_id: Some(center) }
    }

    #[test]
    fn adds_where_when_missing() {
        let scoped = apply_center_filter(
            SqlResult::new("SELECT * FROM applicant_details"),
            &caseworker(3),
            &ScopeOptions::default(),
        );
        assert_eq!(scoped.query, "SELECT * FROM applicant_details WHERE center_id = $1");
        assert_eq!(scoped.params, vec![json!(3)]);
    }

    #[test]
    fn inserts_before_order_by_with_and() {
        let query = SqlResult::with_params(
            "SELECT * FROM home_visit WHERE file_id = $1 ORDER BY visit_date DESC LIMIT 10",
            vec![json!(88)],
        );
        let scoped = apply_center_filter(query, &caseworker(2), &ScopeOptions::default().alias("hv"));
        assert_eq!(
            scoped.query,
            "SELECT * FROM home_visit WHERE file_id = $1 AND hv.center_id = $2 ORDER BY visit_date DESC LIMIT 10"
        );
        assert_eq!(scoped.params, vec![json!(88), json!(2)]);
    }

    #[test]
    fn earliest_trailing_clause_wins() {
        let scoped = apply_center_filter(
            SqlResult::new("select center_id, count(*) from comments group by center_id order by 2 limit 5"),
            &caseworker(7),
            &ScopeOptions::default(),
        );
        assert_eq!(
            scoped.query,
            "select center_id, count(*) from comments WHERE center_id = $1 group by center_id order by 2 limit 5"
        );
    }

    #[test]
    fn global_admins_are_not_filtered() {
        let admin = ScopeSubject { role_id: Some(1), center_id: Some(3) };
        let query = SqlResult::new("SELECT * FROM supplier_profile");
        assert_eq!(apply_center_filter(query.clone(), &admin, &ScopeOptions::default()), query);
    }

    #[test]
    fn unknown_roles_are_filtered() {
        let stranger = ScopeSubject { role_id: Some(42), center_id: Some(9) };
        let scoped = apply_center_filter(SqlResult::new("SELECT 1"), &stranger, &ScopeOptions::default());
        assert_eq!(scoped.query, "SELECT 1 WHERE center_id = $1");
    }

    #[test]
    fn missing_center_leaves_query_alone() {
        let query = SqlResult::new("SELECT * FROM financial_assistance");
        let scoped = apply_center_filter(query.clone(), &ScopeSubject { role_id: Some(3), center_id: None }, &ScopeOptions::default());
        assert_eq!(scoped, query);
    }

    #[test]
    fn skip_and_enforce_override_the_role() {
        let query = SqlResult::new("SELECT * FROM center_audits");
        let skipped = ScopeOptions { skip: true, ..Default::default() };
        assert_eq!(apply_center_filter(query.clone(), &caseworker(1), &skipped), query);

        let admin = ScopeSubject { role_id: Some(2), center_id: Some(6) };
        let scoped = apply_center_filter(query, &admin, &ScopeOptions::default().enforce(true));
        assert_eq!(scoped.params, vec![json!(6)]);
    }

    #[test]
    fn words_containing_limit_are_not_clauses() {
        let scoped = apply_center_filter(
            SqlResult::new("SELECT credit_limit FROM supplier_profile"),
            &caseworker(4),
            &ScopeOptions::default(),
        );
        assert_eq!(scoped.query, "SELECT credit_limit FROM supplier_profile WHERE center_id = $1");
    }

    #[test]
    fn scope_query_uses_request_center() {
        let request = ScopeRequest { center_id: Some(5), ..Default::default() };
        let scoped = scope_query(SqlResult::new("SELECT * FROM employee_skills"), &request);
        assert_eq!(scoped.query, "SELECT * FROM employee_skills WHERE center_id = $1");

        let admin = ScopeRequest { center_id: Some(5), is_super_admin: true, ..Default::default() };
        let unscoped = scope_query(SqlResult::new("SELECT * FROM employee_skills"), &admin);
        assert!(unscoped.params.is_empty());
    }
}
