//! Employees double as user accounts: they carry the login credentials and
//! the `user_type` role id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{HookContext, RecordHooks};
use crate::auth::hash_password;
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::filter::SqlResult;
use crate::middleware::{AccessScope, AuthUser};
use crate::rbac::Role;

pub const TABLE: &str = "employee";

/// Roles an OrgAdmin may see in the employee list.
const ORG_ADMIN_VISIBLE: [Role; 3] = [Role::OrgAdmin, Role::OrgExecutive, Role::OrgCaseworker];

/// The columns of an employee row that the API itself reads.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmployeeRecord {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub id_number: Option<Value>,
    #[serde(default)]
    pub user_type: Option<i64>,
    #[serde(default)]
    pub center_id: Option<i64>,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
}

impl EmployeeRecord {
    pub fn from_row(row: Value) -> Result<Self, ApiError> {
        serde_json::from_value(row).map_err(|e| {
            tracing::error!("Unexpected employee row shape: {}", e);
            ApiError::internal_server_error("Failed to read employee record")
        })
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.name.as_deref().unwrap_or(""),
            self.surname.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

pub async fn find_by_username(repo: &Repository, username: &str) -> Result<Option<EmployeeRecord>, ApiError> {
    let sql = SqlResult::with_params(
        format!("SELECT * FROM \"{}\" WHERE \"username\" = $1 LIMIT 1", TABLE),
        vec![Value::from(username)],
    );
    repo.fetch_rows(&sql)
        .await?
        .into_iter()
        .next()
        .map(EmployeeRecord::from_row)
        .transpose()
}

pub async fn username_exists(repo: &Repository, username: &str) -> Result<bool, ApiError> {
    let sql = SqlResult::with_params(
        format!("SELECT COUNT(*)::int8 AS count FROM \"{}\" WHERE \"username\" = $1", TABLE),
        vec![Value::from(username)],
    );
    Ok(repo.count(&sql).await? > 0)
}

/// Which per-employee total to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeTotal {
    /// Imam profiles linked to the employee's account
    Applicants,
    /// Community engagements recorded against those profiles
    HomeVisits,
    Skills,
}

pub fn parse_employee_id(raw_id: &str) -> Result<i64, ApiError> {
    raw_id
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request("Invalid employee ID. Must be a number."))
}

/// Resolve the employee, then count the requested rows.
pub async fn employee_total(repo: &Repository, employee_id: i64, total: EmployeeTotal) -> Result<Value, ApiError> {
    let employee = repo
        .select_by_id(employee_id, None)
        .await?
        .map(EmployeeRecord::from_row)
        .transpose()?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let username = employee
        .username
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Employee username is missing"))?;

    let sql = match total {
        EmployeeTotal::Applicants => SqlResult::with_params(
            "SELECT COUNT(*)::int8 AS count FROM imam_profiles ip \
             INNER JOIN employee e ON ip.employee_id = e.id WHERE e.username = $1",
            vec![Value::from(username)],
        ),
        EmployeeTotal::HomeVisits => SqlResult::with_params(
            "SELECT COUNT(*)::int8 AS count FROM community_engagement ce \
             INNER JOIN imam_profiles ip ON ce.imam_profile_id = ip.id \
             INNER JOIN employee e ON ip.employee_id = e.id WHERE e.username = $1",
            vec![Value::from(username)],
        ),
        EmployeeTotal::Skills => SqlResult::with_params(
            "SELECT COUNT(*)::int8 AS count FROM employee_skills WHERE employee_id = $1",
            vec![Value::from(employee_id)],
        ),
    };

    let count = repo.count(&sql).await?;
    Ok(json!({ "count": count }))
}

pub struct EmployeeHooks;

impl EmployeeHooks {
    /// Employees have no center column; plain-text passwords become hashes.
    fn prepare(fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        fields.remove("center_id");
        fields.remove("confirmPassword");
        if let Some(password) = fields.remove("password") {
            match password.as_str() {
                Some(p) if !p.is_empty() => {
                    fields.insert("password_hash".to_string(), Value::from(hash_password(p)?));
                }
                _ => return Err(ApiError::bad_request("Password must be a non-empty string")),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordHooks for EmployeeHooks {
    async fn scope_list(&self, ctx: &HookContext<'_>, where_data: &mut Map<String, Value>) -> Result<(), ApiError> {
        match ctx.access.role {
            Role::OrgAdmin => {
                let visible: Vec<i64> = ORG_ADMIN_VISIBLE.iter().map(|r| r.id()).collect();
                where_data.insert("user_type".to_string(), json!({ "$in": visible }));
            }
            Role::ImamUser => {
                where_data.insert("id".to_string(), Value::from(ctx.user.id));
            }
            _ => {}
        }
        Ok(())
    }

    fn can_view(&self, user: &AuthUser, access: &AccessScope, row: &Value) -> bool {
        match access.role {
            Role::OrgAdmin => row
                .get("user_type")
                .and_then(Value::as_i64)
                .map_or(false, |t| ORG_ADMIN_VISIBLE.iter().any(|r| r.id() == t)),
            Role::ImamUser => row.get("id").and_then(Value::as_i64) == Some(user.id),
            _ => true,
        }
    }

    async fn before_create(&self, _ctx: &HookContext<'_>, fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        Self::prepare(fields)
    }

    async fn before_update(&self, _ctx: &HookContext<'_>, _id: i64, fields: &mut Map<String, Value>) -> Result<(), ApiError> {
        Self::prepare(fields)
    }

    fn present(&self, mut row: Value) -> Value {
        if let Some(obj) = row.as_object_mut() {
            obj.remove("password_hash");
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{access_for, auth_user};

    #[test]
    fn present_hides_password_hash() {
        let row = json!({ "id": 1, "username": "bilal", "password_hash": "$2b$10$abc" });
        let shown = EmployeeHooks.present(row);
        assert!(shown.get("password_hash").is_none());
        assert_eq!(shown["username"], "bilal");
    }

    #[test]
    fn prepare_hashes_passwords_and_drops_center() {
        let mut fields = json!({ "password": "hunter22", "confirmPassword": "hunter22", "center_id": 4 })
            .as_object()
            .cloned()
            .unwrap();
        EmployeeHooks::prepare(&mut fields).unwrap();
        assert!(!fields.contains_key("password"));
        assert!(!fields.contains_key("center_id"));
        let hash = fields["password_hash"].as_str().unwrap();
        assert!(crate::auth::verify_password("hunter22", hash));
    }

    #[test]
    fn single_reads_follow_the_list_rules() {
        let staff = json!({ "id": 41, "user_type": 5 });
        let hq = json!({ "id": 42, "user_type": 2 });

        let admin = auth_user(Role::OrgAdmin, Some(3));
        let access = access_for(&admin, "/api/employee");
        assert!(EmployeeHooks.can_view(&admin, &access, &staff));
        assert!(!EmployeeHooks.can_view(&admin, &access, &hq));

        let imam = auth_user(Role::ImamUser, None);
        let access = access_for(&imam, "/api/employee");
        let own = json!({ "id": imam.id, "user_type": 6 });
        assert!(EmployeeHooks.can_view(&imam, &access, &own));
        assert!(!EmployeeHooks.can_view(&imam, &access, &staff));

        let app_admin = auth_user(Role::AppAdmin, None);
        let access = access_for(&app_admin, "/api/employee");
        assert!(EmployeeHooks.can_view(&app_admin, &access, &hq));
    }

    #[test]
    fn employee_ids_are_checked_before_any_lookup() {
        assert_eq!(parse_employee_id(" 12 ").unwrap(), 12);
        let err = parse_employee_id("abc").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid employee ID. Must be a number.");
    }

    #[test]
    fn record_reads_full_name() {
        let record = EmployeeRecord::from_row(json!({
            "id": 5, "name": "Yusuf", "surname": null, "username": "yusuf", "user_type": 6
        }))
        .unwrap();
        assert_eq!(record.full_name(), "Yusuf");
        assert_eq!(record.user_type, Some(6));
    }
}
