// handlers/protected/employee.rs - Per-employee dashboard totals

use axum::extract::Path;
use serde_json::Value;

use crate::database::repository::Repository;
use crate::entities::employee::{self, employee_total, parse_employee_id, EmployeeTotal};
use crate::middleware::{ApiResponse, ApiResult};

async fn total(raw_id: &str, total: EmployeeTotal) -> ApiResult<Value> {
    let employee_id = parse_employee_id(raw_id)?;
    let repo = Repository::connect(employee::TABLE).await?;
    Ok(ApiResponse::success(employee_total(&repo, employee_id, total).await?))
}

/// GET /api/employee/:id/total-applicants
pub async fn total_applicants_get(Path(id): Path<String>) -> ApiResult<Value> {
    total(&id, EmployeeTotal::Applicants).await
}

/// GET /api/employee/:id/total-home-visits
pub async fn total_home_visits_get(Path(id): Path<String>) -> ApiResult<Value> {
    total(&id, EmployeeTotal::HomeVisits).await
}

/// GET /api/employee/:id/total-skills
pub async fn total_skills_get(Path(id): Path<String>) -> ApiResult<Value> {
    total(&id, EmployeeTotal::Skills).await
}
