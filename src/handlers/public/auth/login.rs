// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::{generate_jwt, verify_password, Claims};
use crate::database::repository::Repository;
use crate::entities::employee::{self, EmployeeRecord};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// POST /api/auth/login - exchange username/password for a JWT
///
/// Unknown users and wrong passwords get the same 400 so the response does
/// not reveal which usernames exist.
pub async fn login_post(payload: Result<Json<LoginRequest>, JsonRejection>) -> ApiResult<Value> {
    let Json(request) = payload?;
    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let repo = Repository::connect(employee::TABLE).await?;
    let user = match employee::find_by_username(&repo, &username).await? {
        Some(user) => user,
        None => {
            tracing::info!(target: "audit", %username, "login rejected: unknown user");
            return Err(ApiError::bad_request(INVALID_CREDENTIALS));
        }
    };

    let hash = user.password_hash.as_deref().unwrap_or("");
    if hash.is_empty() || !verify_password(&password, hash) {
        tracing::info!(target: "audit", %username, "login rejected: bad password");
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let claims = issue_claims(&user);
    let token = generate_jwt(&claims)?;
    tracing::info!(target: "audit", user_id = user.id, %username, "login");

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": token_payload(&user),
        "userInfo": user_info(&user),
    })))
}

fn issue_claims(user: &EmployeeRecord) -> Claims {
    Claims::new(
        user.id,
        user.username.clone().unwrap_or_default(),
        user.user_type.unwrap_or_default(),
        user.full_name(),
    )
    .with_center(user.center_id)
}

/// The identity encoded in the token, echoed back to the client.
fn token_payload(user: &EmployeeRecord) -> Value {
    let mut payload = Map::new();
    payload.insert("id".to_string(), Value::from(user.id));
    payload.insert("username".to_string(), json!(user.username));
    payload.insert("user_type".to_string(), json!(user.user_type));
    payload.insert("full_name".to_string(), Value::from(user.full_name()));
    if let Some(center_id) = user.center_id {
        payload.insert("center_id".to_string(), Value::from(center_id));
    }
    Value::Object(payload)
}

fn user_info(user: &EmployeeRecord) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "surname": user.surname,
        "id_number": user.id_number,
        "user_type": user.user_type,
        "username": user.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(center: Option<i64>) -> EmployeeRecord {
        EmployeeRecord::from_row(json!({
            "id": 12,
            "username": "amina",
            "name": "Amina",
            "surname": "Khan",
            "id_number": "8001015009087",
            "user_type": 3,
            "center_id": center,
            "password_hash": "$2b$04$abc"
        }))
        .unwrap()
    }

    #[test]
    fn payload_carries_center_only_when_known() {
        let with_center = token_payload(&record(Some(4)));
        assert_eq!(with_center["center_id"], json!(4));
        assert_eq!(with_center["full_name"], json!("Amina Khan"));

        let without = token_payload(&record(None));
        assert!(without.get("center_id").is_none());
    }

    #[test]
    fn user_info_never_includes_the_hash() {
        let info = user_info(&record(None));
        assert!(info.get("password_hash").is_none());
        assert_eq!(info["id_number"], json!("8001015009087"));
    }

    #[test]
    fn claims_resolve_role_and_center() {
        let claims = issue_claims(&record(Some(9)));
        assert_eq!(claims.role_id(), Some(3));
        assert_eq!(claims.center_id(), Some(9));
        assert_eq!(claims.full_name, "Amina Khan");
    }
}
