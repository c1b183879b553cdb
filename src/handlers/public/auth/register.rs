// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::hash_password;
use crate::config::config;
use crate::database::repository::Repository;
use crate::entities::employee::{self, EmployeeRecord};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::rbac::Role;

const USERNAME_TAKEN: &str = "Username already exists";

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

#[derive(Debug)]
struct NewAccount {
    name: String,
    surname: String,
    username: String,
    password: String,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Field checks, in the order the client sees their messages.
fn validate(request: RegisterRequest, min_password_length: usize) -> Result<NewAccount, ApiError> {
    let (name, surname, username, password, confirm) = match (
        present(request.name),
        present(request.surname),
        present(request.username),
        present(request.password),
        present(request.confirm_password),
    ) {
        (Some(n), Some(s), Some(u), Some(p), Some(c)) => (n, s, u, p, c),
        _ => return Err(ApiError::bad_request("All fields are required")),
    };

    if password != confirm {
        return Err(ApiError::bad_request("Passwords do not match"));
    }

    if password.chars().count() < min_password_length {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            min_password_length
        )));
    }

    Ok(NewAccount { name, surname, username, password })
}

/// POST /api/auth/register - self-service sign-up; new accounts are Imam Users
pub async fn register_post(payload: Result<Json<RegisterRequest>, JsonRejection>) -> ApiResult<Value> {
    let Json(request) = payload?;
    let account = validate(request, config().security.min_password_length)?;

    let repo = Repository::connect(employee::TABLE).await?;
    if employee::username_exists(&repo, &account.username).await? {
        return Err(ApiError::bad_request(USERNAME_TAKEN));
    }

    let mut fields = Map::new();
    fields.insert("name".to_string(), Value::from(account.name));
    fields.insert("surname".to_string(), Value::from(account.surname));
    fields.insert("username".to_string(), Value::from(account.username.clone()));
    fields.insert("password_hash".to_string(), Value::from(hash_password(&account.password)?));
    fields.insert("user_type".to_string(), Value::from(Role::ImamUser.id()));

    // Two concurrent sign-ups can both pass the pre-check
    let row = match repo.insert(&fields).await {
        Ok(row) => row,
        Err(e) if e.is_unique_violation() => return Err(ApiError::bad_request(USERNAME_TAKEN)),
        Err(e) => return Err(e.into()),
    };
    let user = EmployeeRecord::from_row(row)?;
    tracing::info!(target: "audit", user_id = user.id, username = %account.username, "account registered");

    Ok(ApiResponse::created(json!({
        "msg": "User registered successfully",
        "user": {
            "id": user.id,
            "name": user.name,
            "surname": user.surname,
            "username": user.username,
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Ismail".into()),
            surname: Some("Patel".into()),
            username: Some("ismail".into()),
            password: Some(password.into()),
            confirm_password: Some(confirm.into()),
        }
    }

    #[test]
    fn every_field_is_required() {
        let mut missing = request("secret1", "secret1");
        missing.surname = Some(String::new());
        let err = validate(missing, 6).unwrap_err();
        assert_eq!(err.message(), "All fields are required");

        let err = validate(RegisterRequest::default(), 6).unwrap_err();
        assert_eq!(err.message(), "All fields are required");
    }

    #[test]
    fn mismatch_is_reported_before_length() {
        let err = validate(request("abc", "abd"), 6).unwrap_err();
        assert_eq!(err.message(), "Passwords do not match");
    }

    #[test]
    fn short_passwords_use_the_configured_minimum() {
        let err = validate(request("abc", "abc"), 6).unwrap_err();
        assert_eq!(err.message(), "Password must be at least 6 characters");

        let err = validate(request("abcdefg", "abcdefg"), 8).unwrap_err();
        assert_eq!(err.message(), "Password must be at least 8 characters");
    }

    #[test]
    fn valid_requests_pass_through() {
        let account = validate(request("secret1", "secret1"), 6).unwrap();
        assert_eq!(account.username, "ismail");
        assert_eq!(account.password, "secret1");
    }
}
