use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;
use crate::rbac::{parse_int_like, parse_role_id, Role, RoleRef};

/// Token payload. Role information may arrive under any of the legacy claim
/// names; [`Claims::role_id`] resolves them in priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<RoleRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleRef>,
    #[serde(default, rename = "roleId", skip_serializing_if = "Option::is_none")]
    pub role_id_alt: Option<RoleRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleRef>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_id: Option<serde_json::Value>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(id: i64, username: impl Into<String>, user_type: i64, full_name: impl Into<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            id,
            username: username.into(),
            user_type: Some(RoleRef::Id(user_type)),
            role_id: None,
            role_id_alt: None,
            role: None,
            full_name: full_name.into(),
            center_id: None,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn with_center(mut self, center_id: Option<i64>) -> Self {
        self.center_id = center_id.map(serde_json::Value::from);
        self
    }

    pub fn role_id(&self) -> Option<i64> {
        parse_role_id([
            self.user_type.as_ref(),
            self.role_id.as_ref(),
            self.role_id_alt.as_ref(),
            self.role.as_ref(),
        ])
    }

    pub fn role(&self) -> Option<Role> {
        self.role_id().and_then(Role::from_id)
    }

    /// Center claim coerced to an integer; strings are parsed leniently.
    pub fn center_id(&self) -> Option<i64> {
        match self.center_id.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            serde_json::Value::String(s) => parse_int_like(s),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

fn secret() -> Result<&'static str, AuthError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, config::config().security.bcrypt_cost)?)
}

/// Malformed stored hashes count as a mismatch rather than an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        }
    }
}
