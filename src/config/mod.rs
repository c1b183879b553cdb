//! Process configuration, read once from the environment.
//!
//! `APP_ENV` picks a set of defaults; individual variables then override
//! single settings. Unparseable values are logged and ignored.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// JWT secret used when running in development without JWT_SECRET.
pub const DEVELOPMENT_JWT_SECRET: &str = "defaultsecret";

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Upper bound for `limit` on list endpoints
    pub max_limit: Option<i32>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub min_password_length: usize,
    pub enable_cors: bool,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
    pub enable_audit_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = Environment::parse(&env::var("APP_ENV").unwrap_or_default());
        let mut config = Self::defaults(environment);
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    pub fn defaults(environment: Environment) -> Self {
        use Environment::*;

        Self {
            environment,
            server: ServerConfig {
                port: 5000,
                enable_request_logging: environment != Production,
                max_request_size_bytes: match environment {
                    Development => 10 * MIB,
                    Staging => 5 * MIB,
                    Production => 2 * MIB,
                },
            },
            filter: FilterConfig {
                max_limit: Some(if environment == Development { 1000 } else { 500 }),
                debug_logging: environment == Development,
            },
            database: DatabaseConfig {
                max_connections: match environment {
                    Development => 10,
                    Staging => 20,
                    Production => 50,
                },
                connection_timeout: match environment {
                    Development => 30,
                    Staging => 10,
                    Production => 5,
                },
                enable_query_logging: environment != Production,
                slow_query_threshold_ms: match environment {
                    Development => 100,
                    Staging => 500,
                    Production => 1000,
                },
            },
            security: SecurityConfig {
                // Staging and production refuse to sign tokens until JWT_SECRET is set
                jwt_secret: match environment {
                    Development => DEVELOPMENT_JWT_SECRET.to_string(),
                    _ => String::new(),
                },
                jwt_expiry_hours: 8,
                bcrypt_cost: if environment == Production { 12 } else { 10 },
                min_password_length: 6,
                enable_cors: true,
                cors_origins: Vec::new(),
                enable_audit_logging: environment != Development,
            },
        }
    }

    /// Apply variable overrides from `lookup` (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "PORT", &mut self.server.port);
        override_parsed(&lookup, "API_ENABLE_REQUEST_LOGGING", &mut self.server.enable_request_logging);
        override_parsed(&lookup, "API_MAX_REQUEST_SIZE_BYTES", &mut self.server.max_request_size_bytes);

        if let Some(raw) = lookup("FILTER_MAX_LIMIT") {
            // Anything non-numeric (e.g. "none") lifts the cap
            self.filter.max_limit = raw.trim().parse().ok();
        }
        override_parsed(&lookup, "FILTER_DEBUG_LOGGING", &mut self.filter.debug_logging);

        override_parsed(&lookup, "DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        override_parsed(&lookup, "DATABASE_CONNECTION_TIMEOUT", &mut self.database.connection_timeout);
        override_parsed(&lookup, "DATABASE_ENABLE_QUERY_LOGGING", &mut self.database.enable_query_logging);
        override_parsed(&lookup, "DATABASE_SLOW_QUERY_THRESHOLD_MS", &mut self.database.slow_query_threshold_ms);

        if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            self.security.jwt_secret = secret;
        }
        override_parsed(&lookup, "JWT_EXPIRY_HOURS", &mut self.security.jwt_expiry_hours);
        override_parsed(&lookup, "BCRYPT_COST", &mut self.security.bcrypt_cost);
        override_parsed(&lookup, "AUTH_MIN_PASSWORD_LENGTH", &mut self.security.min_password_length);
        override_parsed(&lookup, "SECURITY_ENABLE_CORS", &mut self.security.enable_cors);
        if let Some(origins) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        override_parsed(&lookup, "SECURITY_ENABLE_AUDIT_LOGGING", &mut self.security.enable_audit_logging);
    }

    pub fn uses_development_secret(&self) -> bool {
        self.security.jwt_secret == DEVELOPMENT_JWT_SECRET
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring invalid {}={:?}", key, raw),
        }
    }
}

pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        $crate::config::CONFIG.environment == $crate::config::Environment::Development
    };
}
