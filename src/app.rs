use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::database::DatabaseManager;
use crate::entities::{EntityDef, CATALOG};
use crate::handlers::{protected, public};
use crate::middleware::{access_middleware, jwt_auth_middleware, AccessOptions};
use crate::rbac::AppModule;

/// The full HTTP surface.
pub fn app() -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected
        .merge(auth_routes());

    for def in CATALOG {
        router = router.merge(entity_routes(def));
    }

    let router = router
        .layer(DefaultBodyLimit::max(config().server.max_request_size_bytes))
        .layer(cors_layer());

    if config().server.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_public_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/register", post(auth::register_post))
}

fn auth_routes() -> Router {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route_layer(from_fn_with_state(AccessOptions::module(AppModule::Auth), access_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

/// `/api/<route>` and `/api/<route>/:id` for one entity, plus any extra
/// endpoints the entity carries. Layers run JWT first, then the access gate.
fn entity_routes(def: &'static EntityDef) -> Router {
    use protected::records;

    let base = def.path();
    let mut router = Router::new()
        .route(&base, get(records::records_get).post(records::records_post))
        .route(
            &format!("{}/:id", base),
            get(records::record_get)
                .put(records::record_put)
                .patch(records::record_put)
                .delete(records::record_delete),
        );

    match def.route {
        "employee" => {
            use protected::employee;
            router = router
                .route(&format!("{}/:id/total-applicants", base), get(employee::total_applicants_get))
                .route(&format!("{}/:id/total-home-visits", base), get(employee::total_home_visits_get))
                .route(&format!("{}/:id/total-skills", base), get(employee::total_skills_get));
        }
        "imamProfiles" => {
            router = router.route(&format!("{}/my-profile", base), get(protected::imam_profile::my_profile_get));
        }
        _ => {}
    }

    router
        .with_state(def)
        .route_layer(from_fn_with_state(AccessOptions::roles(def.allowed_roles), access_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let security = &config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let entities: Vec<String> = CATALOG.iter().map(|def| def.path()).collect();

    Json(json!({
        "name": "Welfare API",
        "version": version,
        "description": "Case-management API with center scoping and role-based access control",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "public_auth": "/api/auth/login, /api/auth/register (public - token acquisition)",
            "auth": "/api/auth/whoami (protected)",
            "records": "/api/<entity>[/:id] (protected)",
            "employee_totals": "/api/employee/:id/total-applicants|total-home-visits|total-skills (protected)",
            "my_profile": "/api/imamProfiles/my-profile (protected)",
        },
        "entities": entities,
    }))
}

async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
