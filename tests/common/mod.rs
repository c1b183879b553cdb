#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Method, Request};
use reqwest::StatusCode;
use serde_json::Value;
use tower::ServiceExt;
use welfare_api::auth::{generate_jwt, Claims};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/welfare-api");
        cmd.args(["serve", "--port", &port.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Ready once /health answers, with or without a database
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// A signed token for a caller with the given `user_type` and center.
pub fn token_for(user_type: i64, center_id: Option<i64>) -> String {
    let claims = Claims::new(40 + user_type, format!("user{}", user_type), user_type, "Test User").with_center(center_id);
    generate_jwt(&claims).expect("token")
}

/// Drive the router in-process. Requests that are rejected before any
/// handler touches the database need no server and no PostgreSQL.
pub async fn call(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(u16, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = welfare_api::app::app().oneshot(request).await?;
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, json))
}

/// Tables the database-backed tests write to. Columns cover what the
/// handlers stamp and what the assertions read.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS employee (
        id SERIAL PRIMARY KEY, name TEXT, surname TEXT, username TEXT UNIQUE,
        password_hash TEXT, user_type INT, center_id INT, created_by TEXT, updated_by TEXT)",
    "CREATE TABLE IF NOT EXISTS imam_profiles (
        id SERIAL PRIMARY KEY, employee_id INT, name TEXT, surname TEXT, status_id INT,
        created_by TEXT, updated_by TEXT)",
    "CREATE TABLE IF NOT EXISTS community_engagement (
        id SERIAL PRIMARY KEY, imam_profile_id INT, engagement_type TEXT, created_by TEXT, updated_by TEXT)",
    "CREATE TABLE IF NOT EXISTS employee_skills (
        id SERIAL PRIMARY KEY, employee_id INT, center_id INT, course TEXT, created_by TEXT, updated_by TEXT)",
    "CREATE TABLE IF NOT EXISTS home_visit (
        id SERIAL PRIMARY KEY, file_id INT, center_id INT, comments TEXT, created_by TEXT, updated_by TEXT)",
];

/// `DATABASE_URL` with the schema in place, or `None` when no database is
/// configured for this run.
pub async fn database() -> Result<Option<String>> {
    let _ = dotenvy::dotenv();
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set; skipping database test");
            return Ok(None);
        }
    };

    let pool = sqlx::PgPool::connect(&url).await.context("connect to DATABASE_URL")?;
    let mut tx = pool.begin().await?;
    // Test binaries run their tests in parallel
    sqlx::query("SELECT pg_advisory_xact_lock(804113)").execute(&mut *tx).await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    pool.close().await;

    Ok(Some(url))
}

/// A name no earlier run has used.
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!("{}_{}_{}", prefix, std::process::id(), nanos)
}

/// Send a request to the spawned server, which owns the database pool.
pub async fn http(method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(u16, Value)> {
    let server = ensure_server().await?;
    let client = reqwest::Client::new();
    let method = reqwest::Method::from_bytes(method.as_str().as_bytes())?;

    let mut request = client.request(method, format!("{}{}", server.base_url, path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    if let Some(body) = body {
        request = request.json(&body);
    }

    let res = request.send().await?;
    let status = res.status().as_u16();
    let text = res.text().await?;
    let json = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
    Ok((status, json))
}

/// Register `username` and log in, returning the new employee id and token.
pub async fn register_and_login(username: &str, password: &str) -> Result<(i64, String)> {
    let (status, body) = http(
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "name": "Test",
            "surname": "Imam",
            "username": username,
            "password": password,
            "confirmPassword": password,
        })),
    )
    .await?;
    anyhow::ensure!(status == 201, "register failed: {} {}", status, body);

    let (status, body) = http(
        Method::POST,
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await?;
    anyhow::ensure!(status == 200, "login failed: {} {}", status, body);

    let id = body["user"]["id"].as_i64().context("user id in login payload")?;
    let token = body["token"].as_str().context("token in login payload")?.to_string();
    Ok((id, token))
}
