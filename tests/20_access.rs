mod common;

use anyhow::Result;
use axum::http::Method;
use serde_json::json;
use welfare_api::auth::{generate_jwt, Claims};

use common::{call, token_for};

#[tokio::test]
async fn missing_token_is_rejected() -> Result<()> {
    let (status, body) = call(Method::GET, "/api/tickets", None, None).await?;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "No token, authorization denied");
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn garbage_and_expired_tokens_are_rejected() -> Result<()> {
    let (status, body) = call(Method::GET, "/api/tickets", Some("not.a.token"), None).await?;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Token is not valid");

    let mut claims = Claims::new(7, "old", 1, "Old Token");
    claims.exp = chrono::Utc::now().timestamp() - 3600;
    let expired = generate_jwt(&claims)?;
    let (status, _) = call(Method::GET, "/api/tickets", Some(&expired), None).await?;
    assert_eq!(status, 401);
    Ok(())
}

#[tokio::test]
async fn unknown_role_is_forbidden() -> Result<()> {
    let token = token_for(42, Some(1));
    let (status, body) = call(Method::GET, "/api/tickets", Some(&token), None).await?;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Forbidden: unknown or missing role");
    Ok(())
}

#[tokio::test]
async fn imam_users_cannot_reach_policies() -> Result<()> {
    let token = token_for(6, None);
    let (status, body) = call(Method::GET, "/api/policyAndProcedure", Some(&token), None).await?;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Forbidden: module access denied by RBAC rules");
    Ok(())
}

#[tokio::test]
async fn executives_are_read_only() -> Result<()> {
    let token = token_for(4, Some(3));
    let (status, body) = call(Method::POST, "/api/employee", Some(&token), Some(json!({ "name": "x" }))).await?;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Forbidden: HTTP method not allowed for this role");
    Ok(())
}

#[tokio::test]
async fn org_admins_cannot_edit_policies() -> Result<()> {
    let token = token_for(3, Some(3));
    let (status, _) =
        call(Method::PUT, "/api/policyAndProcedure/5", Some(&token), Some(json!({ "title": "x" }))).await?;
    assert_eq!(status, 403);
    Ok(())
}

#[tokio::test]
async fn email_templates_are_app_admin_only() -> Result<()> {
    let token = token_for(2, None);
    let (status, body) = call(Method::GET, "/api/emailTemplates", Some(&token), None).await?;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Forbidden: role not permitted for this resource");
    Ok(())
}

#[tokio::test]
async fn non_numeric_ids_are_bad_requests() -> Result<()> {
    let token = token_for(1, None);
    let (status, body) = call(Method::GET, "/api/tickets/abc", Some(&token), None).await?;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn whoami_reports_the_resolved_scope() -> Result<()> {
    let token = token_for(5, Some(8));
    let (status, body) = call(Method::GET, "/api/auth/whoami", Some(&token), None).await?;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["user_type"], 5);
    assert_eq!(body["user"]["center_id"], 8);
    assert_eq!(body["access"]["module"], "auth");
    assert_eq!(body["access"]["enforce_center_filter"], true);
    assert_eq!(body["access"]["report_scope"], "own");
    assert_eq!(body["access"]["is_global_admin"], false);
    Ok(())
}

#[tokio::test]
async fn employee_totals_reject_bad_ids_without_a_database() -> Result<()> {
    let token = token_for(3, Some(4));
    let (status, body) = call(Method::GET, "/api/employee/abc/total-applicants", Some(&token), None).await?;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Invalid employee ID. Must be a number.");
    Ok(())
}
