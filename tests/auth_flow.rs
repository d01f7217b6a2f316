mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};

use petshop_api::authz::Role;
use petshop_api::config::AppConfig;

fn registration(email: &str) -> Value {
    json!({
        "email": email,
        "password": "password123",
        "first_name": "Ana",
        "last_name": "Souza",
        "business": {"brand_name": "Acme Petshop", "handle": "acme-petshop", "location": "Rua X, 100"}
    })
}

#[tokio::test]
async fn register_with_business_creates_tenant_admin() -> Result<()> {
    let t = common::spawn().await?;

    let (status, body) = t.request("POST", "/auth/register", None, Some(registration("ana@acme.com"))).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "admin");
    let business_id = body["user"]["business_id"].as_i64().expect("business id");

    let token = body["access_token"].as_str().unwrap().to_string();
    let (status, business) = t.get(&format!("/admin/businesses/{}", business_id), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(business["handle"], "acme-petshop");
    assert_eq!(
        business["maps_url"],
        "https://maps.google.com/maps?q=Rua%20X%2C%20100&output=embed"
    );

    let (status, me) = t.get("/auth/me", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ana@acme.com");
    Ok(())
}

#[tokio::test]
async fn registration_conflicts_and_validation() -> Result<()> {
    let t = common::spawn().await?;
    t.request("POST", "/auth/register", None, Some(registration("ana@acme.com"))).await?;

    let (status, body) = t.request("POST", "/auth/register", None, Some(registration("ana@acme.com"))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // same handle, new email
    let (status, body) = t.request("POST", "/auth/register", None, Some(registration("bia@acme.com"))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "handle already in use");

    let mut short = registration("caio@acme.com");
    short["password"] = json!("short");
    let (status, _) = t.request("POST", "/auth/register", None, Some(short)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn register_without_business_needs_a_default() -> Result<()> {
    let body = json!({"email": "joe@x.com", "password": "password123", "first_name": "Joe", "last_name": "X"});

    let t = common::spawn().await?;
    let (status, _) = t.request("POST", "/auth/register", None, Some(body.clone())).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let t = common::spawn_with(AppConfig::default().with_default_business(1)).await?;
    t.seed_business("Default Shop", "default-shop").await?;
    let (status, created) = t.request("POST", "/auth/register", None, Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["user"]["role"], "user");
    assert_eq!(created["user"]["business_id"], 1);
    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_inactive_accounts() -> Result<()> {
    let t = common::spawn().await?;
    let business = t.seed_business("Acme", "acme").await?;
    let user_id = t.seed_user("staff@acme.com", Role::User, Some(business)).await?;

    let (status, body) = t
        .request("POST", "/auth/login", None, Some(json!({"email": "staff@acme.com", "password": "wrong-pass"})))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = t
        .request("POST", "/auth/login", None, Some(json!({"email": "nobody@acme.com", "password": "password123"})))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    sqlx::query("UPDATE users SET status = 'inactive' WHERE id = ?")
        .bind(user_id)
        .execute(&t.pool)
        .await?;
    let (status, _) = t
        .request("POST", "/auth/login", None, Some(json!({"email": "staff@acme.com", "password": "password123"})))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_logout_revokes() -> Result<()> {
    let t = common::spawn().await?;
    let (_, session) = t.request("POST", "/auth/register", None, Some(registration("ana@acme.com"))).await?;
    let first = session["refresh_token"].as_str().unwrap().to_string();

    let (status, rotated) = t
        .request("POST", "/auth/refresh", None, Some(json!({"refresh_token": first})))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", rotated);
    let second = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    // a spent token cannot be replayed
    let (status, _) = t
        .request("POST", "/auth/refresh", None, Some(json!({"refresh_token": first})))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let access = rotated["access_token"].as_str().unwrap();
    let (status, _) = t
        .request("POST", "/auth/logout", Some(access), Some(json!({"refresh_token": second})))
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t
        .request("POST", "/auth/refresh", None, Some(json!({"refresh_token": second})))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn missing_or_invalid_tokens_are_unauthorized() -> Result<()> {
    let t = common::spawn().await?;

    let (status, body) = t.request("GET", "/customers", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = t.get("/customers", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn deleted_subject_resolves_to_not_found() -> Result<()> {
    let t = common::spawn().await?;
    let business = t.seed_business("Acme", "acme").await?;
    let (id, token) = t.login_as("gone@acme.com", Role::Admin, Some(business)).await?;

    sqlx::query("DELETE FROM users WHERE id = ?").bind(id).execute(&t.pool).await?;

    let (status, _) = t.get("/customers", &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn profile_update_is_partial() -> Result<()> {
    let t = common::spawn().await?;
    let business = t.seed_business("Acme", "acme").await?;
    let (_, token) = t.login_as("staff@acme.com", Role::User, Some(business)).await?;

    let (status, _) = t.put("/auth/me", &token, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, me) = t.put("/auth/me", &token, json!({"phone": "11988887777"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["phone"], "11988887777");
    assert_eq!(me["first_name"], "Test");

    // role is not a profile field
    let (status, me) = t.put("/auth/me", &token, json!({"phone": null, "role": "support"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["phone"], Value::Null);
    assert_eq!(me["role"], "user");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<()> {
    let t = common::spawn().await?;

    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from("{\"email\": 42"))?;
    let (status, body) = t.send(req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = t
        .request("POST", "/auth/login", None, Some(json!({"email": "a@b.c", "password": 7})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("password"), "{}", body);
    Ok(())
}

#[tokio::test]
async fn deactivation_revokes_live_tokens() -> Result<()> {
    let t = common::spawn().await?;
    let business = t.seed_business("Acme", "acme").await?;
    let (id, token) = t.login_as("staff@acme.com", Role::User, Some(business)).await?;
    let (_, support) = t.login_as("support@petshop.dev", Role::Support, None).await?;

    let (status, _) = t.get("/customers", &token).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t
        .put(&format!("/admin/users/{}", id), &support, json!({"status": "inactive"}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = t.get("/customers", &token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "unauthorized: account is inactive");

    let (status, _) = t.post("/customers", &token, json!({"name": "Maria"})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = t.get("/auth/me", &token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .put(&format!("/admin/users/{}", id), &support, json!({"status": "active"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.get("/customers", &token).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn failed_registration_leaves_no_business_behind() -> Result<()> {
    let t = common::spawn().await?;
    sqlx::query("CREATE TRIGGER refuse_users BEFORE INSERT ON users BEGIN SELECT RAISE(ABORT, 'refused'); END")
        .execute(&t.pool)
        .await?;

    let (status, _) = t.request("POST", "/auth/register", None, Some(registration("ana@acme.com"))).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (businesses,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM businesses").fetch_one(&t.pool).await?;
    assert_eq!(businesses, 0);

    sqlx::query("DROP TRIGGER refuse_users").execute(&t.pool).await?;
    let (status, body) = t.request("POST", "/auth/register", None, Some(registration("ana@acme.com"))).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    Ok(())
}
