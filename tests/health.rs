use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::tempdir;
use tower::util::ServiceExt; // for `oneshot`

use petshop_api::create_app;

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("test.db");

    use sqlx::sqlite::SqliteConnectOptions;
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    // router built the way the server builds it
    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app(pool.clone()).await?;

    let req = Request::builder()
        .method("GET")
        .uri("/api/health")
        .body(Body::empty())?;

    let resp: Response = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK, "health endpoint did not return 200");

    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let v: Value = serde_json::from_slice(&body_bytes)?;
    assert_eq!(v.get("db_ok").and_then(Value::as_bool), Some(true), "got: {}", v);
    assert_eq!(v.get("status").and_then(Value::as_str), Some("ok"));
    assert!(v.get("db_error").map_or(true, Value::is_null));

    Ok(())
}

#[tokio::test]
async fn health_reports_a_closed_pool_as_degraded() -> Result<()> {
    let dir = tempdir()?;
    let pool = petshop_api::db::connect(&format!("sqlite://{}", dir.path().join("closed.db").display())).await?;
    let state = petshop_api::AppState::new(
        pool.clone(),
        petshop_api::jwt::JwtConfig::new("test-secret", 1),
        petshop_api::config::AppConfig::default(),
    );
    let app = petshop_api::router(state);
    pool.close().await;

    let resp = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let v: Value = serde_json::from_slice(&body::to_bytes(resp.into_body(), 10_485_760).await?)?;
    assert_eq!(v["status"], "degraded");
    assert_eq!(v["db_ok"], false);
    assert!(v["db_error"].is_string());
    Ok(())
}
