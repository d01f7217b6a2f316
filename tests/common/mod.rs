#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`

use petshop_api::authz::Role;
use petshop_api::config::AppConfig;
use petshop_api::events::MemoryRecorder;
use petshop_api::jwt::JwtConfig;
use petshop_api::models::business::NewBusiness;
use petshop_api::models::user::NewUser;
use petshop_api::utils::hash_password;
use petshop_api::{repos, router, AppState};

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub failures: Arc<MemoryRecorder>,
    _dir: TempDir,
}

pub async fn spawn() -> Result<TestApp> {
    spawn_with(AppConfig::default()).await
}

pub async fn spawn_with(config: AppConfig) -> Result<TestApp> {
    let dir = tempdir().context("failed to create tempdir")?;
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let failures = Arc::new(MemoryRecorder::new());
    let state = AppState::new(pool.clone(), JwtConfig::new("test-secret", 1), config)
        .with_failure_recorder(failures.clone());

    Ok(TestApp {
        app: router(state),
        pool,
        failures,
        _dir: dir,
    })
}

impl TestApp {
    pub async fn seed_business(&self, brand_name: &str, handle: &str) -> Result<i64> {
        let business = NewBusiness {
            brand_name: brand_name.to_string(),
            handle: handle.to_string(),
            contact_email: None,
            phone: None,
            custom_domain: None,
            location: None,
        };
        Ok(repos::businesses::insert(&self.pool, &business).await?.id)
    }

    pub async fn seed_user(&self, email: &str, role: Role, business_id: Option<i64>) -> Result<i64> {
        let user = NewUser {
            email: email.to_string(),
            password_hash: hash_password(PASSWORD)?,
            first_name: "Test".to_string(),
            last_name: role.to_string(),
            phone: None,
            role,
            business_id,
            status: "active".to_string(),
        };
        Ok(repos::users::insert(&self.pool, &user).await?.id)
    }

    /// Seeds an account and returns an access token for it.
    pub async fn login_as(&self, email: &str, role: Role, business_id: Option<i64>) -> Result<(i64, String)> {
        let id = self.seed_user(email, role, business_id).await?;
        let token = self.login(email).await?;
        Ok((id, token))
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let (status, body) = self
            .request("POST", "/auth/login", None, Some(json!({"email": email, "password": PASSWORD})))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("missing access_token")
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> Result<(StatusCode, Value)> {
        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request("DELETE", uri, Some(token), None).await
    }
}

pub fn id_of(value: &Value) -> i64 {
    value.get("id").and_then(Value::as_i64).unwrap_or_default()
}

pub fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .map(|items| items.iter().map(id_of).collect())
        .unwrap_or_default()
}
