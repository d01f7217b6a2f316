use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{delete_row, push_scope, Changes};
use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::models::service::{Service, ServiceCreateRequest, ServiceUpdateRequest};
use crate::utils::{require_text, utc_now};

const SERVICE_COLUMNS: &str =
    "id, business_id, name, description, value, duration_minutes, active, created_at, updated_at";

pub async fn list(pool: &SqlitePool, scope: TenantScope, active: Option<bool>) -> AppResult<Vec<Service>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {SERVICE_COLUMNS} FROM services WHERE 1 = 1"));
    push_scope(&mut qb, "business_id", scope);
    if let Some(active) = active {
        qb.push(" AND active = ").push_bind(active);
    }
    qb.push(" ORDER BY name COLLATE NOCASE, id");

    Ok(qb.build_query_as::<Service>().fetch_all(pool).await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Service> {
    sqlx::query_as::<_, Service>(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("service not found"))
}

/// Case-insensitive lookup among the business's active services.
pub async fn find_active_by_name(pool: &SqlitePool, business_id: i64, name: &str) -> AppResult<Option<Service>> {
    let service = sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE business_id = ? AND active = 1 AND lower(name) = lower(?) ORDER BY id LIMIT 1"
    ))
    .bind(business_id)
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;
    Ok(service)
}

pub async fn insert(pool: &SqlitePool, business_id: i64, service: &ServiceCreateRequest) -> AppResult<Service> {
    let name = require_text("name", &service.name)?;
    let now = utc_now();

    let id = sqlx::query(
        "INSERT INTO services (business_id, name, description, value, duration_minutes, active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(business_id)
    .bind(name)
    .bind(&service.description)
    .bind(service.value)
    .bind(service.duration_minutes)
    .bind(service.active.unwrap_or(true))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, patch: ServiceUpdateRequest) -> AppResult<Service> {
    let name = patch.name.as_deref().map(|name| require_text("name", name)).transpose()?;

    let mut update = Changes::new("services", "service");
    update
        .set_opt("name", name)
        .set_opt("description", patch.description)
        .set_opt("value", patch.value)
        .set_opt("duration_minutes", patch.duration_minutes)
        .set_opt("active", patch.active);
    update.apply(pool, id).await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    delete_row(pool, "services", "service", id).await
}
