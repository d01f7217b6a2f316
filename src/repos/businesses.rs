use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::{delete_row, push_scope, Changes};
use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::models::business::{derived_maps_url, normalize_handle, Business, BusinessUpdateRequest, NewBusiness};
use crate::utils::{require_text, utc_now};

const BUSINESS_COLUMNS: &str =
    "id, brand_name, contact_email, phone, custom_domain, handle, location, maps_url, created_at, updated_at";

pub async fn list(pool: &SqlitePool, scope: TenantScope) -> AppResult<Vec<Business>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE 1 = 1"));
    push_scope(&mut qb, "id", scope);
    qb.push(" ORDER BY brand_name, id");

    Ok(qb.build_query_as::<Business>().fetch_all(pool).await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Business> {
    sqlx::query_as::<_, Business>(&format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("business not found"))
}

pub async fn find_by_handle(pool: &SqlitePool, handle: &str) -> AppResult<Option<Business>> {
    let business = sqlx::query_as::<_, Business>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE handle = ?"
    ))
    .bind(handle.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(business)
}

pub async fn get_by_handle(pool: &SqlitePool, handle: &str) -> AppResult<Business> {
    find_by_handle(pool, handle)
        .await?
        .ok_or_else(|| AppError::not_found(format!("business `{}` not found", handle.trim())))
}

pub async fn insert(pool: &SqlitePool, business: &NewBusiness) -> AppResult<Business> {
    let mut conn = pool.acquire().await?;
    insert_in(&mut conn, business).await
}

/// Insert on a caller-held connection so it can share a transaction.
pub async fn insert_in(conn: &mut SqliteConnection, business: &NewBusiness) -> AppResult<Business> {
    let now = utc_now();
    let maps_url = derived_maps_url(business.location.as_deref());

    let id = sqlx::query(
        "INSERT INTO businesses (brand_name, contact_email, phone, custom_domain, handle, location, maps_url, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&business.brand_name)
    .bind(&business.contact_email)
    .bind(&business.phone)
    .bind(&business.custom_domain)
    .bind(&business.handle)
    .bind(&business.location)
    .bind(&maps_url)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(
        sqlx::query_as::<_, Business>(&format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *conn)
            .await?,
    )
}

/// `maps_url` follows `location`: a new location re-derives it, clearing the
/// location clears it.
pub async fn update(pool: &SqlitePool, id: i64, patch: BusinessUpdateRequest) -> AppResult<Business> {
    let brand_name = patch.brand_name.as_deref().map(|name| require_text("brand_name", name)).transpose()?;
    let handle = patch.handle.as_deref().map(normalize_handle).transpose()?;

    let mut update = Changes::new("businesses", "business");
    update
        .set_opt("brand_name", brand_name)
        .set_opt("handle", handle)
        .set_opt("contact_email", patch.contact_email)
        .set_opt("phone", patch.phone)
        .set_opt("custom_domain", patch.custom_domain);

    if let Some(location) = patch.location {
        let location = location.map(|loc| loc.trim().to_string()).filter(|loc| !loc.is_empty());
        let maps_url = derived_maps_url(location.as_deref());
        update.set("location", location).set("maps_url", maps_url);
    }
    update.apply(pool, id).await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    delete_row(pool, "businesses", "business", id).await
}
