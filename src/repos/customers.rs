use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{delete_row, push_scope, Changes};
use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::models::customer::{Customer, CustomerUpdateRequest, NewCustomer};
use crate::utils::{require_text, utc_now};

const CUSTOMER_COLUMNS: &str = "id, business_id, name, phone, email, address, notes, created_at, updated_at";

pub async fn list(pool: &SqlitePool, scope: TenantScope) -> AppResult<Vec<Customer>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE 1 = 1"));
    push_scope(&mut qb, "business_id", scope);
    qb.push(" ORDER BY created_at DESC, id DESC");

    Ok(qb.build_query_as::<Customer>().fetch_all(pool).await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Customer> {
    sqlx::query_as::<_, Customer>(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("customer not found"))
}

/// Natural key used by public booking.
pub async fn find_by_phone(pool: &SqlitePool, business_id: i64, phone: &str) -> AppResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE business_id = ? AND phone = ? ORDER BY id LIMIT 1"
    ))
    .bind(business_id)
    .bind(phone)
    .fetch_optional(pool)
    .await?;
    Ok(customer)
}

pub async fn insert(pool: &SqlitePool, business_id: i64, customer: &NewCustomer) -> AppResult<Customer> {
    let now = utc_now();
    let id = sqlx::query(
        "INSERT INTO customers (business_id, name, phone, email, address, notes, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(business_id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.email)
    .bind(&customer.address)
    .bind(&customer.notes)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, patch: CustomerUpdateRequest) -> AppResult<Customer> {
    let name = patch.name.as_deref().map(|name| require_text("name", name)).transpose()?;

    let mut update = Changes::new("customers", "customer");
    update
        .set_opt("name", name)
        .set_opt("phone", patch.phone)
        .set_opt("email", patch.email)
        .set_opt("address", patch.address)
        .set_opt("notes", patch.notes);
    update.apply(pool, id).await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    delete_row(pool, "customers", "customer", id).await
}
