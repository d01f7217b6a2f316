use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{delete_row, push_scope, Changes};
use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::models::financial::{FinancialChanges, FinancialFilter, FinancialRecord, NewFinancialRecord};
use crate::utils::utc_now;

const FINANCIAL_SELECT: &str = "SELECT f.id, f.business_id, f.appointment_id, f.amount, f.type, f.date, f.status, f.description, \
     s.name AS service_name, f.created_at, f.updated_at \
     FROM financial_records f \
     LEFT JOIN appointments a ON a.id = f.appointment_id \
     LEFT JOIN services s ON s.id = a.service_id";

/// Newest first: date descending, then id descending.
pub async fn list(pool: &SqlitePool, scope: TenantScope, filter: &FinancialFilter) -> AppResult<Vec<FinancialRecord>> {
    let mut qb = QueryBuilder::<Sqlite>::new(FINANCIAL_SELECT);
    qb.push(" WHERE 1 = 1");
    push_scope(&mut qb, "f.business_id", scope);
    if let Some(start) = filter.start {
        qb.push(" AND f.date >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        qb.push(" AND f.date <= ").push_bind(end);
    }
    if let Some(kind) = filter.kind.as_ref() {
        qb.push(" AND f.type = ").push_bind(kind.clone());
    }
    if let Some(status) = filter.status.as_ref() {
        qb.push(" AND f.status = ").push_bind(status.clone());
    }
    qb.push(" ORDER BY f.date DESC, f.id DESC");

    Ok(qb.build_query_as::<FinancialRecord>().fetch_all(pool).await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<FinancialRecord> {
    sqlx::query_as::<_, FinancialRecord>(&format!("{FINANCIAL_SELECT} WHERE f.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("financial record not found"))
}

pub async fn insert(pool: &SqlitePool, record: &NewFinancialRecord) -> AppResult<FinancialRecord> {
    let now = utc_now();
    let id = sqlx::query(
        "INSERT INTO financial_records (business_id, appointment_id, amount, type, date, status, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.business_id)
    .bind(record.appointment_id)
    .bind(record.amount)
    .bind(&record.kind)
    .bind(record.date)
    .bind(&record.status)
    .bind(&record.description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, changes: FinancialChanges) -> AppResult<FinancialRecord> {
    let mut update = Changes::new("financial_records", "financial record");
    update
        .set_opt("appointment_id", changes.appointment_id)
        .set_opt("amount", changes.amount)
        .set_opt("type", changes.kind)
        .set_opt("date", changes.date)
        .set_opt("status", changes.status)
        .set_opt("description", changes.description);
    update.apply(pool, id).await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    delete_row(pool, "financial_records", "financial record", id).await
}
