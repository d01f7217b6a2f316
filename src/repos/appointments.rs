use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{delete_row, push_scope, Changes};
use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::models::appointment::{Appointment, AppointmentChanges, AppointmentListQuery, NewAppointment};
use crate::utils::utc_now;

const APPOINTMENT_SELECT: &str = "SELECT a.id, a.business_id, a.customer_id, a.pet_id, a.service_id, a.date, a.time, a.notes, a.status, \
     c.name AS customer_name, p.name AS pet_name, s.name AS service_name, a.created_at, a.updated_at \
     FROM appointments a \
     LEFT JOIN customers c ON c.id = a.customer_id \
     LEFT JOIN pets p ON p.id = a.pet_id \
     LEFT JOIN services s ON s.id = a.service_id";

/// Schedule order: earliest first.
pub async fn list(pool: &SqlitePool, scope: TenantScope, filter: &AppointmentListQuery) -> AppResult<Vec<Appointment>> {
    let mut qb = QueryBuilder::<Sqlite>::new(APPOINTMENT_SELECT);
    qb.push(" WHERE 1 = 1");
    push_scope(&mut qb, "a.business_id", scope);
    if let Some(from) = filter.date_from {
        qb.push(" AND a.date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND a.date <= ").push_bind(to);
    }
    if let Some(status) = filter.status.as_ref() {
        qb.push(" AND a.status = ").push_bind(status.clone());
    }
    qb.push(" ORDER BY a.date ASC, a.time ASC, a.id ASC");

    Ok(qb.build_query_as::<Appointment>().fetch_all(pool).await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Appointment> {
    sqlx::query_as::<_, Appointment>(&format!("{APPOINTMENT_SELECT} WHERE a.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("appointment not found"))
}

pub async fn insert(pool: &SqlitePool, appointment: &NewAppointment) -> AppResult<Appointment> {
    let now = utc_now();
    let id = sqlx::query(
        "INSERT INTO appointments (business_id, customer_id, pet_id, service_id, date, time, notes, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(appointment.business_id)
    .bind(appointment.customer_id)
    .bind(appointment.pet_id)
    .bind(appointment.service_id)
    .bind(appointment.date)
    .bind(&appointment.time)
    .bind(&appointment.notes)
    .bind(&appointment.status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, changes: AppointmentChanges) -> AppResult<Appointment> {
    let mut update = Changes::new("appointments", "appointment");
    update
        .set_opt("customer_id", changes.customer_id)
        .set_opt("pet_id", changes.pet_id)
        .set_opt("service_id", changes.service_id)
        .set_opt("date", changes.date)
        .set_opt("time", changes.time)
        .set_opt("notes", changes.notes)
        .set_opt("status", changes.status);
    update.apply(pool, id).await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    delete_row(pool, "appointments", "appointment", id).await
}
