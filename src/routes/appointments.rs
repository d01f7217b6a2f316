use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;

use crate::app::AppState;
use crate::authz::{Requester, TenantScope, APPOINTMENTS};
use crate::errors::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::appointment::{
    Appointment, AppointmentChanges, AppointmentCreateRequest, AppointmentListQuery, AppointmentUpdateRequest,
    NewAppointment, APPOINTMENT_STATUSES, STATUS_SCHEDULED,
};
use crate::models::ensure_one_of;
use crate::repos;
use crate::routes::{create_target, customer_in, pet_of, service_in};
use crate::utils::normalize_time;

#[utoipa::path(
    get,
    path = "/appointments",
    tag = "Appointments",
    params(
        ("business_id" = Option<i64>, Query, description = "Support only: restrict to one business"),
        ("date_from" = Option<String>, Query, description = "First day, YYYY-MM-DD"),
        ("date_to" = Option<String>, Query, description = "Last day, YYYY-MM-DD"),
        ("status" = Option<String>, Query, description = "Appointment status")
    ),
    responses((status = 200, description = "Schedule, earliest first", body = [Appointment])),
    security(("bearerAuth" = []))
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<AppointmentListQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    let scope = APPOINTMENTS.list_scope(&requester, query.business_id)?;
    list_in(&state.pool, scope, &query).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/appointments/business/{handle}",
    tag = "Appointments",
    params(
        ("handle" = String, Path, description = "Business handle"),
        ("date_from" = Option<String>, Query, description = "First day, YYYY-MM-DD"),
        ("date_to" = Option<String>, Query, description = "Last day, YYYY-MM-DD"),
        ("status" = Option<String>, Query, description = "Appointment status")
    ),
    responses(
        (status = 200, description = "Schedule of the business", body = [Appointment]),
        (status = 403, description = "Another tenant"),
        (status = 404, description = "Unknown handle")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_business_appointments(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(handle): ApiPath<String>,
    ApiQuery(query): ApiQuery<AppointmentListQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    let business = repos::businesses::get_by_handle(&state.pool, &handle).await?;
    APPOINTMENTS.check_read(&requester, Some(business.id))?;
    list_in(&state.pool, TenantScope::Business(business.id), &query).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/appointments",
    tag = "Appointments",
    request_body = AppointmentCreateRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Customer, pet or service outside the business"),
        (status = 403, description = "Another tenant")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<AppointmentCreateRequest>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    let business_id = create_target(
        &state.pool,
        &APPOINTMENTS,
        &requester,
        payload.business_id,
        state.config.default_business_id,
    )
    .await?;

    create_in(&state.pool, business_id, payload).await
}

/// Books under the business named by the handle. For admins and users the
/// handle must be their own business.
#[utoipa::path(
    post,
    path = "/appointments/business/{handle}",
    tag = "Appointments",
    params(("handle" = String, Path, description = "Business handle")),
    request_body = AppointmentCreateRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 403, description = "Another tenant"),
        (status = 404, description = "Unknown handle")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_business_appointment(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(handle): ApiPath<String>,
    ApiJson(payload): ApiJson<AppointmentCreateRequest>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    let business = repos::businesses::get_by_handle(&state.pool, &handle).await?;
    if payload.business_id.is_some_and(|id| id != business.id) {
        return Err(AppError::bad_request("business_id does not match the handle"));
    }

    let business_id = create_target(&state.pool, &APPOINTMENTS, &requester, Some(business.id), None).await?;
    create_in(&state.pool, business_id, payload).await
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "Appointments",
    params(("id" = i64, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment detail", body = Appointment),
        (status = 403, description = "Another tenant"),
        (status = 404, description = "Appointment not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Appointment>> {
    let appointment = repos::appointments::get(&state.pool, id).await?;
    APPOINTMENTS.check_read(&requester, Some(appointment.business_id))?;
    Ok(Json(appointment))
}

/// Changing customer or pet re-checks that the pet still belongs to the
/// customer.
#[utoipa::path(
    put,
    path = "/appointments/{id}",
    tag = "Appointments",
    params(("id" = i64, Path, description = "Appointment id")),
    request_body = AppointmentUpdateRequest,
    responses(
        (status = 200, description = "Appointment updated", body = Appointment),
        (status = 400, description = "No fields to update or invalid reference"),
        (status = 403, description = "Another tenant")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AppointmentUpdateRequest>,
) -> AppResult<Json<Appointment>> {
    let current = repos::appointments::get(&state.pool, id).await?;
    APPOINTMENTS.check_mutate(&requester, Some(current.business_id))?;
    let business_id = current.business_id;

    if payload.customer_id.is_some() || payload.pet_id.is_some() {
        let customer_id = payload.customer_id.unwrap_or(current.customer_id);
        customer_in(&state.pool, business_id, customer_id).await?;
        pet_of(&state.pool, business_id, customer_id, payload.pet_id.unwrap_or(current.pet_id)).await?;
    }
    if let Some(Some(service_id)) = payload.service_id {
        service_in(&state.pool, business_id, service_id).await?;
    }
    if let Some(status) = payload.status.as_deref() {
        ensure_one_of("status", status, APPOINTMENT_STATUSES)?;
    }

    let changes = AppointmentChanges {
        customer_id: payload.customer_id,
        pet_id: payload.pet_id,
        service_id: payload.service_id,
        date: payload.date,
        time: payload.time.as_deref().map(normalize_time).transpose()?,
        notes: payload.notes,
        status: payload.status,
    };

    Ok(Json(repos::appointments::update(&state.pool, id, changes).await?))
}

#[utoipa::path(
    delete,
    path = "/appointments/{id}",
    tag = "Appointments",
    params(("id" = i64, Path, description = "Appointment id")),
    responses((status = 204, description = "Appointment deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_appointment(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    let appointment = repos::appointments::get(&state.pool, id).await?;
    APPOINTMENTS.check_mutate(&requester, Some(appointment.business_id))?;

    repos::appointments::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_in(pool: &SqlitePool, scope: TenantScope, query: &AppointmentListQuery) -> AppResult<Vec<Appointment>> {
    if let Some(status) = query.status.as_deref() {
        ensure_one_of("status", status, APPOINTMENT_STATUSES)?;
    }
    repos::appointments::list(pool, scope, query).await
}

async fn create_in(
    pool: &SqlitePool,
    business_id: i64,
    payload: AppointmentCreateRequest,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    customer_in(pool, business_id, payload.customer_id).await?;
    pet_of(pool, business_id, payload.customer_id, payload.pet_id).await?;
    if let Some(service_id) = payload.service_id {
        service_in(pool, business_id, service_id).await?;
    }

    let status = payload.status.unwrap_or_else(|| STATUS_SCHEDULED.to_string());
    ensure_one_of("status", &status, APPOINTMENT_STATUSES)?;

    let appointment = repos::appointments::insert(
        pool,
        &NewAppointment {
            business_id,
            customer_id: payload.customer_id,
            pet_id: payload.pet_id,
            service_id: payload.service_id,
            date: payload.date,
            time: normalize_time(&payload.time)?,
            notes: payload.notes,
            status,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}
