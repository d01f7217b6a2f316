use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Requester, SERVICES};
use crate::errors::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::ensure_non_negative;
use crate::models::service::{Service, ServiceCreateRequest, ServiceListQuery, ServiceUpdateRequest};
use crate::repos;
use crate::routes::create_target;

#[utoipa::path(
    get,
    path = "/services",
    tag = "Services",
    params(
        ("business_id" = Option<i64>, Query, description = "Support only: restrict to one business"),
        ("active" = Option<bool>, Query, description = "Filter on the active flag")
    ),
    responses((status = 200, description = "Services ordered by name", body = [Service])),
    security(("bearerAuth" = []))
)]
pub async fn list_services(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<ServiceListQuery>,
) -> AppResult<Json<Vec<Service>>> {
    let scope = SERVICES.list_scope(&requester, query.business_id)?;
    Ok(Json(repos::services::list(&state.pool, scope, query.active).await?))
}

#[utoipa::path(
    post,
    path = "/services",
    tag = "Services",
    request_body = ServiceCreateRequest,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 403, description = "Role may not manage services")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_service(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<ServiceCreateRequest>,
) -> AppResult<(StatusCode, Json<Service>)> {
    let business_id = create_target(
        &state.pool,
        &SERVICES,
        &requester,
        payload.business_id,
        state.config.default_business_id,
    )
    .await?;

    ensure_non_negative("value", payload.value)?;
    validate_duration(payload.duration_minutes)?;

    let service = repos::services::insert(&state.pool, business_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    get,
    path = "/services/{id}",
    tag = "Services",
    params(("id" = i64, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service detail", body = Service),
        (status = 404, description = "Service not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_service(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Service>> {
    let service = repos::services::get(&state.pool, id).await?;
    SERVICES.check_read(&requester, Some(service.business_id))?;
    Ok(Json(service))
}

#[utoipa::path(
    put,
    path = "/services/{id}",
    tag = "Services",
    params(("id" = i64, Path, description = "Service id")),
    request_body = ServiceUpdateRequest,
    responses(
        (status = 200, description = "Service updated", body = Service),
        (status = 400, description = "No fields to update"),
        (status = 403, description = "Role may not manage services")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_service(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ServiceUpdateRequest>,
) -> AppResult<Json<Service>> {
    let service = repos::services::get(&state.pool, id).await?;
    SERVICES.check_mutate(&requester, Some(service.business_id))?;

    if let Some(value) = payload.value {
        ensure_non_negative("value", value)?;
    }
    validate_duration(payload.duration_minutes.flatten())?;

    Ok(Json(repos::services::update(&state.pool, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/services/{id}",
    tag = "Services",
    params(("id" = i64, Path, description = "Service id")),
    responses((status = 204, description = "Service deleted, appointments keep no service")),
    security(("bearerAuth" = []))
)]
pub async fn delete_service(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    let service = repos::services::get(&state.pool, id).await?;
    SERVICES.check_mutate(&requester, Some(service.business_id))?;

    repos::services::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_duration(minutes: Option<i64>) -> AppResult<()> {
    match minutes {
        Some(minutes) if minutes < 0 => Err(AppError::bad_request("duration_minutes must not be negative")),
        _ => Ok(()),
    }
}
