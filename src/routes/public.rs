use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::TenantScope;
use crate::booking;
use crate::errors::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::models::booking::{BookingOutcome, PublicBookingRequest};
use crate::models::business::BusinessPublicInfo;
use crate::models::service::PublicService;
use crate::repos;

#[utoipa::path(
    post,
    path = "/agendamentos-publicos",
    tag = "Public",
    request_body = PublicBookingRequest,
    responses(
        (status = 201, description = "Booking created in the default business", body = BookingOutcome),
        (status = 400, description = "Invalid body or no default business")
    )
)]
pub async fn book_default(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PublicBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingOutcome>)> {
    let business = booking::resolve_business(&state.pool, None, state.config.default_business_id).await?;
    let outcome = booking::book(&state.pool, &state.config, &business, payload).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/agendamentos-publicos/{handle}",
    tag = "Public",
    params(("handle" = String, Path, description = "Business handle")),
    request_body = PublicBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingOutcome),
        (status = 404, description = "Unknown handle")
    )
)]
pub async fn book_for_handle(
    State(state): State<AppState>,
    ApiPath(handle): ApiPath<String>,
    ApiJson(payload): ApiJson<PublicBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingOutcome>)> {
    let business = booking::resolve_business(&state.pool, Some(&handle), state.config.default_business_id).await?;
    let outcome = booking::book(&state.pool, &state.config, &business, payload).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[utoipa::path(
    get,
    path = "/business/{handle}/info",
    tag = "Public",
    params(("handle" = String, Path, description = "Business handle")),
    responses(
        (status = 200, description = "Public business card", body = BusinessPublicInfo),
        (status = 404, description = "Unknown handle")
    )
)]
pub async fn business_info(
    State(state): State<AppState>,
    ApiPath(handle): ApiPath<String>,
) -> AppResult<Json<BusinessPublicInfo>> {
    let business = repos::businesses::get_by_handle(&state.pool, &handle).await?;
    Ok(Json(business.into()))
}

#[utoipa::path(
    get,
    path = "/business/{handle}/services",
    tag = "Public",
    params(("handle" = String, Path, description = "Business handle")),
    responses(
        (status = 200, description = "Active services", body = [PublicService]),
        (status = 404, description = "Unknown handle")
    )
)]
pub async fn business_services(
    State(state): State<AppState>,
    ApiPath(handle): ApiPath<String>,
) -> AppResult<Json<Vec<PublicService>>> {
    let business = repos::businesses::get_by_handle(&state.pool, &handle).await?;
    let services = repos::services::list(&state.pool, TenantScope::Business(business.id), Some(true)).await?;
    Ok(Json(services.into_iter().map(PublicService::from).collect()))
}
