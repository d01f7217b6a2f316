use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{guard_support_only, Requester, BUSINESSES};
use crate::errors::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::business::{Business, BusinessCreateRequest, BusinessUpdateRequest, NewBusiness};
use crate::repos;
use crate::routes::TenantQuery;

#[utoipa::path(
    get,
    path = "/admin/businesses",
    tag = "Businesses",
    params(TenantQuery),
    responses((status = 200, description = "Businesses visible to the requester", body = [Business])),
    security(("bearerAuth" = []))
)]
pub async fn list_businesses(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<TenantQuery>,
) -> AppResult<Json<Vec<Business>>> {
    let scope = BUSINESSES.list_scope(&requester, query.business_id)?;
    Ok(Json(repos::businesses::list(&state.pool, scope).await?))
}

#[utoipa::path(
    post,
    path = "/admin/businesses",
    tag = "Businesses",
    request_body = BusinessCreateRequest,
    responses(
        (status = 201, description = "Business created", body = Business),
        (status = 403, description = "Only support creates businesses"),
        (status = 409, description = "Handle already in use")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_business(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<BusinessCreateRequest>,
) -> AppResult<(StatusCode, Json<Business>)> {
    BUSINESSES.check_create(&requester)?;

    let business = NewBusiness::from_request(payload)?;
    let business = repos::businesses::insert(&state.pool, &business).await?;
    tracing::info!(business_id = business.id, handle = %business.handle, "business created");
    Ok((StatusCode::CREATED, Json(business)))
}

#[utoipa::path(
    get,
    path = "/admin/businesses/{id}",
    tag = "Businesses",
    params(("id" = i64, Path, description = "Business id")),
    responses(
        (status = 200, description = "Business detail", body = Business),
        (status = 403, description = "Another tenant"),
        (status = 404, description = "Business not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_business(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Business>> {
    let business = repos::businesses::get(&state.pool, id).await?;
    BUSINESSES.check_read(&requester, Some(business.id))?;
    Ok(Json(business))
}

/// `maps_url` is recomputed from `location` and never taken from the body.
#[utoipa::path(
    put,
    path = "/admin/businesses/{id}",
    tag = "Businesses",
    params(("id" = i64, Path, description = "Business id")),
    request_body = BusinessUpdateRequest,
    responses(
        (status = 200, description = "Business updated", body = Business),
        (status = 400, description = "No fields to update"),
        (status = 403, description = "Another tenant")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_business(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<BusinessUpdateRequest>,
) -> AppResult<Json<Business>> {
    let business = repos::businesses::get(&state.pool, id).await?;
    BUSINESSES.check_mutate(&requester, Some(business.id))?;

    Ok(Json(repos::businesses::update(&state.pool, id, payload).await?))
}

/// Removes the tenant together with every row it owns.
#[utoipa::path(
    delete,
    path = "/admin/businesses/{id}",
    tag = "Businesses",
    params(("id" = i64, Path, description = "Business id")),
    responses(
        (status = 204, description = "Business deleted"),
        (status = 403, description = "Only support deletes businesses"),
        (status = 404, description = "Business not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_business(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    guard_support_only(&requester, "delete a business")?;
    repos::businesses::delete(&state.pool, id).await?;
    tracing::info!(business_id = id, deleted_by = requester.id, "business deleted");
    Ok(StatusCode::NO_CONTENT)
}
