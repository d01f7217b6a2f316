use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Requester, CUSTOMERS};
use crate::errors::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::customer::{Customer, CustomerCreateRequest, CustomerUpdateRequest, NewCustomer};
use crate::repos;
use crate::routes::{create_target, TenantQuery};
use crate::utils::require_text;

#[utoipa::path(
    get,
    path = "/customers",
    tag = "Customers",
    params(TenantQuery),
    responses((status = 200, description = "Customers of the visible businesses", body = [Customer])),
    security(("bearerAuth" = []))
)]
pub async fn list_customers(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<TenantQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    let scope = CUSTOMERS.list_scope(&requester, query.business_id)?;
    Ok(Json(repos::customers::list(&state.pool, scope).await?))
}

#[utoipa::path(
    post,
    path = "/customers",
    tag = "Customers",
    request_body = CustomerCreateRequest,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 403, description = "Another tenant")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_customer(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<CustomerCreateRequest>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let business_id = create_target(
        &state.pool,
        &CUSTOMERS,
        &requester,
        payload.business_id,
        state.config.default_business_id,
    )
    .await?;

    let customer = NewCustomer {
        name: require_text("name", &payload.name)?,
        phone: payload.phone,
        email: payload.email,
        address: payload.address,
        notes: payload.notes,
    };

    let customer = repos::customers::insert(&state.pool, business_id, &customer).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer detail", body = Customer),
        (status = 403, description = "Another tenant"),
        (status = 404, description = "Customer not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_customer(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Customer>> {
    let customer = repos::customers::get(&state.pool, id).await?;
    CUSTOMERS.check_read(&requester, Some(customer.business_id))?;
    Ok(Json(customer))
}

#[utoipa::path(
    put,
    path = "/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "Customer id")),
    request_body = CustomerUpdateRequest,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 400, description = "No fields to update"),
        (status = 403, description = "Another tenant")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_customer(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CustomerUpdateRequest>,
) -> AppResult<Json<Customer>> {
    let customer = repos::customers::get(&state.pool, id).await?;
    CUSTOMERS.check_mutate(&requester, Some(customer.business_id))?;

    Ok(Json(repos::customers::update(&state.pool, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "Customer id")),
    responses((status = 204, description = "Customer and their pets deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    let customer = repos::customers::get(&state.pool, id).await?;
    CUSTOMERS.check_mutate(&requester, Some(customer.business_id))?;

    repos::customers::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
