use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Requester, PETS};
use crate::errors::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::ensure_non_negative;
use crate::models::pet::{Pet, PetCreateRequest, PetListQuery, PetUpdateRequest};
use crate::repos;
use crate::routes::{create_target, customer_in};

#[utoipa::path(
    get,
    path = "/pets",
    tag = "Pets",
    params(
        ("business_id" = Option<i64>, Query, description = "Support only: restrict to one business"),
        ("customer_id" = Option<i64>, Query, description = "Only pets of this customer")
    ),
    responses((status = 200, description = "Pets of the visible businesses", body = [Pet])),
    security(("bearerAuth" = []))
)]
pub async fn list_pets(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<PetListQuery>,
) -> AppResult<Json<Vec<Pet>>> {
    let scope = PETS.list_scope(&requester, query.business_id)?;
    Ok(Json(repos::pets::list(&state.pool, scope, query.customer_id).await?))
}

/// The owner must be a customer of the business the pet is created under.
/// Support without an explicit business files the pet under the owner's.
#[utoipa::path(
    post,
    path = "/pets",
    tag = "Pets",
    request_body = PetCreateRequest,
    responses(
        (status = 201, description = "Pet created", body = Pet),
        (status = 400, description = "Customer belongs to another business"),
        (status = 403, description = "Another tenant")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_pet(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<PetCreateRequest>,
) -> AppResult<(StatusCode, Json<Pet>)> {
    let owner_business = match repos::customers::get(&state.pool, payload.customer_id).await {
        Ok(customer) => Some(customer.business_id),
        Err(AppError::NotFound(_)) => None,
        Err(err) => return Err(err),
    };

    let business_id = create_target(
        &state.pool,
        &PETS,
        &requester,
        payload.business_id,
        owner_business.or(state.config.default_business_id),
    )
    .await?;

    customer_in(&state.pool, business_id, payload.customer_id).await?;
    if let Some(weight) = payload.weight {
        ensure_non_negative("weight", weight)?;
    }

    let pet = repos::pets::insert(&state.pool, business_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

#[utoipa::path(
    get,
    path = "/pets/{id}",
    tag = "Pets",
    params(("id" = i64, Path, description = "Pet id")),
    responses(
        (status = 200, description = "Pet detail", body = Pet),
        (status = 403, description = "Another tenant"),
        (status = 404, description = "Pet not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_pet(State(state): State<AppState>, requester: Requester, ApiPath(id): ApiPath<i64>) -> AppResult<Json<Pet>> {
    let pet = repos::pets::get(&state.pool, id).await?;
    PETS.check_read(&requester, Some(pet.business_id))?;
    Ok(Json(pet))
}

#[utoipa::path(
    put,
    path = "/pets/{id}",
    tag = "Pets",
    params(("id" = i64, Path, description = "Pet id")),
    request_body = PetUpdateRequest,
    responses(
        (status = 200, description = "Pet updated", body = Pet),
        (status = 400, description = "No fields to update or foreign customer"),
        (status = 403, description = "Another tenant")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_pet(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<PetUpdateRequest>,
) -> AppResult<Json<Pet>> {
    let pet = repos::pets::get(&state.pool, id).await?;
    PETS.check_mutate(&requester, Some(pet.business_id))?;

    if let Some(customer_id) = payload.customer_id {
        customer_in(&state.pool, pet.business_id, customer_id).await?;
    }
    if let Some(Some(weight)) = payload.weight {
        ensure_non_negative("weight", weight)?;
    }

    Ok(Json(repos::pets::update(&state.pool, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/pets/{id}",
    tag = "Pets",
    params(("id" = i64, Path, description = "Pet id")),
    responses((status = 204, description = "Pet deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_pet(State(state): State<AppState>, requester: Requester, ApiPath(id): ApiPath<i64>) -> AppResult<StatusCode> {
    let pet = repos::pets::get(&state.pool, id).await?;
    PETS.check_mutate(&requester, Some(pet.business_id))?;

    repos::pets::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
