//! HTTP handlers. Each one resolves the requester, asks the resource policy,
//! then talks to the repositories.

pub mod appointments;
pub mod auth;
pub mod businesses;
pub mod customers;
pub mod financial;
pub mod goals;
pub mod health;
pub mod pets;
pub mod public;
pub mod services;
pub mod users;

use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::IntoParams;

use crate::authz::{Requester, ResourcePolicy};
use crate::errors::{AppError, AppResult};
use crate::models::appointment::Appointment;
use crate::models::customer::Customer;
use crate::models::pet::Pet;
use crate::models::service::Service;
use crate::repos;

/// `?business_id=` narrows support listings; other roles are pinned to their
/// own business.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TenantQuery {
    pub business_id: Option<i64>,
}

/// Business a new row goes under, after the policy check. A support-chosen
/// business must exist.
pub(crate) async fn create_target(
    pool: &SqlitePool,
    policy: &ResourcePolicy,
    requester: &Requester,
    explicit: Option<i64>,
    fallback: Option<i64>,
) -> AppResult<i64> {
    let target = policy.create_target(requester, explicit, fallback)?;
    if requester.is_support() {
        business_exists(pool, target).await?;
    }
    Ok(target)
}

pub(crate) async fn business_exists(pool: &SqlitePool, business_id: i64) -> AppResult<()> {
    match repos::businesses::get(pool, business_id).await {
        Ok(_) => Ok(()),
        Err(AppError::NotFound(_)) => Err(AppError::bad_request(format!("business {business_id} does not exist"))),
        Err(err) => Err(err),
    }
}

// Referenced rows must live in the same business as the row pointing at them.
// A missing reference and a foreign one are both a 400.

pub(crate) async fn customer_in(pool: &SqlitePool, business_id: i64, customer_id: i64) -> AppResult<Customer> {
    match repos::customers::get(pool, customer_id).await {
        Ok(customer) if customer.business_id == business_id => Ok(customer),
        Ok(_) | Err(AppError::NotFound(_)) => Err(AppError::bad_request(format!(
            "customer {customer_id} does not belong to this business"
        ))),
        Err(err) => Err(err),
    }
}

pub(crate) async fn pet_of(pool: &SqlitePool, business_id: i64, customer_id: i64, pet_id: i64) -> AppResult<Pet> {
    match repos::pets::get(pool, pet_id).await {
        Ok(pet) if pet.business_id == business_id && pet.customer_id == customer_id => Ok(pet),
        Ok(_) | Err(AppError::NotFound(_)) => Err(AppError::bad_request(format!(
            "pet {pet_id} does not belong to customer {customer_id}"
        ))),
        Err(err) => Err(err),
    }
}

pub(crate) async fn service_in(pool: &SqlitePool, business_id: i64, service_id: i64) -> AppResult<Service> {
    match repos::services::get(pool, service_id).await {
        Ok(service) if service.business_id == business_id => Ok(service),
        Ok(_) | Err(AppError::NotFound(_)) => Err(AppError::bad_request(format!(
            "service {service_id} does not belong to this business"
        ))),
        Err(err) => Err(err),
    }
}

pub(crate) async fn appointment_in(pool: &SqlitePool, business_id: i64, appointment_id: i64) -> AppResult<Appointment> {
    match repos::appointments::get(pool, appointment_id).await {
        Ok(appointment) if appointment.business_id == business_id => Ok(appointment),
        Ok(_) | Err(AppError::NotFound(_)) => Err(AppError::bad_request(format!(
            "appointment {appointment_id} does not belong to this business"
        ))),
        Err(err) => Err(err),
    }
}
