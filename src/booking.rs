//! Public booking: the only write path that runs without a session.
//!
//! The steps run one after another on the pool without a transaction. Two
//! concurrent first bookings for the same phone can both miss the lookup
//! and create duplicate customers.

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::appointment::{NewAppointment, STATUS_RECEIVED, STATUS_SCHEDULED};
use crate::models::booking::{BookingOutcome, PublicBookingRequest};
use crate::models::business::Business;
use crate::models::customer::{Customer, NewCustomer};
use crate::models::financial::{NewFinancialRecord, STATUS_PENDING, TYPE_REVENUE};
use crate::models::pet::{Pet, PetCreateRequest};
use crate::repos;
use crate::utils::{normalize_time, require_text};

/// Business named by `handle`, or the configured default when there is none.
pub async fn resolve_business(
    pool: &SqlitePool,
    handle: Option<&str>,
    default_business_id: Option<i64>,
) -> AppResult<Business> {
    match (handle, default_business_id) {
        (Some(handle), _) => repos::businesses::get_by_handle(pool, handle).await,
        (None, Some(id)) => repos::businesses::get(pool, id).await,
        (None, None) => Err(AppError::bad_request("a business handle is required")),
    }
}

pub async fn book(
    pool: &SqlitePool,
    config: &AppConfig,
    business: &Business,
    request: PublicBookingRequest,
) -> AppResult<BookingOutcome> {
    let pet_name = require_text("nomePet", &request.pet_name)?;
    let customer_name = require_text("nomeCliente", &request.customer_name)?;
    let phone = require_text("telefone", &request.phone)?;
    let time = normalize_time(&request.time)?;

    let (customer, customer_created) = find_or_create_customer(pool, business.id, &customer_name, &phone, &request).await?;
    let (pet, pet_created) = find_or_create_pet(pool, business.id, customer.id, &pet_name, &request).await?;

    let service = match request.service.as_deref().map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            let found = repos::services::find_active_by_name(pool, business.id, name).await?;
            if found.is_none() {
                tracing::info!(business_id = business.id, service = name, "booked service not found, booking without it");
            }
            found
        }
        None => None,
    };

    let status = if request.received { STATUS_RECEIVED } else { STATUS_SCHEDULED };
    let appointment = repos::appointments::insert(
        pool,
        &NewAppointment {
            business_id: business.id,
            customer_id: customer.id,
            pet_id: pet.id,
            service_id: service.as_ref().map(|s| s.id),
            date: request.date,
            time,
            notes: request.notes.clone(),
            status: status.to_string(),
        },
    )
    .await?;

    let financial_record_id = match service.as_ref() {
        Some(service) if config.public_booking_financial => {
            let record = repos::financial::insert(
                pool,
                &NewFinancialRecord {
                    business_id: business.id,
                    appointment_id: Some(appointment.id),
                    amount: service.value,
                    kind: TYPE_REVENUE.to_string(),
                    date: appointment.date,
                    status: STATUS_PENDING.to_string(),
                    description: Some(format!("{} - {}", service.name, pet.name)),
                },
            )
            .await?;
            Some(record.id)
        }
        _ => None,
    };

    tracing::info!(
        business_id = business.id,
        appointment_id = appointment.id,
        customer_created,
        pet_created,
        "public booking created"
    );

    Ok(BookingOutcome {
        customer_id: customer.id,
        pet_id: pet.id,
        customer_created,
        pet_created,
        financial_record_id,
        appointment,
    })
}

async fn find_or_create_customer(
    pool: &SqlitePool,
    business_id: i64,
    name: &str,
    phone: &str,
    request: &PublicBookingRequest,
) -> AppResult<(Customer, bool)> {
    if let Some(existing) = repos::customers::find_by_phone(pool, business_id, phone).await? {
        return Ok((existing, false));
    }

    let customer = NewCustomer {
        name: name.to_string(),
        phone: Some(phone.to_string()),
        email: request.email.clone().filter(|email| !email.trim().is_empty()),
        ..NewCustomer::default()
    };
    Ok((repos::customers::insert(pool, business_id, &customer).await?, true))
}

async fn find_or_create_pet(
    pool: &SqlitePool,
    business_id: i64,
    customer_id: i64,
    name: &str,
    request: &PublicBookingRequest,
) -> AppResult<(Pet, bool)> {
    if let Some(existing) = repos::pets::find_by_name(pool, business_id, customer_id, name).await? {
        return Ok((existing, false));
    }

    let pet = PetCreateRequest {
        customer_id,
        name: name.to_string(),
        species: request.species.clone(),
        breed: request.breed.clone(),
        size: None,
        weight: None,
        birth_date: None,
        notes: None,
        business_id: None,
    };
    Ok((repos::pets::insert(pool, business_id, &pet).await?, true))
}
