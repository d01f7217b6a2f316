pub mod appointment;
pub mod booking;
pub mod business;
pub mod customer;
pub mod financial;
pub mod goal;
pub mod pet;
pub mod service;
pub mod user;

use serde::{Deserialize, Deserializer};

use crate::errors::AppError;

/// Distinguishes an omitted key (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates. Use with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn ensure_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(AppError::bad_request(format!(
        "invalid {field} `{value}`, expected one of: {}",
        allowed.join(", ")
    )))
}

pub fn ensure_non_negative(field: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(AppError::bad_request(format!("{field} must be a non-negative number")))
}
