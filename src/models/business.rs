use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::AppError;

const MAPS_EMBED_BASE: &str = "https://maps.google.com/maps?q=";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Business {
    pub id: i64,
    pub brand_name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub custom_domain: Option<String>,
    pub handle: String,
    pub location: Option<String>,
    pub maps_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the booking page may show about a business.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BusinessPublicInfo {
    pub id: i64,
    pub brand_name: String,
    pub handle: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub maps_url: Option<String>,
}

impl From<Business> for BusinessPublicInfo {
    fn from(value: Business) -> Self {
        Self {
            id: value.id,
            brand_name: value.brand_name,
            handle: value.handle,
            contact_email: value.contact_email,
            phone: value.phone,
            location: value.location,
            maps_url: value.maps_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BusinessCreateRequest {
    #[schema(example = "Acme Petshop")]
    pub brand_name: String,
    #[schema(example = "acme-petshop")]
    pub handle: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub custom_domain: Option<String>,
    #[schema(example = "Rua X, 100")]
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BusinessUpdateRequest {
    pub brand_name: Option<String>,
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub contact_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub custom_domain: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
}

/// Validated values for a new tenant.
#[derive(Debug, Clone)]
pub struct NewBusiness {
    pub brand_name: String,
    pub handle: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub custom_domain: Option<String>,
    pub location: Option<String>,
}

impl NewBusiness {
    pub fn from_request(request: BusinessCreateRequest) -> Result<Self, AppError> {
        Ok(Self {
            brand_name: crate::utils::require_text("brand_name", &request.brand_name)?,
            handle: normalize_handle(&request.handle)?,
            contact_email: request.contact_email,
            phone: request.phone,
            custom_domain: request.custom_domain,
            location: request.location.map(|loc| loc.trim().to_string()).filter(|loc| !loc.is_empty()),
        })
    }
}

/// Embed URL shown on the booking page, derived from the free-text location.
pub fn maps_embed_url(location: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(location.as_bytes()).collect();
    // form encoding writes spaces as '+'; a literal '+' is already escaped as %2B
    format!("{}{}&output=embed", MAPS_EMBED_BASE, encoded.replace('+', "%20"))
}

pub fn derived_maps_url(location: Option<&str>) -> Option<String> {
    location
        .map(str::trim)
        .filter(|loc| !loc.is_empty())
        .map(maps_embed_url)
}

/// Handles are lowercase slugs: letters, digits and single dashes.
pub fn normalize_handle(raw: &str) -> Result<String, AppError> {
    let handle = raw.trim().to_lowercase();
    let valid = !handle.is_empty()
        && handle.len() <= 64
        && handle.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !handle.starts_with('-')
        && !handle.ends_with('-')
        && !handle.contains("--");

    if !valid {
        return Err(AppError::bad_request(format!(
            "invalid handle `{}`: use lowercase letters, digits and dashes",
            raw.trim()
        )));
    }
    Ok(handle)
}
