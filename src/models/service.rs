use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Service {
    pub id: i64,
    pub business_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub value: f64,
    pub duration_minutes: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view used by the booking page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicService {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub value: f64,
    pub duration_minutes: Option<i64>,
}

impl From<Service> for PublicService {
    fn from(value: Service) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            value: value.value,
            duration_minutes: value.duration_minutes,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ServiceCreateRequest {
    #[schema(example = "Banho")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 50.0)]
    pub value: f64,
    pub duration_minutes: Option<i64>,
    pub active: Option<bool>,
    pub business_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ServiceUpdateRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<i64>)]
    pub duration_minutes: Option<Option<i64>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceListQuery {
    pub business_id: Option<i64>,
    pub active: Option<bool>,
}
