use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Pet {
    pub id: i64,
    pub business_id: i64,
    pub customer_id: i64,
    pub name: String,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub size: Option<String>,
    pub weight: Option<f64>,
    pub birth_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PetCreateRequest {
    pub customer_id: i64,
    #[schema(example = "Rex")]
    pub name: String,
    #[schema(example = "dog")]
    pub species: Option<String>,
    pub breed: Option<String>,
    pub size: Option<String>,
    pub weight: Option<f64>,
    pub birth_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub business_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PetUpdateRequest {
    pub customer_id: Option<i64>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub species: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub breed: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<f64>)]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetListQuery {
    pub business_id: Option<i64>,
    pub customer_id: Option<i64>,
}
