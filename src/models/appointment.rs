use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_RECEIVED: &str = "received";

pub const APPOINTMENT_STATUSES: &[&str] = &[
    "scheduled",
    "confirmed",
    "received",
    "in_progress",
    "completed",
    "canceled",
];

/// Appointment row joined with the display names of what it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: i64,
    pub business_id: i64,
    pub customer_id: i64,
    pub pet_id: i64,
    pub service_id: Option<i64>,
    pub date: NaiveDate,
    #[schema(example = "09:00")]
    pub time: String,
    pub notes: Option<String>,
    pub status: String,
    pub customer_name: Option<String>,
    pub pet_name: Option<String>,
    pub service_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AppointmentCreateRequest {
    pub customer_id: i64,
    pub pet_id: i64,
    pub service_id: Option<i64>,
    pub date: NaiveDate,
    #[schema(example = "09:00")]
    pub time: String,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub business_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AppointmentUpdateRequest {
    pub customer_id: Option<i64>,
    pub pet_id: Option<i64>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<i64>)]
    pub service_id: Option<Option<i64>>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
}

/// Validated values for a new appointment row.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub business_id: i64,
    pub customer_id: i64,
    pub pet_id: i64,
    pub service_id: Option<i64>,
    pub date: NaiveDate,
    pub time: String,
    pub notes: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub business_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Column values an update writes; each field is `None` when untouched.
#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub customer_id: Option<i64>,
    pub pet_id: Option<i64>,
    pub service_id: Option<Option<i64>>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
}
