use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const TYPE_REVENUE: &str = "revenue";
pub const TYPE_EXPENSE: &str = "expense";
pub const FINANCIAL_TYPES: &[&str] = &[TYPE_REVENUE, TYPE_EXPENSE];

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CANCELED: &str = "canceled";
pub const FINANCIAL_STATUSES: &[&str] = &[STATUS_PENDING, "paid", STATUS_CANCELED];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FinancialRecord {
    pub id: i64,
    pub business_id: i64,
    pub appointment_id: Option<i64>,
    pub amount: f64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub date: NaiveDate,
    pub status: String,
    pub description: Option<String>,
    /// Name of the service booked by the linked appointment, if any.
    pub service_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialRecord {
    pub fn is_canceled(&self) -> bool {
        self.status == STATUS_CANCELED
    }

    pub fn is_revenue(&self) -> bool {
        self.kind == TYPE_REVENUE
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FinancialCreateRequest {
    pub appointment_id: Option<i64>,
    #[schema(example = 50.0)]
    pub amount: f64,
    #[serde(rename = "type")]
    #[schema(example = "revenue")]
    pub kind: String,
    pub date: NaiveDate,
    pub status: Option<String>,
    pub description: Option<String>,
    pub business_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FinancialUpdateRequest {
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<i64>)]
    pub appointment_id: Option<Option<i64>>,
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Validated values for a new ledger row.
#[derive(Debug, Clone)]
pub struct NewFinancialRecord {
    pub business_id: i64,
    pub appointment_id: Option<i64>,
    pub amount: f64,
    pub kind: String,
    pub date: NaiveDate,
    pub status: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinancialListQuery {
    pub business_id: Option<i64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FinancialFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub kind: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FinancialChanges {
    pub appointment_id: Option<Option<i64>>,
    pub amount: Option<f64>,
    pub kind: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub description: Option<Option<String>>,
}

impl FinancialListQuery {
    pub fn filter(&self) -> FinancialFilter {
        FinancialFilter {
            start: self.start,
            end: self.end,
            kind: self.kind.clone(),
            status: self.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewQuery {
    pub business_id: Option<i64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}
