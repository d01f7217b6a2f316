use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const GOAL_STATUSES: &[&str] = &["active", "achieved", "canceled"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Goal {
    pub id: i64,
    /// `None` for a global goal spanning every business.
    pub business_id: Option<i64>,
    pub amount: f64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GoalCreateRequest {
    #[schema(example = 10000.0)]
    pub amount: f64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub description: Option<String>,
    pub status: Option<String>,
    pub business_id: Option<i64>,
    /// Support only: create a goal that is not tied to any business.
    #[serde(default)]
    pub global: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GoalUpdateRequest {
    pub amount: Option<f64>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub business_id: Option<i64>,
    pub amount: f64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub description: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct GoalChanges {
    pub amount: Option<f64>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}
