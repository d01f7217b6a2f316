//! Read-side folds over rows a handler has already scoped to a tenant.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::financial::{FinancialRecord, STATUS_CANCELED};
use crate::models::goal::Goal;

/// How many records the overview lists.
pub const RECENT_LIMIT: usize = 50;

const NO_SERVICE: &str = "no service";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusTotals {
    pub status: String,
    pub revenue: f64,
    pub expenses: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ServiceRevenue {
    pub service: String,
    pub revenue: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FinancialOverview {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub net: f64,
    pub by_status: Vec<StatusTotals>,
    pub by_service: Vec<ServiceRevenue>,
    pub record_count: usize,
    pub canceled_count: usize,
    /// Newest first, canceled rows included.
    pub recent: Vec<FinancialRecord>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoalProgress {
    pub goal: Goal,
    pub achieved_amount: f64,
    pub remaining: f64,
    /// Capped at 100 for display.
    pub percent: f64,
    pub achieved: bool,
}

/// Canceled rows are left out of every sum and bucket but still counted
/// and listed.
pub fn financial_overview(
    records: &[FinancialRecord],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> FinancialOverview {
    let mut total_revenue = 0.0;
    let mut total_expenses = 0.0;
    let mut canceled_count = 0;
    let mut by_status: BTreeMap<&str, StatusTotals> = BTreeMap::new();
    let mut by_service: BTreeMap<&str, ServiceRevenue> = BTreeMap::new();

    for record in records {
        if record.is_canceled() {
            canceled_count += 1;
            continue;
        }

        let bucket = by_status.entry(record.status.as_str()).or_insert_with(|| StatusTotals {
            status: record.status.clone(),
            revenue: 0.0,
            expenses: 0.0,
            count: 0,
        });
        bucket.count += 1;

        if record.is_revenue() {
            total_revenue += record.amount;
            bucket.revenue += record.amount;

            let service = record.service_name.as_deref().unwrap_or(NO_SERVICE);
            let entry = by_service.entry(service).or_insert_with(|| ServiceRevenue {
                service: service.to_string(),
                revenue: 0.0,
                count: 0,
            });
            entry.revenue += record.amount;
            entry.count += 1;
        } else {
            total_expenses += record.amount;
            bucket.expenses += record.amount;
        }
    }

    let mut recent: Vec<FinancialRecord> = records.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    recent.truncate(RECENT_LIMIT);

    let mut by_service: Vec<ServiceRevenue> = by_service
        .into_values()
        .map(|mut entry| {
            entry.revenue = round_cents(entry.revenue);
            entry
        })
        .collect();
    by_service.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.service.cmp(&b.service)));

    FinancialOverview {
        start,
        end,
        total_revenue: round_cents(total_revenue),
        total_expenses: round_cents(total_expenses),
        net: round_cents(total_revenue - total_expenses),
        by_status: by_status
            .into_values()
            .map(|mut bucket| {
                bucket.revenue = round_cents(bucket.revenue);
                bucket.expenses = round_cents(bucket.expenses);
                bucket
            })
            .collect(),
        by_service,
        record_count: records.len(),
        canceled_count,
        recent,
    }
}

/// Progress of `goal` given the revenue rows of its business (or of every
/// business for a global goal). Rows outside the goal period are ignored.
pub fn goal_progress(goal: Goal, records: &[FinancialRecord]) -> GoalProgress {
    let achieved_amount: f64 = records
        .iter()
        .filter(|r| r.is_revenue() && r.status != STATUS_CANCELED)
        .filter(|r| r.date >= goal.period_start && r.date <= goal.period_end)
        .filter(|r| goal.business_id.map_or(true, |id| r.business_id == id))
        .map(|r| r.amount)
        .sum();

    let achieved_amount = round_cents(achieved_amount);
    let remaining = round_cents((goal.amount - achieved_amount).max(0.0));
    let percent = if goal.amount > 0.0 {
        round_cents((achieved_amount / goal.amount * 100.0).min(100.0))
    } else {
        100.0
    };

    GoalProgress {
        achieved: achieved_amount >= goal.amount,
        achieved_amount,
        remaining,
        percent,
        goal,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
