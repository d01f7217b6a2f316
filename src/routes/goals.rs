use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{guard_support_only, Requester, TenantScope, GOALS};
use crate::errors::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::financial::{FinancialFilter, TYPE_REVENUE};
use crate::models::goal::{Goal, GoalChanges, GoalCreateRequest, GoalUpdateRequest, NewGoal, GOAL_STATUSES};
use crate::models::{ensure_non_negative, ensure_one_of};
use crate::reports::{goal_progress, GoalProgress};
use crate::repos;
use crate::routes::{create_target, TenantQuery};

const DEFAULT_STATUS: &str = "active";

#[utoipa::path(
    get,
    path = "/goals",
    tag = "Goals",
    params(TenantQuery),
    responses((status = 200, description = "Goals visible to the requester", body = [Goal])),
    security(("bearerAuth" = []))
)]
pub async fn list_goals(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<TenantQuery>,
) -> AppResult<Json<Vec<Goal>>> {
    let scope = GOALS.list_scope(&requester, query.business_id)?;
    Ok(Json(repos::goals::list(&state.pool, scope).await?))
}

/// Revenue booked against every visible goal inside its own period.
#[utoipa::path(
    get,
    path = "/goals/progress",
    tag = "Goals",
    params(TenantQuery),
    responses((status = 200, description = "Progress per goal", body = [GoalProgress])),
    security(("bearerAuth" = []))
)]
pub async fn progress(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<TenantQuery>,
) -> AppResult<Json<Vec<GoalProgress>>> {
    let scope = GOALS.list_scope(&requester, query.business_id)?;
    let goals = repos::goals::list(&state.pool, scope).await?;

    let mut progress = Vec::with_capacity(goals.len());
    for goal in goals {
        let goal_scope = goal.business_id.map(TenantScope::Business).unwrap_or(TenantScope::All);
        let filter = FinancialFilter {
            start: Some(goal.period_start),
            end: Some(goal.period_end),
            kind: Some(TYPE_REVENUE.to_string()),
            status: None,
        };
        let records = repos::financial::list(&state.pool, goal_scope, &filter).await?;
        progress.push(goal_progress(goal, &records));
    }

    Ok(Json(progress))
}

#[utoipa::path(
    post,
    path = "/goals",
    tag = "Goals",
    request_body = GoalCreateRequest,
    responses(
        (status = 201, description = "Goal created", body = Goal),
        (status = 400, description = "Invalid period or amount"),
        (status = 403, description = "Role may not set goals")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_goal(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<GoalCreateRequest>,
) -> AppResult<(StatusCode, Json<Goal>)> {
    let business_id = if payload.global {
        guard_support_only(&requester, "manage global goals")?;
        None
    } else {
        Some(
            create_target(
                &state.pool,
                &GOALS,
                &requester,
                payload.business_id,
                state.config.default_business_id,
            )
            .await?,
        )
    };

    ensure_non_negative("amount", payload.amount)?;
    ensure_period(payload.period_start, payload.period_end)?;
    let status = payload.status.unwrap_or_else(|| DEFAULT_STATUS.to_string());
    ensure_one_of("status", &status, GOAL_STATUSES)?;

    let goal = repos::goals::insert(
        &state.pool,
        &NewGoal {
            business_id,
            amount: payload.amount,
            period_start: payload.period_start,
            period_end: payload.period_end,
            description: payload.description,
            status,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(goal)))
}

#[utoipa::path(
    get,
    path = "/goals/{id}",
    tag = "Goals",
    params(("id" = i64, Path, description = "Goal id")),
    responses(
        (status = 200, description = "Goal detail", body = Goal),
        (status = 403, description = "Another tenant or a global goal"),
        (status = 404, description = "Goal not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_goal(State(state): State<AppState>, requester: Requester, ApiPath(id): ApiPath<i64>) -> AppResult<Json<Goal>> {
    let goal = repos::goals::get(&state.pool, id).await?;
    GOALS.check_read(&requester, goal.business_id)?;
    Ok(Json(goal))
}

#[utoipa::path(
    put,
    path = "/goals/{id}",
    tag = "Goals",
    params(("id" = i64, Path, description = "Goal id")),
    request_body = GoalUpdateRequest,
    responses(
        (status = 200, description = "Goal updated", body = Goal),
        (status = 400, description = "No fields to update or invalid period"),
        (status = 403, description = "Another tenant or a global goal")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_goal(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<GoalUpdateRequest>,
) -> AppResult<Json<Goal>> {
    let goal = repos::goals::get(&state.pool, id).await?;
    GOALS.check_mutate(&requester, goal.business_id)?;

    if let Some(amount) = payload.amount {
        ensure_non_negative("amount", amount)?;
    }
    if let Some(status) = payload.status.as_deref() {
        ensure_one_of("status", status, GOAL_STATUSES)?;
    }
    ensure_period(
        payload.period_start.unwrap_or(goal.period_start),
        payload.period_end.unwrap_or(goal.period_end),
    )?;

    let changes = GoalChanges {
        amount: payload.amount,
        period_start: payload.period_start,
        period_end: payload.period_end,
        description: payload.description,
        status: payload.status,
    };

    Ok(Json(repos::goals::update(&state.pool, id, changes).await?))
}

#[utoipa::path(
    delete,
    path = "/goals/{id}",
    tag = "Goals",
    params(("id" = i64, Path, description = "Goal id")),
    responses((status = 204, description = "Goal deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_goal(State(state): State<AppState>, requester: Requester, ApiPath(id): ApiPath<i64>) -> AppResult<StatusCode> {
    let goal = repos::goals::get(&state.pool, id).await?;
    GOALS.check_mutate(&requester, goal.business_id)?;

    repos::goals::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_period(start: chrono::NaiveDate, end: chrono::NaiveDate) -> AppResult<()> {
    if end < start {
        return Err(AppError::bad_request("period_end must not be before period_start"));
    }
    Ok(())
}
