use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{delete_row, push_scope, Changes};
use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::models::goal::{Goal, GoalChanges, NewGoal};
use crate::utils::utc_now;

const GOAL_COLUMNS: &str =
    "id, business_id, amount, period_start, period_end, description, status, created_at, updated_at";

/// A single-business scope never includes global goals.
pub async fn list(pool: &SqlitePool, scope: TenantScope) -> AppResult<Vec<Goal>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {GOAL_COLUMNS} FROM goals WHERE 1 = 1"));
    push_scope(&mut qb, "business_id", scope);
    qb.push(" ORDER BY period_start DESC, id DESC");

    Ok(qb.build_query_as::<Goal>().fetch_all(pool).await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Goal> {
    sqlx::query_as::<_, Goal>(&format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("goal not found"))
}

pub async fn insert(pool: &SqlitePool, goal: &NewGoal) -> AppResult<Goal> {
    let now = utc_now();
    let id = sqlx::query(
        "INSERT INTO goals (business_id, amount, period_start, period_end, description, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(goal.business_id)
    .bind(goal.amount)
    .bind(goal.period_start)
    .bind(goal.period_end)
    .bind(&goal.description)
    .bind(&goal.status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, changes: GoalChanges) -> AppResult<Goal> {
    let mut update = Changes::new("goals", "goal");
    update
        .set_opt("amount", changes.amount)
        .set_opt("period_start", changes.period_start)
        .set_opt("period_end", changes.period_end)
        .set_opt("description", changes.description)
        .set_opt("status", changes.status);
    update.apply(pool, id).await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    delete_row(pool, "goals", "goal", id).await
}
