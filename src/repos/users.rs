use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::{delete_row, push_scope, Changes};
use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::models::user::{DbUser, NewUser, UserChanges};
use crate::utils::utc_now;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, phone, role, business_id, status, created_at, updated_at";

pub async fn list(pool: &SqlitePool, scope: TenantScope) -> AppResult<Vec<DbUser>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));
    push_scope(&mut qb, "business_id", scope);
    qb.push(" ORDER BY created_at DESC, id DESC");

    Ok(qb.build_query_as::<DbUser>().fetch_all(pool).await?)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<DbUser> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower(?)"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn insert(pool: &SqlitePool, user: &NewUser) -> AppResult<DbUser> {
    let mut conn = pool.acquire().await?;
    insert_in(&mut conn, user).await
}

pub async fn insert_in(conn: &mut SqliteConnection, user: &NewUser) -> AppResult<DbUser> {
    let now = utc_now();
    let id = sqlx::query(
        "INSERT INTO users (email, password_hash, first_name, last_name, phone, role, business_id, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone)
    .bind(user.role.as_str())
    .bind(user.business_id)
    .bind(&user.status)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(
        sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *conn)
            .await?,
    )
}

pub async fn update(pool: &SqlitePool, id: i64, changes: UserChanges) -> AppResult<DbUser> {
    let mut update = Changes::new("users", "user");
    update
        .set_opt("email", changes.email)
        .set_opt("password_hash", changes.password_hash)
        .set_opt("first_name", changes.first_name)
        .set_opt("last_name", changes.last_name)
        .set_opt("phone", changes.phone)
        .set_opt("role", changes.role.map(|role| role.as_str()))
        .set_opt("business_id", changes.business_id)
        .set_opt("status", changes.status);
    update.apply(pool, id).await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    delete_row(pool, "users", "user", id).await
}

pub async fn count_support(pool: &SqlitePool) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE role = 'support'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
