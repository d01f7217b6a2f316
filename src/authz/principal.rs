use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::SqlitePool;

use super::Role;
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;

/// The authenticated subject resolved to the one fact every authorization
/// decision depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: i64,
    pub role: Role,
    pub business_id: Option<i64>,
}

impl Requester {
    pub fn new(id: i64, role: Role, business_id: Option<i64>) -> Self {
        Self { id, role, business_id }
    }

    pub fn is_support(&self) -> bool {
        self.role == Role::Support
    }

    /// The tenant an admin/user is bound to. A non-support account without a
    /// business is a broken record and the request cannot proceed.
    pub fn tenant_id(&self) -> AppResult<i64> {
        self.business_id
            .ok_or_else(|| AppError::bad_request("requester is not linked to a business"))
    }
}

/// Loads the subject behind a token. A deactivated account loses access at
/// once, without waiting for its token to expire.
pub async fn resolve_requester(pool: &SqlitePool, user_id: i64) -> AppResult<Requester> {
    let row: Option<(i64, String, Option<i64>, String)> =
        sqlx::query_as("SELECT id, role, business_id, status FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    let (id, role, business_id, status) = row.ok_or_else(|| AppError::not_found("user not found"))?;
    if status != "active" {
        return Err(AppError::unauthorized("account is inactive"));
    }

    Ok(Requester::new(id, role.parse()?, business_id))
}

#[async_trait]
impl FromRequestParts<AppState> for Requester {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        resolve_requester(&state.pool, auth.user_id).await
    }
}
