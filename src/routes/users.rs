use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{guard_business_assignment, guard_role_assignment, guard_self_delete, Requester, Role, USERS};
use crate::errors::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::ensure_one_of;
use crate::models::user::{NewUser, User, UserChanges, UserCreateRequest, UserUpdateRequest, USER_STATUSES};
use crate::repos;
use crate::routes::auth::normalize_email;
use crate::routes::{business_exists, TenantQuery};
use crate::utils::{hash_password, require_text};

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Users",
    params(TenantQuery),
    responses(
        (status = 200, description = "Accounts visible to the requester", body = [User]),
        (status = 403, description = "Role may not manage accounts")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<TenantQuery>,
) -> AppResult<Json<Vec<User>>> {
    let scope = USERS.list_scope(&requester, query.business_id)?;
    let users = repos::users::list(&state.pool, scope)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect::<Result<_, _>>()?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "Users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 403, description = "Role escalation or foreign business"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<UserCreateRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let role = payload.role.unwrap_or(Role::User);
    guard_role_assignment(&requester, role)?;

    let business_id = if role == Role::Support {
        USERS.check_create(&requester)?;
        None
    } else {
        let target = USERS.create_target(&requester, payload.business_id, state.config.default_business_id)?;
        business_exists(&state.pool, target).await?;
        Some(target)
    };

    let status = payload.status.unwrap_or_else(|| "active".to_string());
    ensure_one_of("status", &status, USER_STATUSES)?;

    let new_user = NewUser {
        email: normalize_email(&payload.email)?,
        password_hash: hash_password(&payload.password)?,
        first_name: require_text("first_name", &payload.first_name)?,
        last_name: require_text("last_name", &payload.last_name)?,
        phone: payload.phone,
        role,
        business_id,
        status,
    };

    let db_user = repos::users::insert(&state.pool, &new_user).await?;
    tracing::info!(user_id = db_user.id, role = %role, created_by = requester.id, "account created");
    Ok((StatusCode::CREATED, Json(db_user.try_into()?)))
}

/// Role and business changes keep the account invariant: support has no
/// business, everyone else has exactly one.
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Account updated", body = User),
        (status = 403, description = "Role escalation or foreign account"),
        (status = 404, description = "Account not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    if let Some(role) = payload.role {
        guard_role_assignment(&requester, role)?;
    }

    let target = repos::users::get(&state.pool, id).await?;
    USERS.check_mutate(&requester, target.business_id)?;
    guard_business_assignment(&requester, payload.business_id)?;

    let current_role: Role = target.role.parse()?;
    let role = payload.role.unwrap_or(current_role);

    let business_id = match (role, payload.business_id) {
        (Role::Support, _) if target.business_id.is_some() => Some(None),
        (Role::Support, _) => None,
        (_, Some(business_id)) => {
            business_exists(&state.pool, business_id).await?;
            Some(Some(business_id))
        }
        (_, None) if target.business_id.is_none() => {
            return Err(AppError::bad_request("business_id is required for this role"));
        }
        (_, None) => None,
    };

    if let Some(status) = payload.status.as_deref() {
        ensure_one_of("status", status, USER_STATUSES)?;
    }

    let changes = UserChanges {
        email: payload.email.as_deref().map(normalize_email).transpose()?,
        password_hash: payload.password.as_deref().map(hash_password).transpose()?,
        first_name: payload
            .first_name
            .as_deref()
            .map(|name| require_text("first_name", name))
            .transpose()?,
        last_name: payload
            .last_name
            .as_deref()
            .map(|name| require_text("last_name", name))
            .transpose()?,
        phone: payload.phone,
        role: payload.role,
        business_id,
        status: payload.status,
    };

    let db_user = repos::users::update(&state.pool, id, changes).await?;
    Ok(Json(db_user.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Own account or foreign account"),
        (status = 404, description = "Account not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    guard_self_delete(&requester, id)?;

    let target = repos::users::get(&state.pool, id).await?;
    USERS.check_mutate(&requester, target.business_id)?;

    repos::users::delete(&state.pool, id).await?;
    tracing::info!(user_id = id, deleted_by = requester.id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
