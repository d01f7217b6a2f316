use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Requester, Role};
use crate::errors::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::jwt::AuthUser;
use crate::models::business::NewBusiness;
use crate::models::user::{
    AuthResponse, DbUser, LoginRequest, NewUser, ProfileUpdateRequest, RefreshRequest, RegisterRequest, User,
    UserChanges,
};
use crate::repos;
use crate::utils::{generate_refresh_token, hash_password, require_text, utc_now, verify_password};

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input or no default business"),
        (status = 409, description = "Email or handle already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = normalize_email(&payload.email)?;
    let first_name = require_text("first_name", &payload.first_name)?;
    let last_name = require_text("last_name", &payload.last_name)?;
    let password_hash = hash_password(&payload.password)?;

    if repos::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::conflict("email already in use"));
    }

    // The tenant and its first account commit together so a failed user
    // insert never leaves a business holding the handle.
    let (role, business, mut tx) = match payload.business {
        Some(business) => {
            let business = NewBusiness::from_request(business)?;
            let mut tx = state.pool.begin().await?;
            let business = repos::businesses::insert_in(&mut *tx, &business).await?;
            (Role::Admin, business, tx)
        }
        None => {
            let default_id = state
                .config
                .default_business_id
                .ok_or_else(|| AppError::bad_request("business details are required to register"))?;
            let business = repos::businesses::get(&state.pool, default_id).await?;
            (Role::User, business, state.pool.begin().await?)
        }
    };

    let db_user = repos::users::insert_in(
        &mut *tx,
        &NewUser {
            email,
            password_hash,
            first_name,
            last_name,
            phone: payload.phone,
            role,
            business_id: Some(business.id),
            status: "active".to_string(),
        },
    )
    .await?;

    tx.commit().await?;
    if role == Role::Admin {
        tracing::info!(business_id = business.id, handle = %business.handle, "business registered");
    }

    let response = issue_session(&state, db_user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let db_user = repos::users::find_by_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    if !verify_password(&payload.password, &db_user.password_hash)? {
        return Err(AppError::unauthorized("invalid credentials"));
    }
    if !db_user.is_active() {
        return Err(AppError::unauthorized("account is inactive"));
    }

    Ok(Json(issue_session(&state, db_user).await?))
}

/// Trades a refresh token for a new pair. The presented token is spent.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Unknown, revoked or expired refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let stored = repos::refresh_tokens::find(&state.pool, &payload.refresh_token)
        .await?
        .filter(|token| token.is_usable(utc_now()))
        .ok_or_else(|| AppError::unauthorized("invalid refresh token"))?;

    if !repos::refresh_tokens::revoke(&state.pool, stored.id).await? {
        return Err(AppError::unauthorized("invalid refresh token"));
    }

    let db_user = repos::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .filter(DbUser::is_active)
        .ok_or_else(|| AppError::unauthorized("invalid refresh token"))?;

    Ok(Json(issue_session(&state, db_user).await?))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    request_body = RefreshRequest,
    responses((status = 204, description = "Refresh token revoked")),
    security(("bearerAuth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> AppResult<StatusCode> {
    if let Some(stored) = repos::refresh_tokens::find(&state.pool, &payload.refresh_token).await? {
        if stored.user_id == auth.user_id {
            repos::refresh_tokens::revoke(&state.pool, stored.id).await?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Current user", body = User)),
    security(("bearerAuth" = []))
)]
pub async fn me(State(state): State<AppState>, requester: Requester) -> AppResult<Json<User>> {
    let db_user = repos::users::get(&state.pool, requester.id).await?;
    Ok(Json(db_user.try_into()?))
}

/// Own profile only: role, business and status are not editable here.
#[utoipa::path(
    put,
    path = "/auth/me",
    tag = "Auth",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "No fields to update")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<ProfileUpdateRequest>,
) -> AppResult<Json<User>> {
    let changes = UserChanges {
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
        password_hash: payload.password.as_deref().map(hash_password).transpose()?,
        ..UserChanges::default()
    };

    let db_user = repos::users::update(&state.pool, requester.id, changes).await?;
    Ok(Json(db_user.try_into()?))
}

pub(crate) fn normalize_email(raw: &str) -> AppResult<String> {
    let email = require_text("email", raw)?.to_lowercase();
    if !email.contains('@') {
        return Err(AppError::bad_request("invalid email"));
    }
    Ok(email)
}

async fn issue_session(state: &AppState, db_user: DbUser) -> AppResult<AuthResponse> {
    let access_token = state.jwt.encode(db_user.id)?;
    let refresh_token = generate_refresh_token();
    repos::refresh_tokens::insert(&state.pool, db_user.id, &refresh_token, state.config.refresh_token_days).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.expires_in_secs(),
        user: db_user.try_into()?,
    })
}
