use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Requester, FINANCIAL};
use crate::errors::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::financial::{
    FinancialChanges, FinancialCreateRequest, FinancialFilter, FinancialListQuery, FinancialRecord,
    FinancialUpdateRequest, NewFinancialRecord, OverviewQuery, FINANCIAL_STATUSES, FINANCIAL_TYPES, STATUS_PENDING,
};
use crate::models::{ensure_non_negative, ensure_one_of};
use crate::reports::{financial_overview, FinancialOverview};
use crate::repos;
use crate::routes::{appointment_in, create_target};

#[utoipa::path(
    get,
    path = "/financial",
    tag = "Financial",
    params(
        ("business_id" = Option<i64>, Query, description = "Support only: restrict to one business"),
        ("start" = Option<String>, Query, description = "First day, YYYY-MM-DD"),
        ("end" = Option<String>, Query, description = "Last day, YYYY-MM-DD"),
        ("type" = Option<String>, Query, description = "revenue or expense"),
        ("status" = Option<String>, Query, description = "pending, paid or canceled")
    ),
    responses((status = 200, description = "Ledger rows, newest first", body = [FinancialRecord])),
    security(("bearerAuth" = []))
)]
pub async fn list_records(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<FinancialListQuery>,
) -> AppResult<Json<Vec<FinancialRecord>>> {
    let scope = FINANCIAL.list_scope(&requester, query.business_id)?;
    if let Some(kind) = query.kind.as_deref() {
        ensure_one_of("type", kind, FINANCIAL_TYPES)?;
    }
    if let Some(status) = query.status.as_deref() {
        ensure_one_of("status", status, FINANCIAL_STATUSES)?;
    }

    Ok(Json(repos::financial::list(&state.pool, scope, &query.filter()).await?))
}

#[utoipa::path(
    get,
    path = "/financial/overview",
    tag = "Financial",
    params(
        ("business_id" = Option<i64>, Query, description = "Support only: restrict to one business"),
        ("start" = Option<String>, Query, description = "First day, YYYY-MM-DD"),
        ("end" = Option<String>, Query, description = "Last day, YYYY-MM-DD")
    ),
    responses((status = 200, description = "Totals for the period", body = FinancialOverview)),
    security(("bearerAuth" = []))
)]
pub async fn overview(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<OverviewQuery>,
) -> AppResult<Json<FinancialOverview>> {
    let scope = FINANCIAL.list_scope(&requester, query.business_id)?;
    let filter = FinancialFilter {
        start: query.start,
        end: query.end,
        ..FinancialFilter::default()
    };

    let records = repos::financial::list(&state.pool, scope, &filter).await?;
    Ok(Json(financial_overview(&records, query.start, query.end)))
}

#[utoipa::path(
    post,
    path = "/financial",
    tag = "Financial",
    request_body = FinancialCreateRequest,
    responses(
        (status = 201, description = "Ledger row created", body = FinancialRecord),
        (status = 400, description = "Invalid type, status or appointment"),
        (status = 403, description = "Role may not write the ledger")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_record(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(payload): ApiJson<FinancialCreateRequest>,
) -> AppResult<(StatusCode, Json<FinancialRecord>)> {
    let business_id = create_target(
        &state.pool,
        &FINANCIAL,
        &requester,
        payload.business_id,
        state.config.default_business_id,
    )
    .await?;

    ensure_one_of("type", &payload.kind, FINANCIAL_TYPES)?;
    ensure_non_negative("amount", payload.amount)?;
    let status = payload.status.unwrap_or_else(|| STATUS_PENDING.to_string());
    ensure_one_of("status", &status, FINANCIAL_STATUSES)?;
    if let Some(appointment_id) = payload.appointment_id {
        appointment_in(&state.pool, business_id, appointment_id).await?;
    }

    let record = repos::financial::insert(
        &state.pool,
        &NewFinancialRecord {
            business_id,
            appointment_id: payload.appointment_id,
            amount: payload.amount,
            kind: payload.kind,
            date: payload.date,
            status,
            description: payload.description,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/financial/{id}",
    tag = "Financial",
    params(("id" = i64, Path, description = "Financial record id")),
    responses(
        (status = 200, description = "Ledger row", body = FinancialRecord),
        (status = 404, description = "Record not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_record(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<FinancialRecord>> {
    let record = repos::financial::get(&state.pool, id).await?;
    FINANCIAL.check_read(&requester, Some(record.business_id))?;
    Ok(Json(record))
}

#[utoipa::path(
    put,
    path = "/financial/{id}",
    tag = "Financial",
    params(("id" = i64, Path, description = "Financial record id")),
    request_body = FinancialUpdateRequest,
    responses(
        (status = 200, description = "Ledger row updated", body = FinancialRecord),
        (status = 400, description = "No fields to update or invalid value"),
        (status = 403, description = "Role may not write the ledger")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_record(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<FinancialUpdateRequest>,
) -> AppResult<Json<FinancialRecord>> {
    let record = repos::financial::get(&state.pool, id).await?;
    FINANCIAL.check_mutate(&requester, Some(record.business_id))?;

    if let Some(kind) = payload.kind.as_deref() {
        ensure_one_of("type", kind, FINANCIAL_TYPES)?;
    }
    if let Some(status) = payload.status.as_deref() {
        ensure_one_of("status", status, FINANCIAL_STATUSES)?;
    }
    if let Some(amount) = payload.amount {
        ensure_non_negative("amount", amount)?;
    }
    if let Some(Some(appointment_id)) = payload.appointment_id {
        appointment_in(&state.pool, record.business_id, appointment_id).await?;
    }

    let changes = FinancialChanges {
        appointment_id: payload.appointment_id,
        amount: payload.amount,
        kind: payload.kind,
        date: payload.date,
        status: payload.status,
        description: payload.description,
    };

    Ok(Json(repos::financial::update(&state.pool, id, changes).await?))
}

#[utoipa::path(
    delete,
    path = "/financial/{id}",
    tag = "Financial",
    params(("id" = i64, Path, description = "Financial record id")),
    responses((status = 204, description = "Ledger row deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_record(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    let record = repos::financial::get(&state.pool, id).await?;
    FINANCIAL.check_mutate(&requester, Some(record.business_id))?;

    repos::financial::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
