use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::debug;

use crate::application::{AccountService, AppError};
use crate::domain::{ValidationError, parse_account_id};

use super::{
    AccountResponse, CreateAccountRequest, TransferQuery, TransferRecordResponse, TransferRequest,
};

pub type ApiResult<T> = Result<T, AppError>;

fn malformed(message: String) -> AppError {
    AppError::Validation(ValidationError::MalformedRequest(message))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /accounts
pub async fn create_account(
    State(service): State<AccountService>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let Json(req) = payload.map_err(|e| malformed(e.body_text()))?;
    debug!(account_id = req.account_id, "Create account request");

    let account = service
        .create_account(req.account_id, &req.initial_balance)
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /accounts/{id}
pub async fn get_account(
    State(service): State<AccountService>,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountResponse>> {
    let account_id = parse_account_id(&id)?;
    debug!(account_id, "Get account request");

    let account = service.get_account(account_id).await?;
    Ok(Json(account.into()))
}

/// POST /transactions
pub async fn transfer(
    State(service): State<AccountService>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = payload.map_err(|e| malformed(e.body_text()))?;
    debug!(
        source = req.source_account_id,
        destination = req.destination_account_id,
        amount = %req.amount,
        "Transfer request"
    );

    service
        .transfer(
            req.source_account_id,
            req.destination_account_id,
            &req.amount,
        )
        .await?;
    Ok(StatusCode::OK)
}

/// GET /transactions?account_id=N
pub async fn list_transfers(
    State(service): State<AccountService>,
    query: Result<Query<TransferQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TransferRecordResponse>>> {
    let Query(query) = query.map_err(|e| malformed(e.body_text()))?;
    let records = service.list_transfers(query.account_id).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Anything else
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
