//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::handlers::{
    BalanceHandler, BalanceQuery, DepositCommand, DepositHandler, Ledger, RegisterUserCommand,
    RegisterUserHandler, WithdrawCommand, WithdrawHandler,
};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub user_id: Uuid,
    pub new_balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResponse {
    pub user_id: Uuid,
    pub currency: String,
    pub amount: Decimal,
    pub new_balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct BalanceParams {
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub currency: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletEntry {
    pub currency: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletsResponse {
    pub user_id: Uuid,
    pub wallets: Vec<WalletEntry>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<Ledger> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/:user_id/balance", get(get_balance))
        .route("/users/:user_id/wallets", get(get_wallets))
        .route("/users/:user_id/deposit", post(deposit))
        .route("/users/:user_id/withdraw", post(withdraw))
}

/// Non-empty trimmed value, if any
fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =========================================================================
// POST /users
// =========================================================================

/// Register a new user
async fn register_user(
    State(ledger): State<Ledger>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<RegisterUserResponse>), AppError> {
    let result = RegisterUserHandler::new(ledger)
        .execute(RegisterUserCommand::new(request.email), &context)
        .await?;

    Ok((
        StatusCode::OK,
        Json(RegisterUserResponse {
            user_id: result.user_id,
            email: result.email,
            balance: result.balance,
        }),
    ))
}

// =========================================================================
// GET /users/:user_id/balance
// =========================================================================

/// Balance in one currency; the reporting currency unless `?currency=` is given
async fn get_balance(
    State(ledger): State<Ledger>,
    Extension(context): Extension<OperationContext>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<BalanceParams>,
) -> Result<Json<BalanceResponse>, AppError> {
    let currency = provided(params.currency)
        .unwrap_or_else(|| ledger.settings().reporting_currency.clone());

    let view = BalanceHandler::new(ledger)
        .execute(BalanceQuery::currency(user_id, currency.clone()), &context)
        .await?;

    Ok(Json(BalanceResponse {
        user_id,
        balance: view.balance_of(&currency),
        currency,
    }))
}

// =========================================================================
// GET /users/:user_id/wallets
// =========================================================================

/// Every wallet of the user
async fn get_wallets(
    State(ledger): State<Ledger>,
    Extension(context): Extension<OperationContext>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<WalletsResponse>, AppError> {
    let view = BalanceHandler::new(ledger)
        .execute(BalanceQuery::all(user_id), &context)
        .await?;

    Ok(Json(WalletsResponse {
        user_id: view.user_id,
        wallets: view
            .wallets
            .into_iter()
            .map(|w| WalletEntry {
                currency: w.currency,
                balance: w.balance,
            })
            .collect(),
    }))
}

// =========================================================================
// POST /users/:user_id/deposit
// =========================================================================

async fn deposit(
    State(ledger): State<Ledger>,
    Extension(context): Extension<OperationContext>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<DepositRequest>,
) -> Result<(StatusCode, Json<DepositResponse>), AppError> {
    let currency = provided(request.currency)
        .unwrap_or_else(|| ledger.settings().reporting_currency.clone());

    let result = DepositHandler::new(ledger)
        .execute(DepositCommand::new(user_id, currency, request.amount), &context)
        .await?;

    Ok((
        StatusCode::OK,
        Json(DepositResponse {
            user_id: result.user_id,
            new_balance: result.new_balance,
        }),
    ))
}

// =========================================================================
// POST /users/:user_id/withdraw
// =========================================================================

async fn withdraw(
    State(ledger): State<Ledger>,
    Extension(context): Extension<OperationContext>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<WithdrawRequest>,
) -> Result<(StatusCode, Json<WithdrawResponse>), AppError> {
    let settings = ledger.settings();
    let currency = provided(request.currency).unwrap_or_else(|| settings.reporting_currency.clone());
    let destination_address = provided(request.destination_address)
        .unwrap_or_else(|| settings.default_withdraw_address.clone());

    let command = WithdrawCommand::new(user_id, currency, request.amount, destination_address);
    let result = WithdrawHandler::new(ledger).execute(command, &context).await?;

    Ok((
        StatusCode::OK,
        Json(WithdrawResponse {
            user_id: result.user_id,
            currency: result.currency,
            amount: result.amount,
            new_balance: result.new_balance,
        }),
    ))
}
