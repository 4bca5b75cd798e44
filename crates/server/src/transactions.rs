//! Transactions API endpoints

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use engine::{Currency, NewTransaction, Transaction};
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};

const DEFAULT_LIMIT: u64 = 100;
const MAX_LIMIT: u64 = 500;

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    offset: u64,
    limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransactionView {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub amount_minor: i64,
    pub currency: &'static str,
    pub category: String,
    pub item: String,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionCreate {
    pub user_id: String,
    pub user_name: String,
    pub amount_minor: i64,
    pub currency: Currency,
    pub category: String,
    pub item: String,
    #[serde(default)]
    pub raw_text: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResetResponse {
    pub deleted: u64,
}

fn view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        user_id: tx.user_id,
        user_name: tx.user_name,
        amount_minor: tx.amount.minor(),
        currency: tx.currency.code(),
        category: tx.category,
        item: tx.item,
        raw_text: tx.raw_text,
        created_at: tx.created_at,
    }
}

pub(crate) async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let transactions = state.ledger.list_transactions(params.offset, limit).await?;

    Ok(Json(transactions.into_iter().map(view).collect()))
}

pub(crate) async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TransactionCreate>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let created = state
        .ledger
        .create_transaction(NewTransaction {
            user_id: payload.user_id,
            user_name: payload.user_name,
            amount_minor: payload.amount_minor,
            currency: payload.currency,
            category: payload.category,
            item: payload.item,
            raw_text: payload.raw_text,
            created_at: payload.created_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(view(created))))
}

pub(crate) async fn reset(
    State(state): State<ServerState>,
) -> Result<Json<ResetResponse>, ServerError> {
    let deleted = state.ledger.delete_all_transactions().await?;
    tracing::info!("reset removed {deleted} transactions");

    Ok(Json(ResetResponse { deleted }))
}
