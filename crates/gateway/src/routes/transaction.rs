//! Transaction routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use database::{transaction, NewTransaction, Transaction, TransactionStats};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::state::AppState;

/// Response to a submission.
#[derive(Serialize)]
pub struct TransactionResponse {
    pub status: &'static str,
    pub transaction: Transaction,
}

/// Submit a transaction.
///
/// Resubmitting identical content returns the stored transaction instead of
/// creating a new one. A body that is not a JSON submission is answered with
/// the same error shape as a failed validation.
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewTransaction>, JsonRejection>,
) -> Result<Json<TransactionResponse>> {
    let Json(request) = payload?;
    let submission = collector::submit(&state.db, request).await?;

    Ok(Json(TransactionResponse {
        status: "ok",
        transaction: submission.transaction,
    }))
}

/// Get a transaction by ID.
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>> {
    let tx = transaction::find_by_id(state.db.pool(), &id).await?;
    debug!(id = %tx.id, status = %tx.status, "Transaction looked up");
    Ok(Json(tx))
}

/// Transaction counts per status.
pub async fn stats(State(state): State<AppState>) -> Result<Json<TransactionStats>> {
    let stats = transaction::get_stats(state.db.pool()).await?;
    Ok(Json(stats))
}
