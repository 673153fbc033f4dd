//! Transaction store operations.
//!
//! Every state change is a single SQL statement, so SQLite's write lock makes
//! each one atomic. [`claim_one`] relies on this: the `status = 'received'`
//! guard and the update happen in the same statement, so two concurrent
//! callers can never both receive the same row.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{Transaction, TransactionStats, TransactionStatus};

/// Store a new transaction.
pub async fn insert(pool: &SqlitePool, tx: &Transaction) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions
            (id, status, receiver, message, sender, tags, tactic, attempts, priority, timeout, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&tx.id)
    .bind(tx.status)
    .bind(&tx.receiver)
    .bind(&tx.message)
    .bind(&tx.sender)
    .bind(&tx.tags)
    .bind(tx.tactic)
    .bind(tx.attempts)
    .bind(tx.priority)
    .bind(tx.timeout)
    .bind(tx.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Transaction",
                    id: tx.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Find a transaction with exactly the same receiver, message, sender and tags.
pub async fn find_duplicate(
    pool: &SqlitePool,
    receiver: &str,
    message: &str,
    sender: &str,
    tags: &str,
) -> Result<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, status, receiver, message, sender, tags, tactic, attempts, priority, timeout, created_at
        FROM transactions
        WHERE receiver = ? AND message = ? AND sender = ? AND tags = ?
        LIMIT 1
        "#,
    )
    .bind(receiver)
    .bind(message)
    .bind(sender)
    .bind(tags)
    .fetch_optional(pool)
    .await?;

    Ok(tx)
}

/// Get a transaction by ID.
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, status, receiver, message, sender, tags, tactic, attempts, priority, timeout, created_at
        FROM transactions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Transaction",
        id: id.to_string(),
    })
}

/// Count transactions waiting to be claimed.
pub async fn count_pending(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM transactions
        WHERE status = 'received'
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Claim one received transaction.
///
/// Moves an arbitrary `received` row to `queued` with `timeout = now + ttl_secs`
/// and returns it as updated. Returns `None` when nothing is pending or another
/// caller won the race for the last row.
pub async fn claim_one(pool: &SqlitePool, ttl_secs: i64) -> Result<Option<Transaction>> {
    let timeout = chrono::Utc::now().timestamp() + ttl_secs;

    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = 'queued', timeout = ?
        WHERE id = (
            SELECT id FROM transactions WHERE status = 'received' LIMIT 1
        )
        AND status = 'received'
        RETURNING id, status, receiver, message, sender, tags, tactic, attempts, priority, timeout, created_at
        "#,
    )
    .bind(timeout)
    .fetch_optional(pool)
    .await?;

    if let Some(ref tx) = tx {
        debug!(id = %tx.id, timeout, "Claimed transaction");
    }

    Ok(tx)
}

/// Set the status of a transaction.
///
/// Does nothing if the id is unknown. Leaving `queued` clears the claim timeout.
pub async fn update_status(pool: &SqlitePool, id: &str, status: TransactionStatus) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE transactions
        SET status = ?,
            timeout = CASE WHEN ? = 'queued' THEN timeout ELSE NULL END
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a successful delivery.
///
/// Applies from any status except `sent`, so a delivery reported by a worker
/// whose claim was already reclaimed still ends the transaction. Returns
/// `false` if nothing changed.
pub async fn mark_sent(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = 'sent', timeout = NULL
        WHERE id = ? AND status <> 'sent'
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a failed delivery for the claim that expires at `claim_timeout`.
///
/// Only applies while that exact claim is still held: once the claim has been
/// reclaimed, re-claimed or completed, the row is left alone. Returns `false`
/// if nothing changed.
pub async fn mark_failed(pool: &SqlitePool, id: &str, claim_timeout: Option<i64>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = 'failed', timeout = NULL
        WHERE id = ? AND status = 'queued' AND timeout IS ?
        "#,
    )
    .bind(id)
    .bind(claim_timeout)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Increment the attempt counter and return the new value.
///
/// Returns `None` if the id is unknown.
pub async fn increment_attempts(pool: &SqlitePool, id: &str) -> Result<Option<i64>> {
    let attempts = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE transactions
        SET attempts = attempts + 1
        WHERE id = ?
        RETURNING attempts
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(attempts)
}

/// Return failed, retryable transactions to the pending pool.
///
/// Only rows with `priority > 0` and fewer than `max_attempts` attempts move.
/// Returns the number of transactions requeued.
pub async fn requeue_failed_eligible(pool: &SqlitePool, max_attempts: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = 'received'
        WHERE status = 'failed' AND attempts < ? AND priority > 0
        "#,
    )
    .bind(max_attempts)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Return queued transactions whose claim expired before `now` to the pending pool.
///
/// Returns the number of transactions requeued.
pub async fn requeue_timed_out(pool: &SqlitePool, now: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = 'received', timeout = NULL
        WHERE status = 'queued' AND timeout < ?
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Count transactions per status.
pub async fn get_stats(pool: &SqlitePool) -> Result<TransactionStats> {
    let rows = sqlx::query_as::<_, (TransactionStatus, i64)>(
        r#"
        SELECT status, COUNT(*)
        FROM transactions
        GROUP BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut stats = TransactionStats::default();
    for (status, count) in rows {
        match status {
            TransactionStatus::Received => stats.received = count,
            TransactionStatus::Queued => stats.queued = count,
            TransactionStatus::Sent => stats.sent = count,
            TransactionStatus::Failed => stats.failed = count,
        }
    }

    Ok(stats)
}
