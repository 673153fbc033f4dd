//! Database models.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Delivery state of a transaction.
///
/// Transitions: `Received -> Queued` (claim), `Queued -> Sent | Failed`
/// (dispatch outcome), `Failed -> Received` (retry reclaim) and
/// `Queued -> Received` (timeout reclaim).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TransactionStatus {
    Received,
    Queued,
    Sent,
    Failed,
}

impl TransactionStatus {
    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Received => "received",
            TransactionStatus::Queued => "queued",
            TransactionStatus::Sent => "sent",
            TransactionStatus::Failed => "failed",
        }
    }

    /// Whether no further dispatch will happen without a reclaim.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Sent | TransactionStatus::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider chain a transaction is delivered through.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Tactic {
    /// Primary provider only.
    #[default]
    Single,
    /// Primary provider, then the secondary one if priority allows.
    Fallback,
    /// Simulated delayed success, no real provider involved.
    Test,
    /// Deterministic failure, no real provider involved.
    TestFailing,
}

impl Tactic {
    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tactic::Single => "single",
            Tactic::Fallback => "fallback",
            Tactic::Test => "test",
            Tactic::TestFailing => "test_failing",
        }
    }
}

impl fmt::Display for Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound message request and its delivery lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    /// UUID assigned at creation.
    pub id: String,
    pub status: TransactionStatus,
    /// Destination phone number (e.g., "+306912345678").
    pub receiver: String,
    pub message: String,
    /// Sender label shown to the recipient.
    pub sender: String,
    /// Free-text tags, part of the de-duplication key.
    pub tags: String,
    pub tactic: Tactic,
    /// Number of claim/dispatch cycles so far.
    pub attempts: i64,
    /// 0 means single-shot: no retry and no fallback.
    pub priority: i64,
    /// Claim expiry in epoch seconds, only set while queued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    /// Creation time in epoch seconds.
    pub created_at: i64,
}

impl Transaction {
    /// Build a fresh `Received` transaction with a new id.
    pub fn new(request: NewTransaction) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: TransactionStatus::Received,
            receiver: request.receiver,
            message: request.message,
            sender: request.sender,
            tags: request.tags,
            tactic: request.tactic,
            attempts: 0,
            priority: request.priority,
            timeout: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether a failed delivery may be retried and fall back.
    pub fn is_retryable(&self) -> bool {
        self.priority > 0
    }
}

/// A submission before it has been validated and stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub tactic: Tactic,
}

/// Transaction counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStats {
    pub received: i64,
    pub queued: i64,
    pub sent: i64,
    pub failed: i64,
}

impl TransactionStats {
    /// Total number of stored transactions.
    pub fn total(&self) -> i64 {
        self.received + self.queued + self.sent + self.failed
    }
}
