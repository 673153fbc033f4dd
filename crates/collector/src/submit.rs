//! Idempotent submission of new transactions.

use database::validation::validate_submission;
use database::{transaction, Database, DatabaseError, NewTransaction, Transaction};
use tracing::{debug, info};

use crate::error::Result;

/// The stored transaction a submission resolved to.
#[derive(Debug, Clone)]
pub struct Submission {
    pub transaction: Transaction,
    /// `true` if an identical transaction already existed and was returned as-is.
    pub duplicate: bool,
}

/// Validate and store a submission.
///
/// Submissions are deduplicated on `(receiver, message, sender, tags)`:
/// resubmitting the same content returns the existing transaction, whatever
/// its status, and nothing new is stored.
pub async fn submit(db: &Database, request: NewTransaction) -> Result<Submission> {
    debug!(
        receiver = %request.receiver,
        sender = %request.sender,
        tactic = %request.tactic,
        priority = request.priority,
        "Transaction received"
    );

    validate_submission(&request)?;

    if let Some(existing) = find_duplicate(db, &request).await? {
        info!(id = %existing.id, status = %existing.status, "Duplicate submission");
        return Ok(Submission {
            transaction: existing,
            duplicate: true,
        });
    }

    let tx = Transaction::new(request);
    match transaction::insert(db.pool(), &tx).await {
        Ok(()) => {}
        // A concurrent submission of the same content won the insert
        Err(DatabaseError::AlreadyExists { .. }) => {
            let existing = transaction::find_duplicate(
                db.pool(),
                &tx.receiver,
                &tx.message,
                &tx.sender,
                &tx.tags,
            )
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "Transaction",
                id: tx.id.clone(),
            })?;
            info!(id = %existing.id, "Duplicate submission");
            return Ok(Submission {
                transaction: existing,
                duplicate: true,
            });
        }
        Err(e) => return Err(e.into()),
    }

    info!(id = %tx.id, receiver = %tx.receiver, "Transaction accepted");
    Ok(Submission {
        transaction: tx,
        duplicate: false,
    })
}

async fn find_duplicate(db: &Database, request: &NewTransaction) -> Result<Option<Transaction>> {
    let existing = transaction::find_duplicate(
        db.pool(),
        &request.receiver,
        &request.message,
        &request.sender,
        &request.tags,
    )
    .await?;
    Ok(existing)
}
