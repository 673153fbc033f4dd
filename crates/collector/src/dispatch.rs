//! Dispatch worker: drives one claimed transaction to `sent` or `failed`.

use std::sync::Arc;
use std::time::Duration;

use database::{transaction, Database, Transaction};
use providers::{Provider, Sms};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::tactic::TacticSelector;

/// Final state a dispatch cycle left the transaction in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A provider accepted the message.
    Sent { provider: String, attempts: i64 },
    /// Every provider in the chain failed.
    Failed { attempts: i64 },
    /// Every provider failed, but the claim had already been reclaimed, so the
    /// failure was not recorded.
    Superseded { attempts: i64 },
    /// The transaction disappeared between claim and dispatch.
    Missing,
}

/// Runs claimed transactions through their provider chain.
#[derive(Clone)]
pub struct DispatchWorker {
    db: Database,
    selector: Arc<TacticSelector>,
    provider_timeout: Duration,
}

impl DispatchWorker {
    /// Create a worker.
    pub fn new(db: Database, selector: Arc<TacticSelector>, provider_timeout: Duration) -> Self {
        Self {
            db,
            selector,
            provider_timeout,
        }
    }

    /// Dispatch a transaction that was just claimed.
    ///
    /// Increments `attempts`, walks the provider chain until the first success,
    /// then records `sent` or `failed`. A failure is only recorded while this
    /// worker's claim is still held, and `sent` is never overwritten. A store
    /// error leaves the transaction `queued`; the timeout reclaim returns it to
    /// the pool later.
    pub async fn dispatch(&self, tx: Transaction) -> Result<DispatchOutcome> {
        info!(
            id = %tx.id,
            tactic = %tx.tactic,
            priority = tx.priority,
            receiver = %tx.receiver,
            "Transaction queued"
        );

        let Some(attempts) = transaction::increment_attempts(self.db.pool(), &tx.id).await? else {
            warn!(id = %tx.id, "Claimed transaction no longer exists");
            return Ok(DispatchOutcome::Missing);
        };

        let sms = Sms::new(&tx.receiver, &tx.sender, &tx.message);
        let chain = self.selector.select(tx.tactic, tx.priority);

        match self.deliver(&tx, &sms, &chain).await {
            Some(provider) => {
                if !transaction::mark_sent(self.db.pool(), &tx.id).await? {
                    debug!(id = %tx.id, "Transaction was already marked sent");
                }
                info!(id = %tx.id, provider = %provider, attempts, "Transaction sent");
                Ok(DispatchOutcome::Sent { provider, attempts })
            }
            None => {
                if transaction::mark_failed(self.db.pool(), &tx.id, tx.timeout).await? {
                    warn!(id = %tx.id, attempts, "Transaction failed");
                    Ok(DispatchOutcome::Failed { attempts })
                } else {
                    warn!(
                        id = %tx.id,
                        attempts,
                        "Delivery failed after the claim was reclaimed, leaving status unchanged"
                    );
                    Ok(DispatchOutcome::Superseded { attempts })
                }
            }
        }
    }

    /// Try each provider in order. Returns the name of the one that accepted.
    async fn deliver(
        &self,
        tx: &Transaction,
        sms: &Sms,
        chain: &[Arc<dyn Provider>],
    ) -> Option<String> {
        for provider in chain {
            info!(id = %tx.id, provider = provider.name(), "Attempting delivery");

            match timeout(self.provider_timeout, provider.send(sms)).await {
                Ok(Ok(receipt)) => {
                    debug!(id = %tx.id, reference = ?receipt.reference, "Provider accepted message");
                    return Some(provider.name().to_string());
                }
                Ok(Err(e)) => {
                    warn!(id = %tx.id, provider = provider.name(), error = %e, "Delivery attempt failed");
                }
                Err(_) => {
                    warn!(
                        id = %tx.id,
                        provider = provider.name(),
                        timeout = ?self.provider_timeout,
                        "Delivery attempt timed out"
                    );
                }
            }
        }

        None
    }
}
