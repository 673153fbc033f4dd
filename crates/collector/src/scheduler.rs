//! Collector scheduler: the periodic claim, retry-reclaim and timeout-reclaim jobs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use database::{transaction, Database};
use tokio::sync::Semaphore;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::CollectorConfig;
use crate::dispatch::{DispatchOutcome, DispatchWorker};
use crate::error::Result;
use crate::tactic::TacticSelector;

/// Result of one reclaim pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Failed transactions returned to the pool for retry.
    pub retried: u64,
    /// Expired claims returned to the pool.
    pub timed_out: u64,
}

/// Drives transactions from `received` to a terminal state.
///
/// Two timers run independently: a fast one that claims and dispatches
/// pending transactions, and a slow one that reclaims retryable failures and
/// expired claims. Workers are spawned, never awaited by the loop, and their
/// number is bounded by `max_in_flight`.
#[derive(Clone)]
pub struct Collector {
    db: Database,
    worker: DispatchWorker,
    config: CollectorConfig,
    slots: Arc<Semaphore>,
}

impl Collector {
    /// Create a collector.
    pub fn new(db: Database, selector: TacticSelector, config: CollectorConfig) -> Self {
        let worker = DispatchWorker::new(db.clone(), Arc::new(selector), config.provider_timeout);
        let slots = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        Self {
            db,
            worker,
            config,
            slots,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Number of dispatch workers currently running.
    pub fn in_flight(&self) -> usize {
        self.config.max_in_flight.max(1) - self.slots.available_permits()
    }

    /// Run one dispatch tick.
    ///
    /// Launches one claim attempt per pending transaction, capped by the free
    /// worker slots. Each attempt that wins a claim dispatches it; one that
    /// finds nothing left to claim does nothing. Returns the number of
    /// attempts launched.
    pub async fn dispatch_tick(&self) -> Result<usize> {
        let pending = transaction::count_pending(self.db.pool()).await?;
        if pending <= 0 {
            return Ok(0);
        }

        let wanted = usize::try_from(pending).unwrap_or(usize::MAX);
        let mut launched = 0;

        while launched < wanted {
            let Ok(permit) = self.slots.clone().try_acquire_owned() else {
                debug!(pending, launched, "Dispatch slots exhausted");
                break;
            };

            let db = self.db.clone();
            let worker = self.worker.clone();
            let ttl = self.config.claim_ttl_secs();

            tokio::spawn(async move {
                let _permit = permit;

                let tx = match transaction::claim_one(db.pool(), ttl).await {
                    Ok(Some(tx)) => tx,
                    Ok(None) => return,
                    Err(e) => {
                        error!("Error claiming transaction: {}", e);
                        return;
                    }
                };

                let id = tx.id.clone();
                match worker.dispatch(tx).await {
                    Ok(DispatchOutcome::Missing) | Ok(DispatchOutcome::Sent { .. }) => {}
                    Ok(DispatchOutcome::Failed { attempts })
                    | Ok(DispatchOutcome::Superseded { attempts }) => {
                        debug!(id = %id, attempts, "Dispatch cycle ended in failure");
                    }
                    Err(e) => {
                        error!(id = %id, "Error dispatching transaction: {}", e);
                    }
                }
            });

            launched += 1;
        }

        Ok(launched)
    }

    /// Return failed transactions that may still be retried to the pool.
    pub async fn retry_tick(&self) -> Result<u64> {
        let moved =
            transaction::requeue_failed_eligible(self.db.pool(), self.config.retry_limit).await?;
        Ok(moved)
    }

    /// Return transactions whose claim expired to the pool.
    ///
    /// The worker holding an expired claim is not stopped, so the transaction
    /// may be delivered twice.
    pub async fn timeout_tick(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        let moved = transaction::requeue_timed_out(self.db.pool(), now).await?;
        Ok(moved)
    }

    /// Run both reclaim jobs, logging and swallowing store errors.
    pub async fn reclaim_tick(&self) -> ReclaimReport {
        let mut report = ReclaimReport::default();

        match self.retry_tick().await {
            Ok(moved) => report.retried = moved,
            Err(e) => error!("Error requeueing failed transactions: {}", e),
        }

        match self.timeout_tick().await {
            Ok(moved) => report.timed_out = moved,
            Err(e) => error!("Error requeueing timed out transactions: {}", e),
        }

        if report.retried > 0 || report.timed_out > 0 {
            info!(
                retried = report.retried,
                timed_out = report.timed_out,
                "Reclaimed transactions"
            );
        }

        report
    }

    /// Wait until no worker is running, up to `limit`.
    ///
    /// Returns `true` if every worker finished in time.
    pub async fn drain(&self, limit: Duration) -> bool {
        let all = u32::try_from(self.config.max_in_flight.max(1)).unwrap_or(u32::MAX);
        matches!(
            tokio::time::timeout(limit, self.slots.acquire_many(all)).await,
            Ok(Ok(_))
        )
    }

    /// Run the collector until `shutdown_signal` completes.
    ///
    /// On shutdown, waits up to `drain_timeout` for running workers. Anything
    /// still `queued` afterwards is picked up again by the timeout reclaim
    /// after the next start.
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S)
    where
        S: Future<Output = ()> + Send,
    {
        info!(
            dispatch_interval = ?self.config.dispatch_interval,
            reclaim_interval = ?self.config.reclaim_interval,
            claim_ttl = ?self.config.claim_ttl,
            max_in_flight = self.config.max_in_flight,
            "Collector starting"
        );

        let mut dispatch_timer = interval(self.config.dispatch_interval);
        let mut reclaim_timer = interval(self.config.reclaim_interval);
        dispatch_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        reclaim_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping collector");
                    break;
                }

                _ = dispatch_timer.tick() => {
                    match self.dispatch_tick().await {
                        Ok(0) => {}
                        Ok(launched) => debug!(launched, "Launched claim attempts"),
                        Err(e) => error!("Error collecting received transactions: {}", e),
                    }
                }

                _ = reclaim_timer.tick() => {
                    self.reclaim_tick().await;
                }
            }
        }

        if self.drain(self.config.drain_timeout).await {
            info!("Collector stopped, all workers finished");
        } else {
            warn!(
                in_flight = self.in_flight(),
                "Drain timeout exceeded, queued transactions will be reclaimed after restart"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{NewTransaction, Tactic, Transaction, TransactionStatus};
    use providers::MockProvider;

    // Workers run concurrently, so use a file-backed database
    async fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("relay.db").display());
        let db = Database::connect(&url).await.unwrap();
        db.migrate().await.unwrap();
        (dir, db)
    }

    async fn insert(db: &Database, receiver: &str, priority: i64, tactic: Tactic) -> Transaction {
        let tx = Transaction::new(NewTransaction {
            receiver: receiver.to_string(),
            message: "hi".to_string(),
            sender: "Test".to_string(),
            tags: String::new(),
            priority,
            tactic,
        });
        transaction::insert(db.pool(), &tx).await.unwrap();
        tx
    }

    fn fast_config() -> CollectorConfig {
        CollectorConfig {
            dispatch_interval: Duration::from_millis(20),
            reclaim_interval: Duration::from_millis(40),
            drain_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn collector(db: &Database, a: &MockProvider, b: &MockProvider, config: CollectorConfig) -> Collector {
        let selector = TacticSelector::new(Arc::new(a.clone()))
            .with_secondary(Arc::new(b.clone()))
            .with_test_delay(Duration::from_millis(10));
        Collector::new(db.clone(), selector, config)
    }

    async fn status(db: &Database, id: &str) -> (TransactionStatus, i64) {
        let tx = transaction::find_by_id(db.pool(), id).await.unwrap();
        (tx.status, tx.attempts)
    }

    #[tokio::test]
    async fn test_end_to_end_dispatch_cycle() {
        let (_dir, db) = test_db().await;
        let a = MockProvider::failing("a");
        let b = MockProvider::succeeding("b");
        let collector = collector(&db, &a, &b, fast_config());
        let tx = insert(&db, "+306912345678", 1, Tactic::Fallback).await;

        assert_eq!(collector.dispatch_tick().await.unwrap(), 1);
        assert!(collector.drain(Duration::from_secs(5)).await);

        assert_eq!(status(&db, &tx.id).await, (TransactionStatus::Sent, 1));
        assert_eq!((a.calls(), b.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_one_attempt_per_pending_transaction() {
        let (_dir, db) = test_db().await;
        let a = MockProvider::succeeding("a");
        let b = MockProvider::succeeding("b");
        let collector = collector(&db, &a, &b, fast_config());
        for receiver in ["+306912345601", "+306912345602", "+306912345603"] {
            insert(&db, receiver, 0, Tactic::Single).await;
        }

        assert_eq!(collector.dispatch_tick().await.unwrap(), 3);
        assert!(collector.drain(Duration::from_secs(5)).await);

        let stats = transaction::get_stats(db.pool()).await.unwrap();
        assert_eq!(stats.sent, 3);
        assert_eq!(a.calls(), 3);

        // Nothing pending, nothing launched
        assert_eq!(collector.dispatch_tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_limit() {
        let (_dir, db) = test_db().await;
        let a = MockProvider::succeeding("a").with_delay(Duration::from_millis(200));
        let b = MockProvider::succeeding("b");
        let config = CollectorConfig {
            max_in_flight: 1,
            ..fast_config()
        };
        let collector = collector(&db, &a, &b, config);
        insert(&db, "+306912345601", 0, Tactic::Single).await;
        insert(&db, "+306912345602", 0, Tactic::Single).await;

        assert_eq!(collector.dispatch_tick().await.unwrap(), 1);
        assert_eq!(collector.in_flight(), 1);
        assert_eq!(collector.dispatch_tick().await.unwrap(), 0);

        assert!(collector.drain(Duration::from_secs(5)).await);
        let stats = transaction::get_stats(db.pool()).await.unwrap();
        assert_eq!((stats.sent, stats.received), (1, 1));
    }

    #[tokio::test]
    async fn test_timeout_reclaim() {
        let (_dir, db) = test_db().await;
        let a = MockProvider::succeeding("a");
        let b = MockProvider::succeeding("b");
        let collector = collector(&db, &a, &b, fast_config());
        let tx = insert(&db, "+306912345678", 0, Tactic::Single).await;

        // A claim whose worker died: expired ten seconds ago
        transaction::claim_one(db.pool(), -10).await.unwrap().unwrap();
        assert_eq!(status(&db, &tx.id).await.0, TransactionStatus::Queued);

        let report = collector.reclaim_tick().await;
        assert_eq!(report, ReclaimReport { retried: 0, timed_out: 1 });
        assert_eq!(status(&db, &tx.id).await.0, TransactionStatus::Received);

        // Claimable and deliverable again
        assert_eq!(collector.dispatch_tick().await.unwrap(), 1);
        assert!(collector.drain(Duration::from_secs(5)).await);
        assert_eq!(status(&db, &tx.id).await, (TransactionStatus::Sent, 1));
    }

    #[tokio::test]
    async fn test_store_errors_do_not_stop_the_collector() {
        let (dir, db) = test_db().await;
        let a = MockProvider::succeeding("a");
        let b = MockProvider::succeeding("b");
        let tx = insert(&db, "+306912345678", 0, Tactic::Single).await;

        // A second handle on the same file whose pool is gone
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("relay.db").display());
        let unreachable = Database::connect(&url).await.unwrap();
        unreachable.close().await;
        let broken = collector(&unreachable, &a, &b, fast_config());

        assert!(broken.dispatch_tick().await.is_err());
        assert_eq!(broken.reclaim_tick().await, ReclaimReport::default());

        // The run loop logs the failing ticks and keeps going until shutdown
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(broken.clone().run_with_shutdown(async move {
            let _ = stop_rx.await;
        }));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());
        stop_tx.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(a.calls(), 0);

        // Nothing was lost: a collector with a reachable store delivers it
        let healthy = collector(&db, &a, &b, fast_config());
        assert_eq!(healthy.dispatch_tick().await.unwrap(), 1);
        assert!(healthy.drain(Duration::from_secs(5)).await);
        assert_eq!(status(&db, &tx.id).await, (TransactionStatus::Sent, 1));
    }

    #[tokio::test]
    async fn test_retry_until_limit() {
        let (_dir, db) = test_db().await;
        let a = MockProvider::failing("a");
        let b = MockProvider::failing("b");
        let collector = collector(&db, &a, &b, fast_config());
        let retryable = insert(&db, "+306912345601", 1, Tactic::Single).await;
        let single_shot = insert(&db, "+306912345602", 0, Tactic::Single).await;

        for _ in 0..5 {
            collector.dispatch_tick().await.unwrap();
            assert!(collector.drain(Duration::from_secs(5)).await);
            collector.reclaim_tick().await;
        }

        // Retried until attempts reached the limit of 3
        assert_eq!(status(&db, &retryable.id).await, (TransactionStatus::Failed, 3));
        // Never retried
        assert_eq!(status(&db, &single_shot.id).await, (TransactionStatus::Failed, 1));
        assert_eq!(a.calls(), 4);
    }

    #[tokio::test]
    async fn test_run_with_shutdown() {
        let (_dir, db) = test_db().await;
        let a = MockProvider::succeeding("a");
        let b = MockProvider::succeeding("b");
        let collector = collector(&db, &a, &b, fast_config());
        let tx = insert(&db, "+306912345678", 0, Tactic::Test).await;

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(collector.clone().run_with_shutdown(async move {
            let _ = stop_rx.await;
        }));

        let mut delivered = false;
        for _ in 0..100 {
            if status(&db, &tx.id).await.0 == TransactionStatus::Sent {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(delivered);

        stop_tx.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(collector.in_flight(), 0);
        // The test tactic never touches real providers
        assert_eq!(a.calls(), 0);
    }
}
