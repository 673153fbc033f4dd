//! Tactic selection: which providers a transaction is tried against, in order.

use std::sync::Arc;
use std::time::Duration;

use database::Tactic;
use providers::{MockProvider, Provider};

/// Delay of the simulated provider behind [`Tactic::Test`].
pub const DEFAULT_TEST_DELAY: Duration = Duration::from_secs(3);

/// Maps a transaction's tactic and priority to an ordered provider chain.
///
/// The chain is tried front to back and delivery stops at the first success.
/// A transaction with priority 0 only ever gets the first provider.
#[derive(Clone)]
pub struct TacticSelector {
    primary: Arc<dyn Provider>,
    secondary: Option<Arc<dyn Provider>>,
    test_ok: Arc<dyn Provider>,
    test_fail: Arc<dyn Provider>,
}

impl TacticSelector {
    /// Create a selector that delivers through `primary`.
    pub fn new(primary: Arc<dyn Provider>) -> Self {
        Self {
            primary,
            secondary: None,
            test_ok: Arc::new(MockProvider::succeeding("fake-ok").with_delay(DEFAULT_TEST_DELAY)),
            test_fail: Arc::new(MockProvider::failing("fake-fail")),
        }
    }

    /// Set the provider [`Tactic::Fallback`] falls back to.
    pub fn with_secondary(mut self, secondary: Arc<dyn Provider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Change how long the simulated provider of [`Tactic::Test`] takes.
    pub fn with_test_delay(mut self, delay: Duration) -> Self {
        self.test_ok = Arc::new(MockProvider::succeeding("fake-ok").with_delay(delay));
        self
    }

    /// The full chain for a tactic, before the priority rule is applied.
    fn chain(&self, tactic: Tactic) -> Vec<Arc<dyn Provider>> {
        match tactic {
            Tactic::Single => vec![self.primary.clone()],
            Tactic::Fallback => {
                let mut chain = vec![self.primary.clone()];
                chain.extend(self.secondary.clone());
                chain
            }
            Tactic::Test => vec![self.test_ok.clone()],
            Tactic::TestFailing => vec![self.test_fail.clone(), self.test_fail.clone()],
        }
    }

    /// Providers to try for a transaction, in order.
    ///
    /// Priority 0 means single-shot: the chain is cut to its first provider.
    pub fn select(&self, tactic: Tactic, priority: i64) -> Vec<Arc<dyn Provider>> {
        let mut chain = self.chain(tactic);
        if priority <= 0 {
            chain.truncate(1);
        }
        chain
    }
}

impl std::fmt::Debug for TacticSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TacticSelector")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}
