//! Test double provider - succeeds or fails on demand.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::ProviderError;
use crate::message::{Receipt, Sms};
use crate::trait_def::Provider;

/// A provider that never leaves the process.
///
/// Used by the diagnostic tactics and by tests that exercise the fallback and
/// retry machinery. Clones share the call counter.
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    succeed: bool,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    /// A provider that accepts every message.
    pub fn succeeding(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            succeed: true,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A provider that rejects every message.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            succeed: false,
            ..Self::succeeding(name)
        }
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `send` calls so far, across all clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn send(&self, _sms: &Sms) -> Result<Receipt, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if self.succeed {
            Ok(Receipt::new(self.name.clone()))
        } else {
            Err(ProviderError::Simulated(self.name.clone()))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
