//! The Provider trait definition.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::message::{Receipt, Sms};

/// A delivery integration that can hand an SMS to a third party.
///
/// Implementations range from HTTP gateways to test doubles.
/// This trait is object-safe and can be used with `Arc<dyn Provider>`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Hand the message to the provider.
    ///
    /// Returns a receipt when the provider accepted the message. Transport
    /// failures and provider refusals are both errors.
    async fn send(&self, sms: &Sms) -> Result<Receipt, ProviderError>;

    /// Get a human-readable name for this provider.
    fn name(&self) -> &str;
}
