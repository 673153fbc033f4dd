//! Message types passed to providers.

use serde::{Deserialize, Serialize};

/// An outbound SMS as seen by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sms {
    /// Destination phone number (e.g., "+306912345678").
    pub receiver: String,
    /// Sender label or number.
    pub sender: String,
    /// Message text.
    pub message: String,
}

impl Sms {
    /// Create a new message.
    pub fn new(
        receiver: impl Into<String>,
        sender: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            receiver: receiver.into(),
            sender: sender.into(),
            message: message.into(),
        }
    }
}

/// Acknowledgement that a provider accepted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Name of the provider that accepted the message.
    pub provider: String,
    /// Provider-side reference, when the API returns one.
    pub reference: Option<String>,
}

impl Receipt {
    /// Create a receipt without a provider reference.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reference: None,
        }
    }

    /// Attach a provider-side reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}
