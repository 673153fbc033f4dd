//! Error types for provider clients.

use thiserror::Error;

/// Errors that can occur when handing a message to a provider.
///
/// The collector never propagates these: any error counts as a failed attempt.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider answered but refused the message.
    #[error("{provider} rejected message: {reason}")]
    Rejected {
        provider: &'static str,
        reason: String,
    },

    /// JSON-RPC error response from the signal-cli daemon.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Invalid or missing configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A test double configured to fail.
    #[error("simulated failure from {0}")]
    Simulated(String),
}
