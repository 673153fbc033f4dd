//! Nexmo (Vonage) SMS API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::message::{Receipt, Sms};
use crate::trait_def::Provider;

/// Per-message status entry in the send response.
#[derive(Debug, Deserialize)]
struct MessageStatus {
    status: String,
    #[serde(rename = "message-id")]
    message_id: Option<String>,
    #[serde(rename = "error-text")]
    error_text: Option<String>,
}

/// Response body of the send endpoint.
#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<MessageStatus>,
}

impl SendResponse {
    /// A send succeeds only if every message part has status "0".
    fn into_receipt(self) -> Result<Receipt, ProviderError> {
        if self.messages.is_empty() {
            return Err(ProviderError::Rejected {
                provider: "nexmo",
                reason: "empty response".to_string(),
            });
        }

        if let Some(failed) = self.messages.iter().find(|m| m.status != "0") {
            return Err(ProviderError::Rejected {
                provider: "nexmo",
                reason: format!(
                    "status {}: {}",
                    failed.status,
                    failed.error_text.as_deref().unwrap_or("unknown error")
                ),
            });
        }

        let receipt = Receipt::new("nexmo");
        Ok(match self.messages.into_iter().find_map(|m| m.message_id) {
            Some(id) => receipt.with_reference(id),
            None => receipt,
        })
    }
}

/// Client for the Nexmo SMS API (form POST).
#[derive(Clone)]
pub struct NexmoProvider {
    http: Client,
    url: String,
    key: String,
    secret: String,
}

impl NexmoProvider {
    /// Create a provider using the given HTTP client and credentials.
    pub fn new(
        http: Client,
        url: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            key: key.into(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl Provider for NexmoProvider {
    async fn send(&self, sms: &Sms) -> Result<Receipt, ProviderError> {
        debug!(receiver = %sms.receiver, "Nexmo send");

        let response: SendResponse = self
            .http
            .post(&self.url)
            .form(&[
                ("api_key", self.key.as_str()),
                ("api_secret", self.secret.as_str()),
                ("from", sms.sender.as_str()),
                ("text", sms.message.as_str()),
                ("to", sms.receiver.as_str()),
                ("type", "unicode"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_receipt()
    }

    fn name(&self) -> &str {
        "nexmo"
    }
}

impl std::fmt::Debug for NexmoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NexmoProvider").field("url", &self.url).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_parts_accepted() {
        let response: SendResponse = serde_json::from_str(
            r#"{"message-count":"1","messages":[{"status":"0","message-id":"0A0000000123ABCD1"}]}"#,
        )
        .unwrap();
        let receipt = response.into_receipt().unwrap();
        assert_eq!(receipt.provider, "nexmo");
        assert_eq!(receipt.reference.as_deref(), Some("0A0000000123ABCD1"));
    }

    #[test]
    fn test_failed_part_is_rejected() {
        let response: SendResponse = serde_json::from_str(
            r#"{"messages":[{"status":"0"},{"status":"4","error-text":"Bad Credentials"}]}"#,
        )
        .unwrap();
        let err = response.into_receipt().unwrap_err();
        assert!(err.to_string().contains("Bad Credentials"));
    }

    #[test]
    fn test_empty_response_is_rejected() {
        let response: SendResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_receipt().is_err());
    }
}
