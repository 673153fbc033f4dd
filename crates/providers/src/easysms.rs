//! Easysms HTTP gateway.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::message::{Receipt, Sms};
use crate::trait_def::Provider;

/// Response body of the send endpoint.
#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    status: String,
    #[serde(default)]
    balance: Option<serde_json::Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

impl SendResponse {
    fn into_receipt(self) -> Result<Receipt, ProviderError> {
        if self.status == "1" {
            Ok(Receipt::new("easysms"))
        } else {
            Err(ProviderError::Rejected {
                provider: "easysms",
                reason: format!("status {}", self.status),
            })
        }
    }
}

/// Client for the Easysms send API (GET with query parameters).
#[derive(Clone)]
pub struct EasysmsProvider {
    http: Client,
    url: String,
    key: String,
}

impl EasysmsProvider {
    /// Create a provider using the given HTTP client and API key.
    pub fn new(http: Client, url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl Provider for EasysmsProvider {
    async fn send(&self, sms: &Sms) -> Result<Receipt, ProviderError> {
        debug!(receiver = %sms.receiver, "Easysms send");

        let response: SendResponse = self
            .http
            .get(&self.url)
            .query(&[
                ("key", self.key.as_str()),
                ("type", "json"),
                ("from", sms.sender.as_str()),
                ("text", sms.message.as_str()),
                ("to", sms.receiver.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(ref balance) = response.balance {
            debug!(%balance, "Easysms balance");
        }

        response.into_receipt()
    }

    fn name(&self) -> &str {
        "easysms"
    }
}

impl std::fmt::Debug for EasysmsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EasysmsProvider")
            .field("url", &self.url)
            .finish()
    }
}
