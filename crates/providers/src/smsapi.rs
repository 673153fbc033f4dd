//! SMSAPI HTTP gateway.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::message::{Receipt, Sms};
use crate::trait_def::Provider;

#[derive(Debug, Deserialize)]
struct SentItem {
    id: Option<String>,
}

/// Response body of `sms.do` with `format=json`.
#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    list: Vec<SentItem>,
}

impl SendResponse {
    fn into_receipt(self) -> Result<Receipt, ProviderError> {
        match self.error {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::String(ref s)) if s.is_empty() => {}
            Some(code) => {
                return Err(ProviderError::Rejected {
                    provider: "smsapi",
                    reason: format!(
                        "error {}: {}",
                        code,
                        self.message.as_deref().unwrap_or("unknown error")
                    ),
                });
            }
        }

        let receipt = Receipt::new("smsapi");
        Ok(match self.list.into_iter().find_map(|item| item.id) {
            Some(id) => receipt.with_reference(id),
            None => receipt,
        })
    }
}

/// Client for the SMSAPI send endpoint (GET with query parameters).
#[derive(Clone)]
pub struct SmsApiProvider {
    http: Client,
    url: String,
    token: String,
}

impl SmsApiProvider {
    /// Create a provider using the given HTTP client and access token.
    pub fn new(http: Client, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl Provider for SmsApiProvider {
    async fn send(&self, sms: &Sms) -> Result<Receipt, ProviderError> {
        debug!(receiver = %sms.receiver, "SMSAPI send");

        let response: SendResponse = self
            .http
            .get(&self.url)
            .query(&[
                ("access_token", self.token.as_str()),
                ("format", "json"),
                ("message", sms.message.as_str()),
                ("from", sms.sender.as_str()),
                ("to", sms.receiver.as_str()),
                ("encoding", "iso-8859-7"),
                ("datacoding", "gsm"),
            ])
            .send()
            .await?
            .json()
            .await?;

        response.into_receipt()
    }

    fn name(&self) -> &str {
        "smsapi"
    }
}

impl std::fmt::Debug for SmsApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsApiProvider").field("url", &self.url).finish()
    }
}
