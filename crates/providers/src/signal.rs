//! Delivery through a signal-cli daemon over JSON-RPC.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::message::{Receipt, Sms};
use crate::trait_def::Provider;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Serialize)]
struct RpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i32,
    message: String,
}

/// Parameters of the `send` method.
#[derive(Debug, Serialize)]
struct SendParams<'a> {
    recipient: Vec<&'a str>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<&'a str>,
}

/// Result of the `send` method.
#[derive(Debug, Deserialize)]
struct SendResult {
    timestamp: u64,
}

impl<T> RpcResponse<T> {
    fn into_result(self) -> Result<T, ProviderError> {
        if let Some(error) = self.error {
            return Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        self.result.ok_or_else(|| ProviderError::Rpc {
            code: -1,
            message: "No result in response".to_string(),
        })
    }
}

/// Sends messages as Signal messages through a signal-cli daemon.
///
/// The sender label is not used: Signal always shows the daemon's account.
#[derive(Clone)]
pub struct SignalProvider {
    http: Client,
    rpc_url: String,
    account: Option<String>,
    request_id: Arc<AtomicU64>,
}

impl SignalProvider {
    /// Create a provider for the daemon's RPC endpoint.
    pub fn new(http: Client, rpc_url: impl Into<String>, account: Option<String>) -> Self {
        Self {
            http,
            rpc_url: rpc_url.into(),
            account,
            request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Make a JSON-RPC call to the daemon.
    async fn rpc_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, ProviderError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("RPC call: {} (id={})", method, id);

        let response: RpcResponse<R> = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_result()
    }
}

#[async_trait]
impl Provider for SignalProvider {
    async fn send(&self, sms: &Sms) -> Result<Receipt, ProviderError> {
        let params = SendParams {
            recipient: vec![sms.receiver.as_str()],
            message: sms.message.as_str(),
            account: self.account.as_deref(),
        };

        let result: SendResult = self.rpc_call("send", params).await?;
        Ok(Receipt::new("signal").with_reference(result.timestamp.to_string()))
    }

    fn name(&self) -> &str {
        "signal"
    }
}

impl std::fmt::Debug for SignalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalProvider")
            .field("rpc_url", &self.rpc_url)
            .field("account", &self.account)
            .finish()
    }
}
