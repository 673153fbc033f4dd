//! Configuration types for provider clients.

use std::time::Duration;

/// Default timeout for a single provider HTTP request (10 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials and endpoints for every supported provider.
///
/// Providers whose credentials are missing cannot be built; see
/// [`crate::registry::build_provider`].
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    /// Easysms API key.
    pub easysms_key: Option<String>,
    /// Easysms endpoint.
    pub easysms_url: String,
    /// Nexmo API key.
    pub nexmo_key: Option<String>,
    /// Nexmo API secret.
    pub nexmo_secret: Option<String>,
    /// Nexmo endpoint.
    pub nexmo_url: String,
    /// SMSAPI access token.
    pub smsapi_token: Option<String>,
    /// SMSAPI endpoint.
    pub smsapi_url: String,
    /// Base URL of a signal-cli daemon (e.g., "http://localhost:8080").
    pub signal_daemon_url: Option<String>,
    /// Account phone number for signal-cli multi-account mode.
    pub signal_account: Option<String>,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl ProvidersConfig {
    /// Get the signal-cli RPC endpoint URL, if a daemon is configured.
    pub fn signal_rpc_url(&self) -> Option<String> {
        self.signal_daemon_url
            .as_ref()
            .map(|base| format!("{}/api/v1/rpc", base.trim_end_matches('/')))
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            easysms_key: None,
            easysms_url: "https://easysms.gr/api/sms/send".to_string(),
            nexmo_key: None,
            nexmo_secret: None,
            nexmo_url: "https://rest.nexmo.com/sms/json".to_string(),
            smsapi_token: None,
            smsapi_url: "https://api.smsapi.com/sms.do".to_string(),
            signal_daemon_url: None,
            signal_account: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
