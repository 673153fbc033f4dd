//! Build providers from configuration by name.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use crate::config::ProvidersConfig;
use crate::easysms::EasysmsProvider;
use crate::error::ProviderError;
use crate::nexmo::NexmoProvider;
use crate::signal::SignalProvider;
use crate::smsapi::SmsApiProvider;
use crate::trait_def::Provider;

/// The real providers that can be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Easysms,
    Nexmo,
    SmsApi,
    Signal,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Easysms => "easysms",
            ProviderKind::Nexmo => "nexmo",
            ProviderKind::SmsApi => "smsapi",
            ProviderKind::Signal => "signal",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easysms" => Ok(ProviderKind::Easysms),
            "nexmo" => Ok(ProviderKind::Nexmo),
            "smsapi" => Ok(ProviderKind::SmsApi),
            "signal" => Ok(ProviderKind::Signal),
            other => Err(ProviderError::Config(format!("unknown provider: {}", other))),
        }
    }
}

/// Build the shared HTTP client used by all HTTP providers.
pub fn http_client(config: &ProvidersConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(ProviderError::Http)
}

fn missing(kind: ProviderKind, what: &str) -> ProviderError {
    ProviderError::Config(format!("{} requires {}", kind, what))
}

/// Build a provider of the given kind.
///
/// Fails with [`ProviderError::Config`] when its credentials are missing.
pub fn build_provider(
    kind: ProviderKind,
    config: &ProvidersConfig,
    http: &Client,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider: Arc<dyn Provider> = match kind {
        ProviderKind::Easysms => {
            let key = config
                .easysms_key
                .clone()
                .ok_or_else(|| missing(kind, "EASYSMS_KEY"))?;
            Arc::new(EasysmsProvider::new(http.clone(), &config.easysms_url, key))
        }
        ProviderKind::Nexmo => {
            let key = config
                .nexmo_key
                .clone()
                .ok_or_else(|| missing(kind, "NEXMO_KEY"))?;
            let secret = config
                .nexmo_secret
                .clone()
                .ok_or_else(|| missing(kind, "NEXMO_SECRET"))?;
            Arc::new(NexmoProvider::new(http.clone(), &config.nexmo_url, key, secret))
        }
        ProviderKind::SmsApi => {
            let token = config
                .smsapi_token
                .clone()
                .ok_or_else(|| missing(kind, "SMSAPI_TOKEN"))?;
            Arc::new(SmsApiProvider::new(http.clone(), &config.smsapi_url, token))
        }
        ProviderKind::Signal => {
            let rpc_url = config
                .signal_rpc_url()
                .ok_or_else(|| missing(kind, "SIGNAL_DAEMON_URL"))?;
            Arc::new(SignalProvider::new(
                http.clone(),
                rpc_url,
                config.signal_account.clone(),
            ))
        }
    };

    info!(provider = %kind, "Provider configured");
    Ok(provider)
}
