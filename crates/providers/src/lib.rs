//! SMS provider clients.
//!
//! This crate provides the [`Provider`] trait the collector delivers through,
//! and its implementations:
//!
//! - [`EasysmsProvider`], [`NexmoProvider`], [`SmsApiProvider`] - HTTP gateways
//! - [`SignalProvider`] - delivery through a signal-cli daemon
//! - [`MockProvider`] - in-process test double with a call counter
//!
//! # Example
//!
//! ```no_run
//! use providers::{build_provider, http_client, Provider, ProviderKind, ProvidersConfig, Sms};
//!
//! # async fn example() -> Result<(), providers::ProviderError> {
//! let config = ProvidersConfig {
//!     nexmo_key: Some("key".to_string()),
//!     nexmo_secret: Some("secret".to_string()),
//!     ..Default::default()
//! };
//! let http = http_client(&config)?;
//! let nexmo = build_provider(ProviderKind::Nexmo, &config, &http)?;
//!
//! let receipt = nexmo.send(&Sms::new("+306912345678", "Test", "Hello!")).await?;
//! println!("Accepted by {}", receipt.provider);
//! # Ok(())
//! # }
//! ```

mod config;
mod easysms;
mod error;
mod message;
mod mock;
mod nexmo;
mod registry;
mod signal;
mod smsapi;
mod trait_def;

pub use config::{ProvidersConfig, DEFAULT_REQUEST_TIMEOUT};
pub use easysms::EasysmsProvider;
pub use error::ProviderError;
pub use message::{Receipt, Sms};
pub use mock::MockProvider;
pub use nexmo::NexmoProvider;
pub use registry::{build_provider, http_client, ProviderKind};
pub use signal::SignalProvider;
pub use smsapi::SmsApiProvider;
pub use trait_def::Provider;

// Re-export async_trait for implementors
pub use async_trait::async_trait;
