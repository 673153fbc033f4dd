//! Transaction queue collector for the SMS relay.
//!
//! Accepted submissions wait in the store as `received`. The [`Collector`]
//! claims them atomically, runs each through the provider chain its tactic
//! selects and records the result. Retryable failures and abandoned claims are
//! returned to the pool by a slower reclaim job.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use collector::{submit, Collector, CollectorConfig, TacticSelector};
//! use database::{Database, NewTransaction};
//! use providers::MockProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:relay.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let selector = TacticSelector::new(Arc::new(MockProvider::succeeding("mock")));
//!     let collector = Collector::new(db.clone(), selector, CollectorConfig::default());
//!
//!     submit(&db, NewTransaction {
//!         receiver: "+306912345678".to_string(),
//!         message: "hi".to_string(),
//!         sender: "Test".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     collector
//!         .run_with_shutdown(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!
//!     Ok(())
//! }
//! ```

mod config;
mod dispatch;
mod error;
mod scheduler;
mod submit;
mod tactic;

pub use config::CollectorConfig;
pub use dispatch::{DispatchOutcome, DispatchWorker};
pub use error::{CollectorError, Result};
pub use scheduler::{Collector, ReclaimReport};
pub use submit::{submit, Submission};
pub use tactic::{TacticSelector, DEFAULT_TEST_DELAY};
