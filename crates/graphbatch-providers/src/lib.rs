//! Remote services behind the batch workflow.
//!
//! - [`TokenProvider`] - Acquires the bearer [`Credential`] for a run
//! - [`CalendarBatchApi`] - Submits batches and deletes created events
//! - [`ProviderError`] - Error type for every remote failure
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐    ┌─────────────────────────┐
//! │   identity platform     │    │    Graph API ($batch)   │
//! └────────────┬────────────┘    └────────────┬────────────┘
//!              │                              │
//!              ▼                              ▼
//! ┌─────────────────────────┐    ┌─────────────────────────┐
//! │ ClientCredentialsClient │    │   GraphCalendarClient   │
//! └────────────┬────────────┘    └────────────┬────────────┘
//!              │ TokenProvider                │ CalendarBatchApi
//!              └───────────────┬──────────────┘
//!                              ▼
//!                       workflow driver
//! ```

pub mod error;
#[cfg(feature = "graph")]
pub mod graph;
pub mod provider;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{BoxFuture, CalendarBatchApi, Credential, TokenProvider};
