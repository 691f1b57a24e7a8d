//! Microsoft Graph calendar implementation.
//!
//! - [`ClientCredentialsClient`]: app-only token acquisition against the
//!   Microsoft identity platform (implements [`TokenProvider`])
//! - [`GraphCalendarClient`]: `$batch` event creation and single-event
//!   deletion (implements [`CalendarBatchApi`])
//!
//! # Example
//!
//! ```ignore
//! use graphbatch_providers::graph::{
//!     ClientCredentials, ClientCredentialsClient, GraphCalendarClient, GraphConfig,
//! };
//!
//! let credentials = ClientCredentials::new(client_id, client_secret, tenant_id);
//! let auth = ClientCredentialsClient::new(credentials, timeout)?;
//! let credential = auth.acquire_token().await?;
//!
//! let graph = GraphCalendarClient::new(GraphConfig::new("room@contoso.com"))?;
//! let outcome = graph.submit_batch(&batch, &credential).await?;
//! ```
//!
//! [`TokenProvider`]: crate::TokenProvider
//! [`CalendarBatchApi`]: crate::CalendarBatchApi

mod client;
mod config;
mod oauth;
mod wire;

pub use client::GraphCalendarClient;
pub use config::{ClientCredentials, GraphConfig};
pub use oauth::ClientCredentialsClient;
