//! Traits at the seam between the workflow and the remote services.
//!
//! - [`TokenProvider`] acquires the bearer [`Credential`] once per run
//! - [`CalendarBatchApi`] submits batches and deletes created events
//!
//! The workflow only talks to these traits, so it can be driven by the
//! Microsoft Graph implementation in production and by fakes in tests.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Duration, Utc};

use graphbatch_core::{Batch, BatchOutcome};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Boxing keeps the traits object-safe so the workflow can hold
/// `&dyn CalendarBatchApi`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Seconds subtracted from the reported lifetime so the token is treated as
/// expired slightly before the identity provider says so.
const EXPIRY_SKEW_SECS: i64 = 60;

/// A bearer token authorizing calls to the calendar API.
///
/// The token is not refreshed; it is expected to outlive a single run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Creates a credential that never reports expiry.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Creates a credential from a token endpoint response.
    pub fn with_lifetime(access_token: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        let expires_at = expires_in_secs
            .map(|secs| Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_SKEW_SECS));

        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Returns the raw bearer token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns when the token stops being usable, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true if the token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Acquires bearer credentials.
pub trait TokenProvider: Send + Sync {
    /// Returns the name of the identity provider (e.g., "entra").
    fn name(&self) -> &str;

    /// Exchanges the configured client credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Any failure, including network errors, is reported as an
    /// authentication error. No retry is attempted.
    fn acquire_token(&self) -> BoxFuture<'_, ProviderResult<Credential>>;
}

/// A calendar API that accepts grouped event creations.
pub trait CalendarBatchApi: Send + Sync {
    /// Returns the name of this API (e.g., "graph").
    fn name(&self) -> &str;

    /// Submits one batch as a single network call.
    ///
    /// On success the returned outcome holds at most one entry per tag of
    /// `batch`; individual entries may carry non-success statuses.
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails as a whole (network error,
    /// non-success status of the batch call, undecodable response). No
    /// per-item outcome is available in that case.
    fn submit_batch<'a>(
        &'a self,
        batch: &'a Batch,
        credential: &'a Credential,
    ) -> BoxFuture<'a, ProviderResult<BatchOutcome>>;

    /// Deletes one previously created event.
    fn delete_event<'a>(
        &'a self,
        event_id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
