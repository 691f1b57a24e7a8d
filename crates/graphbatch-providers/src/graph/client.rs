//! Microsoft Graph calendar client.
//!
//! Submits event creations through the JSON batching endpoint and deletes
//! events one at a time.

use std::time::Duration;

use tracing::{debug, warn};

use graphbatch_core::{Batch, BatchOutcome};

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{BoxFuture, CalendarBatchApi, Credential};

use super::config::GraphConfig;
use super::wire::{demultiplex, encode_batch, parse_batch_response};

/// Longest error body quoted in an error message.
const ERROR_BODY_LEN: usize = 512;

/// Graph API client bound to one mailbox.
#[derive(Debug)]
pub struct GraphCalendarClient {
    config: GraphConfig,
    http_client: reqwest::Client,
}

impl GraphCalendarClient {
    /// Creates a new Graph client.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the HTTP client cannot be
    /// constructed.
    pub fn new(config: GraphConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Posts `batch` to the `$batch` endpoint and maps sub-responses to tags.
    pub async fn post_batch(
        &self,
        batch: &Batch,
        credential: &Credential,
    ) -> ProviderResult<BatchOutcome> {
        let events_path = self.config.events_path();
        let body = encode_batch(batch, &events_path);

        debug!(size = batch.len(), url = %self.config.batch_url(), "submitting batch");

        let response = self
            .http_client
            .post(self.config.batch_url())
            .bearer_auth(credential.access_token())
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response, "batch request").await?;

        let text = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read batch response: {}", e))
        })?;

        let parsed = parse_batch_response(&text)?;
        Ok(demultiplex(batch, parsed))
    }

    /// Deletes one event from the mailbox calendar.
    pub async fn delete(&self, event_id: &str, credential: &Credential) -> ProviderResult<()> {
        let url = self.config.event_url(event_id);
        debug!(event_id, "deleting event");

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(credential.access_token())
            .send()
            .await
            .map_err(map_send_error)?;

        check_status(response, "delete request").await?;
        Ok(())
    }
}

impl CalendarBatchApi for GraphCalendarClient {
    fn name(&self) -> &str {
        "graph"
    }

    fn submit_batch<'a>(
        &'a self,
        batch: &'a Batch,
        credential: &'a Credential,
    ) -> BoxFuture<'a, ProviderResult<BatchOutcome>> {
        Box::pin(async move {
            self.post_batch(batch, credential)
                .await
                .map_err(|e| e.with_provider("graph"))
        })
    }

    fn delete_event<'a>(
        &'a self,
        event_id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.delete(event_id, credential)
                .await
                .map_err(|e| e.with_provider("graph"))
        })
    }
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    ProviderError::network(message).with_source(e)
}

/// Turns a non-success response into a classified error.
async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let mut error = ProviderError::from_http(what, status.as_u16(), &body, ERROR_BODY_LEN);
    if error.code() == ProviderErrorCode::RateLimited {
        if let Some(delay) = retry_after {
            error = error.with_retry_after(delay);
        }
    }

    warn!(status = status.as_u16(), code = %error.code(), "{} rejected", what);
    Err(error)
}
