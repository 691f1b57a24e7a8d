//! JSON batching wire format.
//!
//! A `$batch` call carries up to 20 sub-requests, each labelled with an
//! `id`. The response holds one sub-response per id, in arbitrary order:
//!
//! ```text
//! POST /$batch                         200 OK
//! { "requests": [                      { "responses": [
//!     { "id": "0", "method": "POST",       { "id": "1", "status": 201, "body": {...} },
//!       "url": "/users/x/events",          { "id": "0", "status": 409, "body": {...} }
//!       "body": {...} }, ...           ] }
//! ] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use graphbatch_core::{Batch, BatchOutcome, EventPayload, ItemOutcome, RequestTag};

use crate::error::{ProviderError, ProviderResult};

/// Body of a `$batch` request.
#[derive(Debug, Serialize)]
pub(crate) struct BatchRequestBody<'a> {
    pub requests: Vec<BatchRequestItem<'a>>,
}

/// One sub-request of a `$batch` call.
#[derive(Debug, Serialize)]
pub(crate) struct BatchRequestItem<'a> {
    pub id: &'a str,
    pub method: &'static str,
    pub url: &'a str,
    pub headers: BTreeMap<&'static str, &'static str>,
    pub body: &'a EventPayload,
}

/// Body of a `$batch` response.
#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponseBody {
    #[serde(default)]
    pub responses: Vec<BatchResponseItem>,
}

/// One sub-response of a `$batch` call.
#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponseItem {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}

/// Builds the `$batch` body creating every event of `batch` under `events_path`.
pub(crate) fn encode_batch<'a>(batch: &'a Batch, events_path: &'a str) -> BatchRequestBody<'a> {
    let requests = batch
        .requests()
        .iter()
        .map(|request| BatchRequestItem {
            id: request.tag.as_str(),
            method: "POST",
            url: events_path,
            headers: BTreeMap::from([("Content-Type", "application/json")]),
            body: &request.payload,
        })
        .collect();

    BatchRequestBody { requests }
}

/// Parses a `$batch` response body.
pub(crate) fn parse_batch_response(body: &str) -> ProviderResult<BatchResponseBody> {
    serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse batch response: {}", e))
            .with_source(e)
    })
}

/// Maps sub-responses back to the tags of `batch`.
///
/// Sub-responses whose id is not part of the batch, and repeated ids after
/// the first, are dropped with a warning. Tags without a sub-response are
/// simply absent from the outcome.
pub(crate) fn demultiplex(batch: &Batch, response: BatchResponseBody) -> BatchOutcome {
    let mut outcome = BatchOutcome::new();

    for item in response.responses {
        let tag = RequestTag::new(item.id);
        if !batch.contains_tag(&tag) {
            warn!(tag = %tag, "ignoring response for a request not in this batch");
            continue;
        }
        if outcome.contains_key(&tag) {
            warn!(tag = %tag, "ignoring duplicate response");
            continue;
        }
        outcome.insert(tag, ItemOutcome::new(item.status, item.body));
    }

    let missing = batch.tags().filter(|t| !outcome.contains_key(*t)).count();
    if missing > 0 {
        warn!(missing, "batch response is missing sub-responses");
    }

    outcome
}
