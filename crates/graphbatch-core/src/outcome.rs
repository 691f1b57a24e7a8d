//! Per-item batch outcomes and created-resource collection.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::request::RequestTag;

/// How much of a response body is shown in logs.
pub const BODY_PREVIEW_LEN: usize = 255;

/// The result of one sub-request inside a batch response.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    /// HTTP status code of the sub-response.
    pub status: u16,
    /// Sub-response body, `Value::Null` when absent.
    pub body: Value,
}

impl ItemOutcome {
    /// Creates an outcome.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the `id` field of an object body.
    pub fn resource_id(&self) -> Option<&str> {
        self.body.as_object()?.get("id")?.as_str()
    }

    /// Returns the body as text, truncated for logging.
    pub fn body_preview(&self) -> String {
        let text = match &self.body {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        ellipsis(&text, BODY_PREVIEW_LEN).into_owned()
    }
}

/// Outcomes of one submitted batch, keyed by request tag.
///
/// Iteration is in ascending tag order.
pub type BatchOutcome = BTreeMap<RequestTag, ItemOutcome>;

/// A remote resource that was created and must later be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreatedResource {
    /// Remote identifier.
    pub id: String,
}

impl CreatedResource {
    /// Creates a resource reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Result of collecting one batch outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    /// Resources created by the batch, in tag order.
    pub created: Vec<CreatedResource>,
    /// Tags whose sub-request did not yield a resource.
    pub skipped: Vec<RequestTag>,
}

/// Extracts created resources from a batch outcome.
///
/// Tags with a non-success status, or a success body lacking a string `id`,
/// are logged and skipped.
pub fn collect(outcome: &BatchOutcome) -> Vec<CreatedResource> {
    collect_with_summary(outcome).created
}

/// Like [`collect`], also reporting which tags were skipped.
pub fn collect_with_summary(outcome: &BatchOutcome) -> CollectSummary {
    let mut summary = CollectSummary::default();

    for (tag, item) in outcome {
        debug!(tag = %tag, status = item.status, body = %item.body_preview(), "batch item response");

        if !item.is_success() {
            warn!(tag = %tag, status = item.status, body = %item.body_preview(), "item failed");
            summary.skipped.push(tag.clone());
            continue;
        }

        match item.resource_id() {
            Some(id) => summary.created.push(CreatedResource::new(id)),
            None => {
                warn!(tag = %tag, status = item.status, "success response without an id");
                summary.skipped.push(tag.clone());
            }
        }
    }

    summary
}

/// Truncates `s` to at most `max_len` characters, ending with `...` when cut.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated))
}
