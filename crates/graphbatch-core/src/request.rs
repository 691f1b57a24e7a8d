//! Pending event-creation requests and the request builder.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{DateTimeTimeZone, EventPayload, ItemBody, Location};

/// Location attached to every generated event.
pub const DEFAULT_LOCATION: &str = "Dummy location";

/// Length of every generated event.
pub const EVENT_DURATION_MINUTES: i64 = 30;

/// Label correlating a sub-request with its sub-response inside one batch.
///
/// Tags compare numerically when both parse as unsigned integers, so `"9"`
/// orders before `"10"`. Numeric tags sort before non-numeric ones, which
/// compare lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestTag(String);

impl RequestTag {
    /// Creates a tag from arbitrary text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Creates the tag for a source index.
    pub fn from_index(index: usize) -> Self {
        Self(index.to_string())
    }

    /// Returns the tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for RequestTag {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for RequestTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// One event-creation request waiting to be batched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Correlation tag, unique within the batch carrying this request.
    pub tag: RequestTag,
    /// The event to create.
    pub payload: EventPayload,
}

impl PendingRequest {
    /// Creates a pending request.
    pub fn new(tag: RequestTag, payload: EventPayload) -> Self {
        Self { tag, payload }
    }
}

/// Builds the event for source index `index`, anchored at `now`.
pub fn build_event(index: usize, now: DateTime<Utc>) -> EventPayload {
    let start = now + Duration::hours(index as i64);
    let end = start + Duration::minutes(EVENT_DURATION_MINUTES);

    EventPayload {
        subject: format!("Subject{}", index),
        body: ItemBody::html(format!("Content{}", index)),
        start: DateTimeTimeZone::utc(start),
        end: DateTimeTimeZone::utc(end),
        location: Location::new(DEFAULT_LOCATION),
    }
}

/// Builds `count` requests tagged `"0"` through `"count-1"`.
///
/// Event `i` starts `i` hours after `now` and lasts
/// [`EVENT_DURATION_MINUTES`].
pub fn build_requests(count: usize, now: DateTime<Utc>) -> Vec<PendingRequest> {
    (0..count)
        .map(|i| PendingRequest::new(RequestTag::from_index(i), build_event(i, now)))
        .collect()
}
