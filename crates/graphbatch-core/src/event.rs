//! Calendar event payloads.
//!
//! This module provides the subset of the Microsoft Graph `event` resource
//! that graphbatch creates:
//! - [`EventPayload`]: The JSON body of an event-creation request
//! - [`ItemBody`]: Event body content and its content type
//! - [`DateTimeTimeZone`]: A wall-clock time paired with an explicit zone
//! - [`Location`]: The display location of an event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used for `dateTime` values (no offset, the zone is carried separately).
pub const GRAPH_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Zone identifier attached to every generated time.
pub const UTC_ZONE: &str = "UTC";

/// Content type of an event body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// Plain text.
    Text,
    /// HTML markup.
    #[default]
    Html,
}

/// The body of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    /// How `content` should be interpreted.
    pub content_type: BodyType,
    /// The body content.
    pub content: String,
}

impl ItemBody {
    /// Creates an HTML body.
    pub fn html(content: impl Into<String>) -> Self {
        Self {
            content_type: BodyType::Html,
            content: content.into(),
        }
    }
}

/// A date and time with an explicit time zone designator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    /// Local wall-clock time in [`GRAPH_DATETIME_FORMAT`].
    pub date_time: String,
    /// Zone the wall-clock time is expressed in.
    pub time_zone: String,
}

impl DateTimeTimeZone {
    /// Expresses a UTC instant with the `UTC` zone designator.
    ///
    /// Sub-second precision is dropped.
    pub fn utc(at: DateTime<Utc>) -> Self {
        Self {
            date_time: at.format(GRAPH_DATETIME_FORMAT).to_string(),
            time_zone: UTC_ZONE.to_string(),
        }
    }
}

/// The location of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Human-readable location name.
    pub display_name: String,
}

impl Location {
    /// Creates a location with the given display name.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

/// The payload of an event-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// Event title.
    pub subject: String,
    /// Event body.
    pub body: ItemBody,
    /// When the event starts.
    pub start: DateTimeTimeZone,
    /// When the event ends.
    pub end: DateTimeTimeZone,
    /// Where the event takes place.
    pub location: Location,
}
