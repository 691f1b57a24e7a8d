//! Core types: event payloads, request batching, outcome collection
//!
//! The pipeline this crate models is:
//!
//! ```text
//! build_requests() ──► partition() ──► [submit per batch] ──► collect()
//!  PendingRequest        Batch            BatchOutcome        CreatedResource
//! ```
//!
//! Submission itself lives in `graphbatch-providers`; everything here is
//! pure and deterministic given an injected clock.

pub mod batch;
pub mod event;
pub mod outcome;
pub mod request;
pub mod tracing;

pub use batch::{partition, Batch, BatchError, MAX_BATCH_SIZE};
pub use event::{BodyType, DateTimeTimeZone, EventPayload, ItemBody, Location};
pub use outcome::{
    collect, collect_with_summary, ellipsis, BatchOutcome, CollectSummary, CreatedResource,
    ItemOutcome,
};
pub use request::{build_event, build_requests, PendingRequest, RequestTag};
pub use crate::tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
