//! Partitioning pending requests into bounded batches.
//!
//! A [`Batch`] is what goes out as a single `$batch` call. Batches are
//! produced by [`partition`] and cannot be modified afterwards.

use thiserror::Error;

use crate::request::{PendingRequest, RequestTag};

/// Maximum number of sub-requests the remote API accepts in one batch.
pub const MAX_BATCH_SIZE: usize = 20;

/// Errors raised while building batches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// A batch size of zero can never make progress.
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
}

/// An ordered, non-empty group of requests submitted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    requests: Vec<PendingRequest>,
}

impl Batch {
    /// Returns the requests in submission order.
    pub fn requests(&self) -> &[PendingRequest] {
        &self.requests
    }

    /// Returns the number of requests in this batch.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Returns true if `tag` belongs to a request in this batch.
    pub fn contains_tag(&self, tag: &RequestTag) -> bool {
        self.requests.iter().any(|r| &r.tag == tag)
    }

    /// Iterates over the tags in submission order.
    pub fn tags(&self) -> impl Iterator<Item = &RequestTag> {
        self.requests.iter().map(|r| &r.tag)
    }

    /// Consumes the batch, returning its requests.
    pub fn into_requests(self) -> Vec<PendingRequest> {
        self.requests
    }
}

/// Splits `requests` into batches of at most `max_size` items.
///
/// A new batch starts each time the current one holds `max_size` requests,
/// so concatenating the output reproduces the input and the number of
/// batches is `ceil(len / max_size)`. An empty input yields no batches.
pub fn partition(
    requests: Vec<PendingRequest>,
    max_size: usize,
) -> Result<Vec<Batch>, BatchError> {
    if max_size == 0 {
        return Err(BatchError::ZeroBatchSize);
    }

    let mut batches = Vec::with_capacity(requests.len().div_ceil(max_size));
    let mut current = Vec::with_capacity(max_size.min(requests.len()));

    for request in requests {
        current.push(request);
        if current.len() == max_size {
            batches.push(Batch {
                requests: std::mem::replace(&mut current, Vec::with_capacity(max_size)),
            });
        }
    }

    if !current.is_empty() {
        batches.push(Batch { requests: current });
    }

    Ok(batches)
}
