//! The create-then-delete workflow.
//!
//! ```text
//! Idle ─► TokenAcquired ─► RequestsBuilt ─► Batching
//!                                              │
//!            ┌─────────────────────────────────┘
//!            ▼
//!   (Submitting ─► OutcomeReceived)* ─► AllBatchesDone ─► AwaitingConfirmation
//!                                                               │
//!                                           Done ◄─ Deleting ◄──┘
//! ```
//!
//! Any state can fall into `Aborted` on authentication failure or
//! cancellation. Batches and deletions run strictly one after another.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use graphbatch_core::{
    Batch, CreatedResource, RequestTag, build_requests, collect_with_summary, partition,
};
use graphbatch_providers::{
    CalendarBatchApi, Credential, ProviderError, ProviderResult, TokenProvider,
};

use crate::cancel::CancelToken;
use crate::console::Confirmation;
use crate::error::{ClientError, ClientResult};

/// Prompt shown before deleting the created events.
pub const CLEANUP_PROMPT: &str = "Events created. Press enter to remove them from the calendar.";

/// Where the workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    TokenAcquired,
    RequestsBuilt,
    Batching,
    Submitting,
    OutcomeReceived,
    AllBatchesDone,
    AwaitingConfirmation,
    Deleting,
    Done,
    Aborted,
}

impl WorkflowPhase {
    /// Returns the phase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TokenAcquired => "token_acquired",
            Self::RequestsBuilt => "requests_built",
            Self::Batching => "batching",
            Self::Submitting => "submitting",
            Self::OutcomeReceived => "outcome_received",
            Self::AllBatchesDone => "all_batches_done",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Deleting => "deleting",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logs every phase transition.
#[derive(Debug)]
struct PhaseTracker {
    phase: WorkflowPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: WorkflowPhase::Idle,
        }
    }

    fn enter(&mut self, next: WorkflowPhase) {
        debug!(from = %self.phase, to = %next, "workflow phase");
        self.phase = next;
    }
}

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Number of events to create.
    pub count: usize,
    /// Maximum requests per `$batch` call.
    pub batch_size: usize,
    /// Skip cleanup and leave the events in place.
    pub keep: bool,
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// What happened to one batch.
#[derive(Debug)]
pub enum BatchStatus {
    /// The `$batch` call succeeded; individual items may still have failed.
    Completed {
        created: usize,
        failed: Vec<RequestTag>,
    },
    /// The `$batch` call itself failed; nothing from it was created.
    TransportFailed { error: ProviderError },
    /// Cancellation arrived before this batch was sent.
    NotSubmitted,
}

/// Report for one batch, in submission order.
#[derive(Debug)]
pub struct BatchReport {
    /// Zero-based batch index.
    pub index: usize,
    /// Number of requests in the batch.
    pub size: usize,
    pub status: BatchStatus,
}

impl BatchReport {
    /// Number of requests that did not produce a resource.
    pub fn item_failures(&self) -> usize {
        match self.status {
            BatchStatus::Completed { ref failed, .. } => failed.len(),
            _ => 0,
        }
    }

    /// Returns true if the batch call failed at the transport level.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self.status, BatchStatus::TransportFailed { .. })
    }
}

/// Result of the submission loop.
#[derive(Debug, Default)]
pub struct SubmissionReport {
    pub batches: Vec<BatchReport>,
    /// Created resources, in batch submission order then tag order.
    pub created: Vec<CreatedResource>,
    pub cancelled: bool,
}

impl SubmissionReport {
    /// Total item-level failures across completed batches.
    pub fn item_failures(&self) -> usize {
        self.batches.iter().map(BatchReport::item_failures).sum()
    }

    /// Number of batches whose call failed outright.
    pub fn failed_batches(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_transport_failure())
            .count()
    }
}

/// Submits `batches` one at a time and accumulates created resources.
///
/// A transport failure is logged and the batch contributes nothing; the
/// loop moves on. Tags missing from a batch response count as failures.
/// Cancellation is checked before each batch.
pub async fn submit_batches(
    api: &dyn CalendarBatchApi,
    batches: Vec<Batch>,
    credential: &Credential,
    cancel: &CancelToken,
) -> SubmissionReport {
    submit_tracked(api, batches, credential, cancel, &mut PhaseTracker::new()).await
}

async fn submit_tracked(
    api: &dyn CalendarBatchApi,
    batches: Vec<Batch>,
    credential: &Credential,
    cancel: &CancelToken,
    phases: &mut PhaseTracker,
) -> SubmissionReport {
    let mut report = SubmissionReport::default();
    let total = batches.len();

    for (index, batch) in batches.into_iter().enumerate() {
        let size = batch.len();

        if report.cancelled || cancel.is_cancelled() {
            report.cancelled = true;
            report.batches.push(BatchReport {
                index,
                size,
                status: BatchStatus::NotSubmitted,
            });
            continue;
        }

        phases.enter(WorkflowPhase::Submitting);
        println!("Submitting batch {}/{} ({} events)...", index + 1, total, size);

        let status = match api.submit_batch(&batch, credential).await {
            Ok(outcome) => {
                phases.enter(WorkflowPhase::OutcomeReceived);
                let mut summary = collect_with_summary(&outcome);
                for tag in batch.tags().filter(|t| !outcome.contains_key(*t)) {
                    warn!(batch = index, tag = %tag, "no response for request");
                    summary.skipped.push(tag.clone());
                }
                summary.skipped.sort();

                let created = summary.created.len();
                println!(
                    "  batch {}: {} created, {} failed",
                    index + 1,
                    created,
                    summary.skipped.len()
                );
                report.created.extend(summary.created);
                BatchStatus::Completed {
                    created,
                    failed: summary.skipped,
                }
            }
            Err(error) => {
                phases.enter(WorkflowPhase::OutcomeReceived);
                error!(batch = index, size, transient = error.is_transient(), error = %error, "batch submission failed");
                println!("  batch {}: failed: {}", index + 1, error);
                BatchStatus::TransportFailed { error }
            }
        };

        report.batches.push(BatchReport {
            index,
            size,
            status,
        });
    }

    report
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// Result of the deletion loop.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// One entry per attempted deletion, in order.
    pub results: Vec<(CreatedResource, ProviderResult<()>)>,
    /// Resources not attempted because of cancellation.
    pub skipped: Vec<CreatedResource>,
}

impl CleanupReport {
    /// Number of deletions issued.
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Number of deletions that succeeded.
    pub fn removed(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    /// Failed deletions with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&CreatedResource, &ProviderError)> {
        self.results
            .iter()
            .filter_map(|(resource, result)| result.as_ref().err().map(|e| (resource, e)))
    }

    /// Returns true if every resource was deleted.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.removed() == self.attempted()
    }
}

/// Deletes `resources` one at a time.
///
/// A failed deletion is recorded and the loop continues. Cancellation stops
/// the loop before the next deletion; the rest are reported as skipped.
pub async fn cleanup(
    api: &dyn CalendarBatchApi,
    resources: Vec<CreatedResource>,
    credential: &Credential,
    cancel: &CancelToken,
) -> CleanupReport {
    let mut report = CleanupReport::default();
    let total = resources.len();
    let mut remaining = resources.into_iter();

    for (index, resource) in remaining.by_ref().enumerate() {
        if cancel.is_cancelled() {
            report.skipped.push(resource);
            break;
        }

        let result = api.delete_event(&resource.id, credential).await;
        match result {
            Ok(()) => debug!(id = %resource.id, "event deleted"),
            Err(ref e) => warn!(id = %resource.id, error = %e, "failed to delete event"),
        }
        println!("{}", deletion_progress(index + 1, total, &resource, &result));
        report.results.push((resource, result));
    }

    report.skipped.extend(remaining);
    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "cleanup cancelled");
    }

    report
}

/// One console line per deletion.
fn deletion_progress(
    position: usize,
    total: usize,
    resource: &CreatedResource,
    result: &ProviderResult<()>,
) -> String {
    match result {
        Ok(()) => format!("  deleted {}/{}: {}", position, total, resource.id),
        Err(e) => format!("  delete {}/{} failed: {}: {}", position, total, resource.id, e),
    }
}

// ---------------------------------------------------------------------------
// Whole run
// ---------------------------------------------------------------------------

/// What happened to the created events.
#[derive(Debug)]
pub enum CleanupDisposition {
    /// Nothing was created, so nothing needed deleting.
    NothingCreated,
    /// `--keep` was given.
    Kept(Vec<CreatedResource>),
    /// The confirmation was declined.
    Declined(Vec<CreatedResource>),
    /// The run was cancelled before cleanup started.
    Cancelled(Vec<CreatedResource>),
    /// Cleanup ran.
    Ran(CleanupReport),
}

impl CleanupDisposition {
    /// Resources still present in the calendar after the run.
    pub fn leftovers(&self) -> Vec<&CreatedResource> {
        match self {
            Self::NothingCreated => Vec::new(),
            Self::Kept(r) | Self::Declined(r) | Self::Cancelled(r) => r.iter().collect(),
            Self::Ran(report) => report
                .failures()
                .map(|(resource, _)| resource)
                .chain(report.skipped.iter())
                .collect(),
        }
    }
}

/// Totals for one run.
#[derive(Debug)]
pub struct RunSummary {
    pub requested: usize,
    pub batches: usize,
    pub created: usize,
    pub item_failures: usize,
    pub failed_batches: usize,
    pub disposition: CleanupDisposition,
    pub cancelled: bool,
}

impl RunSummary {
    /// Returns true if every step succeeded and nothing was left behind
    /// unintentionally.
    pub fn is_clean(&self) -> bool {
        if self.cancelled || self.item_failures > 0 || self.failed_batches > 0 {
            return false;
        }
        match self.disposition {
            CleanupDisposition::NothingCreated | CleanupDisposition::Kept(_) => true,
            CleanupDisposition::Ran(ref report) => report.is_complete(),
            CleanupDisposition::Declined(_) | CleanupDisposition::Cancelled(_) => false,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  requested:      {}", self.requested)?;
        writeln!(f, "  batches:        {}", self.batches)?;
        writeln!(f, "  created:        {}", self.created)?;
        writeln!(f, "  item failures:  {}", self.item_failures)?;
        writeln!(f, "  failed batches: {}", self.failed_batches)?;
        match self.disposition {
            CleanupDisposition::NothingCreated => writeln!(f, "  cleanup:        nothing to delete")?,
            CleanupDisposition::Kept(_) => writeln!(f, "  cleanup:        skipped (--keep)")?,
            CleanupDisposition::Declined(_) => writeln!(f, "  cleanup:        declined")?,
            CleanupDisposition::Cancelled(_) => writeln!(f, "  cleanup:        cancelled")?,
            CleanupDisposition::Ran(ref report) => {
                writeln!(f, "  deletions:      {} attempted", report.attempted())?;
                writeln!(f, "  removed:        {}", report.removed())?;
                writeln!(f, "  delete failures: {}", report.attempted() - report.removed())?;
                if !report.skipped.is_empty() {
                    writeln!(f, "  not attempted:  {}", report.skipped.len())?;
                }
            }
        }

        let leftovers = self.disposition.leftovers();
        if !leftovers.is_empty() {
            writeln!(f, "Events left in the calendar:")?;
            for resource in leftovers {
                writeln!(f, "  {}", resource.id)?;
            }
        }
        Ok(())
    }
}

/// Runs token acquisition, submission, confirmation and cleanup.
///
/// Returns `Err` only for fatal failures (authentication, invalid batch
/// size); everything else is reported in the [`RunSummary`].
pub async fn run_workflow(
    tokens: &dyn TokenProvider,
    api: &dyn CalendarBatchApi,
    confirmation: &mut dyn Confirmation,
    cancel: &CancelToken,
    options: &WorkflowOptions,
    now: DateTime<Utc>,
) -> ClientResult<RunSummary> {
    let mut phases = PhaseTracker::new();

    println!("Getting token...");
    let credential = match tokens.acquire_token().await {
        Ok(credential) => credential,
        Err(e) => {
            phases.enter(WorkflowPhase::Aborted);
            return Err(ClientError::Authentication(e));
        }
    };
    phases.enter(WorkflowPhase::TokenAcquired);
    info!(provider = tokens.name(), "token acquired");

    let requests = build_requests(options.count, now);
    phases.enter(WorkflowPhase::RequestsBuilt);

    phases.enter(WorkflowPhase::Batching);
    let batches = match partition(requests, options.batch_size) {
        Ok(batches) => batches,
        Err(e) => {
            phases.enter(WorkflowPhase::Aborted);
            return Err(e.into());
        }
    };
    let batch_count = batches.len();

    println!(
        "Creating {} events in {} batches...",
        options.count, batch_count
    );
    let submission = submit_tracked(api, batches, &credential, cancel, &mut phases).await;
    phases.enter(WorkflowPhase::AllBatchesDone);

    let item_failures = submission.item_failures();
    let failed_batches = submission.failed_batches();
    let created = submission.created.len();
    let mut cancelled = submission.cancelled;
    let resources = submission.created;

    let disposition = if cancelled {
        phases.enter(WorkflowPhase::Aborted);
        CleanupDisposition::Cancelled(resources)
    } else if resources.is_empty() {
        CleanupDisposition::NothingCreated
    } else if options.keep {
        info!(created, "keeping created events");
        CleanupDisposition::Kept(resources)
    } else {
        phases.enter(WorkflowPhase::AwaitingConfirmation);
        let answer = tokio::select! {
            answer = confirmation.confirm(CLEANUP_PROMPT) => Some(answer),
            _ = cancel.cancelled() => None,
        };

        match answer {
            None => {
                cancelled = true;
                phases.enter(WorkflowPhase::Aborted);
                CleanupDisposition::Cancelled(resources)
            }
            Some(false) => {
                info!(created, "cleanup declined");
                CleanupDisposition::Declined(resources)
            }
            Some(true) => {
                phases.enter(WorkflowPhase::Deleting);
                if credential.is_expired() {
                    warn!("access token has expired, deletions are likely to fail");
                }
                println!("Removing {} events...", resources.len());
                let report = cleanup(api, resources, &credential, cancel).await;
                println!(
                    "{} events were removed from the calendar.",
                    report.removed()
                );
                if !report.skipped.is_empty() {
                    cancelled = true;
                    phases.enter(WorkflowPhase::Aborted);
                }
                CleanupDisposition::Ran(report)
            }
        }
    };

    if !cancelled {
        phases.enter(WorkflowPhase::Done);
    }

    Ok(RunSummary {
        requested: options.count,
        batches: batch_count,
        created,
        item_failures,
        failed_batches,
        disposition,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Mutex;

    use chrono::TimeZone;
    use graphbatch_core::{BatchOutcome, ItemOutcome};
    use graphbatch_providers::{BoxFuture, ProviderErrorCode};
    use serde_json::json;

    use crate::cancel::CancelHandler;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn options(count: usize, batch_size: usize) -> WorkflowOptions {
        WorkflowOptions {
            count,
            batch_size,
            keep: false,
        }
    }

    struct FakeTokens {
        fail: bool,
    }

    impl TokenProvider for FakeTokens {
        fn name(&self) -> &str {
            "fake"
        }

        fn acquire_token(&self) -> BoxFuture<'_, ProviderResult<Credential>> {
            Box::pin(async move {
                if self.fail {
                    Err(ProviderError::authentication("invalid_client"))
                } else {
                    Ok(Credential::new("token"))
                }
            })
        }
    }

    #[derive(Default)]
    struct FakeApi {
        /// Batch sizes in submission order.
        submitted: Mutex<Vec<usize>>,
        /// Deleted ids in order.
        deleted: Mutex<Vec<String>>,
        /// Submission indexes that fail at the transport level.
        failing_batches: HashSet<usize>,
        /// Per-tag status override.
        item_status: HashMap<String, u16>,
        /// Tags left out of the batch response.
        dropped_tags: HashSet<String>,
        /// Ids whose deletion fails.
        failing_deletes: HashSet<String>,
        /// Trigger cancellation after this many submissions.
        cancel_after_submissions: Option<(usize, CancelHandler)>,
        /// Trigger cancellation after this many deletions.
        cancel_after_deletes: Option<(usize, CancelHandler)>,
    }

    impl CalendarBatchApi for FakeApi {
        fn name(&self) -> &str {
            "fake"
        }

        fn submit_batch<'a>(
            &'a self,
            batch: &'a Batch,
            _credential: &'a Credential,
        ) -> BoxFuture<'a, ProviderResult<BatchOutcome>> {
            Box::pin(async move {
                let index = {
                    let mut submitted = self.submitted.lock().unwrap();
                    submitted.push(batch.len());
                    submitted.len() - 1
                };
                if let Some((after, ref handler)) = self.cancel_after_submissions {
                    if index + 1 >= after {
                        handler.trigger();
                    }
                }
                if self.failing_batches.contains(&index) {
                    return Err(ProviderError::server("503 Service Unavailable"));
                }

                let mut outcome = BatchOutcome::new();
                for tag in batch.tags() {
                    if self.dropped_tags.contains(tag.as_str()) {
                        continue;
                    }
                    let status = self.item_status.get(tag.as_str()).copied().unwrap_or(201);
                    let body = if status == 201 {
                        json!({ "id": format!("evt-{}", tag) })
                    } else {
                        json!({ "error": { "code": "Failed" } })
                    };
                    outcome.insert(tag.clone(), ItemOutcome::new(status, body));
                }
                Ok(outcome)
            })
        }

        fn delete_event<'a>(
            &'a self,
            event_id: &'a str,
            _credential: &'a Credential,
        ) -> BoxFuture<'a, ProviderResult<()>> {
            Box::pin(async move {
                let count = {
                    let mut deleted = self.deleted.lock().unwrap();
                    deleted.push(event_id.to_string());
                    deleted.len()
                };
                if let Some((after, ref handler)) = self.cancel_after_deletes {
                    if count >= after {
                        handler.trigger();
                    }
                }
                if self.failing_deletes.contains(event_id) {
                    Err(ProviderError::not_found(format!("{} not found", event_id)))
                } else {
                    Ok(())
                }
            })
        }
    }

    /// Answers prompts from a script; declines when it runs out.
    struct Scripted {
        answers: VecDeque<bool>,
        prompts: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                prompts: Vec::new(),
            }
        }
    }

    impl Confirmation for Scripted {
        fn confirm<'a>(&'a mut self, prompt: &'a str) -> BoxFuture<'a, bool> {
            Box::pin(async move {
                self.prompts.push(prompt.to_string());
                self.answers.pop_front().unwrap_or(false)
            })
        }
    }

    /// Never answers.
    struct Silent;

    impl Confirmation for Silent {
        fn confirm<'a>(&'a mut self, _prompt: &'a str) -> BoxFuture<'a, bool> {
            Box::pin(std::future::pending())
        }
    }

    async fn run(api: &FakeApi, confirm: &mut dyn Confirmation, opts: WorkflowOptions) -> RunSummary {
        run_workflow(
            &FakeTokens { fail: false },
            api,
            confirm,
            &CancelToken::never(),
            &opts,
            now(),
        )
        .await
        .unwrap()
    }

    fn ran(summary: &RunSummary) -> &CleanupReport {
        match summary.disposition {
            CleanupDisposition::Ran(ref report) => report,
            ref other => panic!("cleanup did not run: {:?}", other),
        }
    }

    #[tokio::test]
    async fn end_to_end_45_in_batches_of_20() {
        let api = FakeApi::default();
        let mut confirm = Scripted::new(&[true]);

        let summary = run(&api, &mut confirm, options(45, 20)).await;

        assert_eq!(*api.submitted.lock().unwrap(), vec![20, 20, 5]);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.created, 45);
        let report = ran(&summary);
        assert_eq!(report.attempted(), 45);
        assert_eq!(report.removed(), 45);
        assert!(summary.is_clean());
        assert_eq!(confirm.prompts, vec![CLEANUP_PROMPT.to_string()]);

        let deleted = api.deleted.lock().unwrap();
        assert_eq!(deleted.first().map(String::as_str), Some("evt-0"));
        assert_eq!(deleted.last().map(String::as_str), Some("evt-44"));
    }

    #[tokio::test]
    async fn transport_failure_skips_only_that_batch() {
        let api = FakeApi {
            failing_batches: HashSet::from([1]),
            ..Default::default()
        };
        let mut confirm = Scripted::new(&[true]);

        let summary = run(&api, &mut confirm, options(45, 20)).await;

        assert_eq!(*api.submitted.lock().unwrap(), vec![20, 20, 5]);
        assert_eq!(summary.created, 25);
        assert_eq!(summary.failed_batches, 1);
        assert_eq!(ran(&summary).attempted(), 25);
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn item_failures_are_excluded_and_counted() {
        let api = FakeApi {
            item_status: HashMap::from([("5".to_string(), 404), ("7".to_string(), 409)]),
            dropped_tags: HashSet::from(["9".to_string()]),
            ..Default::default()
        };
        let credential = Credential::new("token");
        let batches = partition(build_requests(10, now()), 20).unwrap();

        let report = submit_batches(&api, batches, &credential, &CancelToken::never()).await;

        assert_eq!(report.created.len(), 7);
        assert_eq!(report.item_failures(), 3);
        match report.batches[0].status {
            BatchStatus::Completed {
                created,
                ref failed,
            } => {
                assert_eq!(created, 7);
                let tags: Vec<&str> = failed.iter().map(RequestTag::as_str).collect();
                assert_eq!(tags, vec!["5", "7", "9"]);
            }
            ref other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn cleanup_continues_past_failures() {
        let api = FakeApi {
            failing_deletes: HashSet::from(["b".to_string(), "d".to_string()]),
            ..Default::default()
        };
        let resources: Vec<CreatedResource> =
            ["a", "b", "c", "d", "e"].into_iter().map(CreatedResource::new).collect();

        let report = cleanup(
            &api,
            resources,
            &Credential::new("token"),
            &CancelToken::never(),
        )
        .await;

        assert_eq!(report.attempted(), 5);
        assert_eq!(report.removed(), 3);
        let failed: Vec<&str> = report.failures().map(|(r, _)| r.id.as_str()).collect();
        assert_eq!(failed, vec!["b", "d"]);
        assert_eq!(
            report.failures().next().map(|(_, e)| e.code()),
            Some(ProviderErrorCode::NotFound)
        );
        assert!(!report.is_complete());
    }

    #[test]
    fn deletion_progress_lines() {
        let resource = CreatedResource::new("evt-3");
        assert_eq!(
            deletion_progress(3, 40, &resource, &Ok(())),
            "  deleted 3/40: evt-3"
        );

        let failed = Err(ProviderError::not_found("gone"));
        assert_eq!(
            deletion_progress(4, 40, &resource, &failed),
            "  delete 4/40 failed: evt-3: not_found: gone"
        );
    }

    #[tokio::test]
    async fn authentication_failure_is_fatal() {
        let api = FakeApi::default();
        let err = run_workflow(
            &FakeTokens { fail: true },
            &api,
            &mut Scripted::new(&[true]),
            &CancelToken::never(),
            &options(10, 20),
            now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Authentication(_)));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_batch_size_is_fatal() {
        let err = run_workflow(
            &FakeTokens { fail: false },
            &FakeApi::default(),
            &mut Scripted::new(&[]),
            &CancelToken::never(),
            &options(10, 0),
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::Batch(_)));
    }

    #[tokio::test]
    async fn declined_confirmation_keeps_events() {
        let api = FakeApi::default();
        let mut confirm = Scripted::new(&[false]);

        let summary = run(&api, &mut confirm, options(3, 20)).await;

        assert!(api.deleted.lock().unwrap().is_empty());
        assert!(matches!(summary.disposition, CleanupDisposition::Declined(ref r) if r.len() == 3));
        assert_eq!(summary.disposition.leftovers().len(), 3);
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn keep_skips_prompt_and_cleanup() {
        let api = FakeApi::default();
        let mut confirm = Scripted::new(&[true]);
        let opts = WorkflowOptions {
            keep: true,
            ..options(3, 20)
        };

        let summary = run(&api, &mut confirm, opts).await;

        assert!(confirm.prompts.is_empty());
        assert!(api.deleted.lock().unwrap().is_empty());
        assert!(matches!(summary.disposition, CleanupDisposition::Kept(_)));
        assert!(summary.is_clean());
    }

    #[tokio::test]
    async fn zero_count_creates_nothing() {
        let api = FakeApi::default();
        let mut confirm = Scripted::new(&[true]);

        let summary = run(&api, &mut confirm, options(0, 20)).await;

        assert_eq!(summary.batches, 0);
        assert!(api.submitted.lock().unwrap().is_empty());
        assert!(confirm.prompts.is_empty());
        assert!(matches!(summary.disposition, CleanupDisposition::NothingCreated));
        assert!(summary.is_clean());
    }

    #[tokio::test]
    async fn cancellation_stops_before_next_batch() {
        let handler = CancelHandler::new();
        let cancel = handler.token();
        let api = FakeApi {
            cancel_after_submissions: Some((1, handler)),
            ..Default::default()
        };

        let summary = run_workflow(
            &FakeTokens { fail: false },
            &api,
            &mut Scripted::new(&[true]),
            &cancel,
            &options(45, 20),
            now(),
        )
        .await
        .unwrap();

        assert_eq!(*api.submitted.lock().unwrap(), vec![20]);
        assert!(summary.cancelled);
        assert_eq!(summary.created, 20);
        assert!(api.deleted.lock().unwrap().is_empty());
        assert!(matches!(summary.disposition, CleanupDisposition::Cancelled(ref r) if r.len() == 20));
    }

    #[tokio::test]
    async fn cancellation_stops_cleanup() {
        let handler = CancelHandler::new();
        let cancel = handler.token();
        let api = FakeApi {
            cancel_after_deletes: Some((2, handler)),
            ..Default::default()
        };

        let summary = run_workflow(
            &FakeTokens { fail: false },
            &api,
            &mut Scripted::new(&[true]),
            &cancel,
            &options(5, 20),
            now(),
        )
        .await
        .unwrap();

        assert!(summary.cancelled);
        let report = ran(&summary);
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(summary.disposition.leftovers().len(), 3);
    }

    #[tokio::test]
    async fn cancellation_interrupts_prompt() {
        let handler = CancelHandler::new();
        let cancel = handler.token();
        let api = FakeApi::default();
        let mut silent = Silent;

        let trigger = async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            handler.trigger();
        };
        let opts = options(2, 20);
        let workflow = run_workflow(
            &FakeTokens { fail: false },
            &api,
            &mut silent,
            &cancel,
            &opts,
            now(),
        );

        let (summary, ()) = tokio::join!(workflow, trigger);
        let summary = summary.unwrap();

        assert!(summary.cancelled);
        assert!(matches!(summary.disposition, CleanupDisposition::Cancelled(_)));
        assert!(api.deleted.lock().unwrap().is_empty());
    }

    #[test]
    fn summary_lists_leftovers() {
        let summary = RunSummary {
            requested: 2,
            batches: 1,
            created: 2,
            item_failures: 0,
            failed_batches: 0,
            disposition: CleanupDisposition::Declined(vec![
                CreatedResource::new("evt-0"),
                CreatedResource::new("evt-1"),
            ]),
            cancelled: false,
        };

        let text = summary.to_string();
        assert!(text.contains("declined"));
        assert!(text.contains("  evt-0\n"));
        assert!(text.contains("  evt-1\n"));
    }
}
