//! The default command: create events in batches, then delete them.

use chrono::Utc;
use tracing::info;

use graphbatch_providers::graph::{ClientCredentialsClient, GraphCalendarClient};

use crate::cancel::CancelToken;
use crate::config::EffectiveConfig;
use crate::console::{AutoConfirm, Confirmation, StdinConfirmation};
use crate::error::{ClientError, ClientResult};
use crate::workflow::{RunSummary, WorkflowOptions, run_workflow};

/// Prompt shown before the process exits.
pub const EXIT_PROMPT: &str = "Press enter to exit.";

/// Console behaviour for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    /// Skip both pauses.
    pub assume_yes: bool,
    /// Leave the created events in place.
    pub keep: bool,
}

/// Runs the workflow against Microsoft Graph and prints the summary.
pub async fn run(
    config: &EffectiveConfig,
    flags: RunFlags,
    cancel: &CancelToken,
) -> ClientResult<RunSummary> {
    let settings = config
        .graph
        .to_provider_settings()
        .map_err(ClientError::Config)?;

    let tokens = ClientCredentialsClient::new(settings.credentials, settings.graph.timeout)?;
    let api = GraphCalendarClient::new(settings.graph)?;

    let options = WorkflowOptions {
        count: config.run.count(),
        batch_size: config.run.batch_size(),
        keep: flags.keep,
    };
    info!(
        count = options.count,
        batch_size = options.batch_size,
        calendar = %api.config().calendar_email,
        "starting run"
    );

    let mut confirmation: Box<dyn Confirmation> = if flags.assume_yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirmation::stdin())
    };

    let summary = run_workflow(
        &tokens,
        &api,
        confirmation.as_mut(),
        cancel,
        &options,
        Utc::now(),
    )
    .await?;

    println!();
    print!("{}", summary);

    if !flags.assume_yes && !summary.cancelled {
        tokio::select! {
            _ = confirmation.confirm(EXIT_PROMPT) => {}
            _ = cancel.cancelled() => {}
        }
    }

    Ok(summary)
}
