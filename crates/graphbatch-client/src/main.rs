//! graphbatch CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use graphbatch_client::cancel::{CancelHandler, EXIT_CANCELLED};
use graphbatch_client::cli::{Cli, Command, ConfigAction};
use graphbatch_client::commands::{self, run::RunFlags};
use graphbatch_client::config::EffectiveConfig;
use graphbatch_client::error::{ClientError, ClientResult};
use graphbatch_core::{TracingConfig, init_tracing};

/// Workflow finished but something failed or was left behind.
const EXIT_INCOMPLETE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut tracing_config = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", ClientError::from(e));
        return ExitCode::FAILURE;
    }

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<EffectiveConfig> {
    let cwd = std::env::current_dir()?;
    EffectiveConfig::load(
        cli.config.as_deref(),
        &cwd,
        cli.graph.to_settings(),
        cli.run.to_settings(),
    )
    .map_err(ClientError::Config)
}

async fn run(cli: Cli, config: EffectiveConfig) -> ClientResult<ExitCode> {
    match cli.command {
        Some(Command::Config { action }) => {
            match action {
                ConfigAction::Dump => commands::config::dump(&config)?,
                ConfigAction::Validate => commands::config::validate(&config)?,
                ConfigAction::Path => commands::config::path()?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Run) | None => {
            let cancel = CancelHandler::new();
            cancel.spawn_listener();

            let flags = RunFlags {
                assume_yes: cli.run.yes,
                keep: cli.run.keep,
            };
            let summary = commands::run::run(&config, flags, &cancel.token()).await?;

            Ok(if summary.cancelled {
                ExitCode::from(EXIT_CANCELLED)
            } else if summary.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_INCOMPLETE)
            })
        }
    }
}
