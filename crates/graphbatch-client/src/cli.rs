//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use graphbatch_core::TracingOutputFormat;

use crate::config::{GraphSettings, RunSettings, validate_batch_size};

/// graphbatch - Create calendar events through Graph JSON batching, then remove them
#[derive(Debug, Parser)]
#[command(name = "graphbatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "GRAPHBATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format (pretty, compact, json)
    #[arg(long, value_parser = parse_log_format, global = true)]
    pub log_format: Option<TracingOutputFormat>,

    #[command(flatten)]
    pub graph: GraphArgs,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Identity and calendar overrides.
#[derive(Debug, Clone, Default, Args)]
pub struct GraphArgs {
    /// Application (client) ID
    #[arg(long, env = "GRAPHBATCH_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Client secret (plain, env::VAR or pass::path)
    #[arg(long, env = "GRAPHBATCH_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    /// Directory (tenant) ID
    #[arg(long, env = "GRAPHBATCH_TENANT_ID", global = true)]
    pub tenant_id: Option<String>,

    /// Authority base URL
    #[arg(long, env = "GRAPHBATCH_AUTHORITY", global = true)]
    pub authority: Option<String>,

    /// Token scope
    #[arg(long, env = "GRAPHBATCH_SCOPE", global = true)]
    pub scope: Option<String>,

    /// Mailbox whose calendar receives the events
    #[arg(long, env = "GRAPHBATCH_CALENDAR_EMAIL", global = true)]
    pub calendar_email: Option<String>,

    /// Graph API root (national clouds, testing)
    #[arg(long, env = "GRAPHBATCH_GRAPH_BASE_URL", global = true)]
    pub graph_base_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl GraphArgs {
    /// Returns the settings layer contributed by flags and environment.
    pub fn to_settings(&self) -> GraphSettings {
        GraphSettings {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            tenant_id: self.tenant_id.clone(),
            authority: self.authority.clone(),
            scope: self.scope.clone(),
            calendar_email: self.calendar_email.clone(),
            base_url: self.graph_base_url.clone(),
            timeout: self.timeout,
        }
    }
}

/// Workflow options.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Number of events to create
    #[arg(long, short = 'n', global = true)]
    pub count: Option<usize>,

    /// Events per $batch call (1-20)
    #[arg(long, value_parser = parse_batch_size, global = true)]
    pub batch_size: Option<usize>,

    /// Skip the confirmation and exit pauses
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Leave the created events in place
    #[arg(long, global = true)]
    pub keep: bool,
}

impl RunArgs {
    /// Returns the settings layer contributed by flags.
    pub fn to_settings(&self) -> RunSettings {
        RunSettings {
            count: self.count,
            batch_size: self.batch_size,
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the events, then delete them (default)
    Run,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump the effective configuration (secrets redacted)
    Dump,

    /// Validate the configuration without contacting any service
    Validate,

    /// Show the configuration file paths
    Path,
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    let size: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    validate_batch_size(size)
}

fn parse_log_format(s: &str) -> Result<TracingOutputFormat, String> {
    s.parse()
}
