//! CLI, configuration, batch workflow and cleanup prompt
//!
//! This crate provides the `graphbatch` command-line interface.

pub mod cancel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod secret;
pub mod workflow;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use workflow::{RunSummary, WorkflowOptions, WorkflowPhase, run_workflow};
