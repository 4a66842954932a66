//! Run command implementation.
//!
//! This module implements `bsky-autolike run`, the scheduled entry point.

use std::thread;

use anyhow::Context;

use crate::cli::{GlobalArgs, EXIT_CONFIG, EXIT_RUN_FAILED};
use crate::client::{ClientError, DryRun, SocialApi, XrpcClient};
use crate::config::ConfigError;
use crate::logging;
use crate::runner::{RetryExhausted, RetryPolicy, RunController, RunError, RunSummary};

/// Result type for run command operations.
pub type RunCommandResult = Result<RunSummary, RunCommandError>;

/// Error type for run command operations.
#[derive(Debug, thiserror::Error)]
pub enum RunCommandError {
    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Log files could not be opened.
    #[error("{0:#}")]
    Logging(anyhow::Error),

    /// Every attempt failed.
    #[error("{0}")]
    Exhausted(#[from] RetryExhausted<RunError>),
}

impl RunCommandError {
    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            RunCommandError::Config(_) | RunCommandError::Logging(_) => EXIT_CONFIG,
            RunCommandError::Exhausted(_) => EXIT_RUN_FAILED,
        }
    }
}

/// Execute the run command.
pub fn run(global: &GlobalArgs, attempts: u32, dry_run: bool) -> RunCommandResult {
    let config = global.load_config()?;
    logging::init(&config)
        .with_context(|| format!("Failed to open logs in {}", config.workdir.display()))
        .map_err(RunCommandError::Logging)?;

    let policy = RetryPolicy::default().with_max_attempts(attempts);
    let controller = RunController::new(&config).with_dry_run(dry_run);

    let summary = controller.run(&policy, thread::sleep, || {
        let client = XrpcClient::new(&config.service)?;
        let api: Box<dyn SocialApi> = if dry_run {
            Box::new(DryRun::new(client))
        } else {
            Box::new(client)
        };
        Ok::<_, ClientError>(api)
    })?;

    Ok(summary)
}
