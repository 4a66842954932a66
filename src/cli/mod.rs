//! CLI commands and argument handling.
//!
//! This module contains the clap CLI definitions; the command bodies live
//! in [`commands`].

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use crate::config::{self, BotConfig, ConfigError, DEFAULT_BOT_ID, DEFAULT_ENV_PATH};
use crate::runner::RetryPolicy;

/// Exit status when every run attempt failed.
pub const EXIT_RUN_FAILED: u8 = 1;
/// Exit status for configuration and start-up errors.
pub const EXIT_CONFIG: u8 = 2;

/// Like the recent posts of an account's followers.
///
/// Each invocation runs one pass for one bot identity. Schedule it from
/// cron or a systemd timer; run several bots with `--bot` and shard
/// settings to split the follower list between them.
#[derive(Parser, Debug)]
#[command(name = "bsky-autolike")]
#[command(author, version = crate::VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to run; `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Bot identity; selects `<BOT>_`-prefixed settings [default: BOT1].
    #[arg(long, global = true, env = "BOT_ID")]
    pub bot: Option<String>,

    /// Shared dotenv file.
    #[arg(long, global = true, env = "ENV_PATH", default_value = DEFAULT_ENV_PATH)]
    pub env_file: PathBuf,
}

impl GlobalArgs {
    /// Load the env file, then resolve the bot's configuration.
    ///
    /// `BOT_ID` may come from the env file when it was not given otherwise.
    pub fn load_config(&self) -> Result<BotConfig, ConfigError> {
        config::load_env_file(&self.env_file)?;
        let bot = self
            .bot
            .clone()
            .or_else(|| std::env::var("BOT_ID").ok())
            .unwrap_or_else(|| DEFAULT_BOT_ID.to_string());
        BotConfig::from_env(&bot)
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one autolike pass (the default).
    ///
    /// Logs in, walks this bot's shard of the source account's followers
    /// and likes posts newer than each follower's watermark. Failed runs
    /// are retried with a growing pause.
    ///
    /// Examples:
    ///   bsky-autolike                      # BOT1, settings from /opt/bsky-autolike/.env
    ///   bsky-autolike --bot BOT2 run       # Second bot
    ///   bsky-autolike run --dry-run        # Log what would be liked
    Run(RunCommand),

    /// Show the state file and recent watermarks.
    Status(StatusCommand),

    /// Show the resolved configuration.
    ///
    /// The app password is never printed.
    Config(ConfigCommand),

    /// Generate shell completions.
    ///
    /// Examples:
    ///   bsky-autolike completions bash > ~/.local/share/bash-completion/completions/bsky-autolike
    ///   bsky-autolike completions zsh > ~/.zfunc/_bsky-autolike
    ///   bsky-autolike completions fish > ~/.config/fish/completions/bsky-autolike.fish
    Completions(CompletionsCommand),
}

/// Arguments for the 'run' command.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Attempts before giving up.
    #[arg(long, default_value_t = RetryPolicy::default().max_attempts,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: u32,

    /// Read everything but like nothing and save nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl Default for RunCommand {
    fn default() -> Self {
        Self {
            attempts: RetryPolicy::default().max_attempts,
            dry_run: false,
        }
    }
}

/// Arguments for the 'status' command.
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// How many watermarks to list.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,
}

/// Arguments for the 'config' command.
#[derive(Args, Debug)]
pub struct ConfigCommand {}

/// Arguments for the 'completions' command.
#[derive(Args, Debug)]
pub struct CompletionsCommand {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: commands::completions::CompletionShell,
}

// ============================================================================
// Command implementations
// ============================================================================

fn report_error(err: &dyn std::fmt::Display) {
    eprintln!("\x1b[31mError:\x1b[0m {err}");
}

impl RunCommand {
    /// Execute the run command.
    pub fn execute(&self, global: &GlobalArgs) -> ExitCode {
        match commands::run::run(global, self.attempts, self.dry_run) {
            Ok(summary) => {
                let mark = if self.dry_run { "[dry-run] " } else { "" };
                println!("\x1b[32m✓\x1b[0m {mark}{}", summary.simple_line());
                ExitCode::SUCCESS
            }
            Err(e) => {
                report_error(&e);
                ExitCode::from(e.exit_code())
            }
        }
    }
}

impl StatusCommand {
    /// Execute the status command.
    pub fn execute(&self, global: &GlobalArgs) -> ExitCode {
        match commands::status::status(global, self.limit) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report_error(&e);
                ExitCode::from(EXIT_CONFIG)
            }
        }
    }
}

impl ConfigCommand {
    /// Execute the config command.
    pub fn execute(&self, global: &GlobalArgs) -> ExitCode {
        match commands::config::config_show(global) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report_error(&e);
                ExitCode::from(EXIT_CONFIG)
            }
        }
    }
}

impl CompletionsCommand {
    /// Execute the completions command.
    pub fn execute(&self) -> ExitCode {
        match commands::completions::completions(self.shell) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report_error(&e);
                ExitCode::FAILURE
            }
        }
    }
}
