//! bsky-autolike - like the new posts of an account's followers.
//!
//! This is the main entry point for the bsky-autolike CLI tool.

use std::process::ExitCode;

use bsky_autolike::cli::{Cli, Commands, RunCommand};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        // A bare invocation is what cron runs.
        None => RunCommand::default().execute(&cli.global),
        Some(cmd) => match cmd {
            Commands::Run(c) => c.execute(&cli.global),
            Commands::Status(c) => c.execute(&cli.global),
            Commands::Config(c) => c.execute(&cli.global),
            Commands::Completions(c) => c.execute(),
        },
    }
}
