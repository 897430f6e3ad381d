mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use colored::Colorize;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Explicit state file
    pub state: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        config: cli.config,
        state: cli.state,
    };

    let result = dispatch(cli.command, &ctx);
    if let Err(err) = &result
        && let Some(message) = hint(err)
    {
        eprintln!("{} {message}", "hint:".yellow().bold());
    }
    result
}

fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Plan(args) => commands::declarative::plan(ctx, args.target.as_deref()),
        Command::Apply(args) => commands::declarative::apply(
            ctx,
            args.target.as_deref(),
            args.dry_run,
            args.yes,
        ),
        Command::Destroy(args) => {
            commands::declarative::destroy(ctx, args.target.as_deref(), args.yes)
        }
        Command::Status(args) => commands::declarative::status(ctx, args.target.as_deref()),
        Command::Show { userid } => commands::users::show(ctx, &userid),
        Command::Import { userid, roles } => {
            commands::users::import(ctx, &userid, cli::role_set(roles))
        }
        Command::Forget { userid } => commands::users::forget(ctx, &userid),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "rolesync", &mut io::stdout());
            Ok(())
        }
    }
}

/// Explain store failures that reach the top level
fn hint(err: &anyhow::Error) -> Option<String> {
    let store_err = err
        .chain()
        .find_map(|e| e.downcast_ref::<memberkit::Error>())?;
    let category = store_err.category();
    Some(format!("{}: {}", category.description(), category.advice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_hint_for_wrapped_store_error() {
        let err = Err::<(), _>(memberkit::Error::http("http://nexus", 401, "denied"))
            .context("Failed to read user jdoe")
            .unwrap_err();
        assert_eq!(
            hint(&err).as_deref(),
            Some("Authentication failed: Check the configured username and password")
        );
    }

    #[test]
    fn test_no_hint_for_other_errors() {
        assert!(hint(&anyhow::anyhow!("Config file not found")).is_none());
    }
}
