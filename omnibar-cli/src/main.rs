//! Omnibar CLI: keyboard-first command bar for the dashboard.
//!
//! Runs a single command line, or an interactive prompt with live
//! suggestions and history.

mod app;
mod commands;
mod dashboard;
mod repl;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use omnibar_core::{ConfigOverrides, Dispatch, SearchEngine};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::app::{App, AppOptions};
use crate::terminal::{BrowserNavigator, Console};

/// Omnibar: one line for notes, tasks, timers, and the web
#[derive(Parser, Debug)]
#[command(name = "omnibar", version, about, long_about = None)]
struct Cli {
    /// Command line to run (starts the interactive prompt if omitted)
    line: Option<String>,

    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path (replaces the user-level config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search engine: default, ddg, bing, brave, perplexity, chatgpt, youtube
    #[arg(long)]
    engine: Option<String>,

    /// List available commands and exit
    #[arg(long)]
    list: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default workspace configuration file
    Init,
    /// Show the effective configuration
    Show,
    /// Show where configuration and state are read from
    Path,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr; RUST_LOG wins over -v
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    // JSON file layer for structured logging
    let log_dir = omnibar_core::config::data_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "omnibar.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if let Some(command) = cli.command {
        commands::handle_command(command, &workspace, cli.config.as_deref())?;
        return Ok(ExitCode::SUCCESS);
    }

    let options = AppOptions {
        workspace,
        config_file: cli.config,
        overrides: ConfigOverrides {
            search_engine: cli.engine.as_deref().map(SearchEngine::from_key),
            ..Default::default()
        },
        data_dir: omnibar_core::config::data_dir(),
    };
    let console = Arc::new(Console::new(cli.quiet));
    let navigator = Arc::new(BrowserNavigator::new(console.clone()));
    let mut app = App::build(options, console, navigator)?;

    if cli.list {
        print!("{}", app.session.registry().help_text());
        return Ok(ExitCode::SUCCESS);
    }

    match cli.line {
        Some(line) => run_once(&mut app, &line),
        None => {
            repl::run(&mut app)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Execute one line and report how it went through the exit code.
fn run_once(app: &mut App, line: &str) -> anyhow::Result<ExitCode> {
    let dispatch = app.run_to_completion(line);
    app.console.flush()?;
    if let Dispatch::Failed { .. } = dispatch {
        let usage = app
            .session
            .registry()
            .resolve(line)
            .and_then(|resolution| resolution.command.usage());
        if let Some(usage) = usage {
            eprintln!("Usage: {usage}");
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_line_and_flags() {
        let cli = Cli::parse_from(["omnibar", "--engine", "ddg", "-vv", "task buy milk"]);
        assert_eq!(cli.line.as_deref(), Some("task buy milk"));
        assert_eq!(cli.engine.as_deref(), Some("ddg"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parses_config_subcommand() {
        let cli = Cli::parse_from(["omnibar", "config", "path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Path
            })
        ));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["omnibar"]);
        assert!(cli.line.is_none());
        assert!(!cli.list);
        assert!(!cli.quiet);
        assert_eq!(cli.workspace, PathBuf::from("."));
    }
}
