//! Wiring: configuration, dashboard, registry, history, and session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use omnibar_core::config::{ConfigOverrides, OmnibarConfig, load_config};
use omnibar_core::{
    CommandLineSession, CommandRegistry, Dispatch, HistoryLog, JsonHistoryStore, Key, Navigator,
    register_builtin_commands,
};
use tracing::info;

use crate::dashboard::LocalDashboard;
use crate::terminal::{Console, TerminalNotifier};

/// Where configuration and state come from.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub workspace: PathBuf,
    pub config_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    /// Directory for the history file and dashboard state. Nothing is
    /// persisted when unset and the config names no history file.
    pub data_dir: Option<PathBuf>,
}

pub struct App {
    pub config: OmnibarConfig,
    pub console: Arc<Console>,
    pub dashboard: Arc<LocalDashboard>,
    pub session: CommandLineSession,
    options: AppOptions,
    navigator: Arc<dyn Navigator>,
}

impl App {
    pub fn build(
        options: AppOptions,
        console: Arc<Console>,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        let config = load(&options)?;
        let dashboard = Arc::new(match &options.data_dir {
            Some(dir) => LocalDashboard::open(dir.join("dashboard.json"), console.clone(), &config.theme),
            None => LocalDashboard::new(console.clone(), &config.theme),
        });
        let session = build_session(&config, &options, &console, &dashboard, &navigator)?;
        Ok(Self {
            config,
            console,
            dashboard,
            session,
            options,
            navigator,
        })
    }

    /// Re-read configuration and start a fresh session. Dashboard state and
    /// the persisted history carry over.
    pub fn reload(&mut self) -> anyhow::Result<()> {
        let config = load(&self.options)?;
        self.session = build_session(
            &config,
            &self.options,
            &self.console,
            &self.dashboard,
            &self.navigator,
        )?;
        self.config = config;
        info!("Reloaded configuration");
        Ok(())
    }

    /// Type `line` and press Enter.
    pub fn run_line(&mut self, line: &str) -> Dispatch {
        self.session.set_buffer(line);
        self.session.handle_key(Key::Enter)
    }

    /// Run `line` without waiting for more input. A bare trigger that would
    /// prompt for arguments runs with none; the command decides whether it
    /// has a default.
    pub fn run_to_completion(&mut self, line: &str) -> Dispatch {
        match self.run_line(line) {
            Dispatch::Autocompleted { buffer } => self.run_line(&buffer),
            other => other,
        }
    }

    pub fn history_file(&self) -> Option<PathBuf> {
        history_file(&self.config, &self.options)
    }
}

fn load(options: &AppOptions) -> anyhow::Result<OmnibarConfig> {
    load_config(
        Some(&options.workspace),
        options.config_file.as_deref(),
        Some(&options.overrides),
    )
    .context("Failed to load configuration")
}

fn history_file(config: &OmnibarConfig, options: &AppOptions) -> Option<PathBuf> {
    config.history_file.clone().or_else(|| {
        options
            .data_dir
            .as_ref()
            .map(|dir| dir.join("history.json"))
    })
}

fn build_session(
    config: &OmnibarConfig,
    options: &AppOptions,
    console: &Arc<Console>,
    dashboard: &Arc<LocalDashboard>,
    navigator: &Arc<dyn Navigator>,
) -> anyhow::Result<CommandLineSession> {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry, dashboard.clone())
        .context("Failed to register built-in commands")?;
    dashboard.set_help(registry.help_text());

    let history = match history_file(config, options) {
        Some(path) => HistoryLog::load(
            Arc::new(JsonHistoryStore::new(path)),
            config.history_capacity,
        ),
        None => HistoryLog::new(config.history_capacity),
    };

    Ok(
        CommandLineSession::new(Arc::new(registry), history, navigator.clone())
            .with_notifier(Arc::new(TerminalNotifier::new(console.clone())))
            .with_shortcuts(config.shortcuts.clone())
            .with_search_engine(config.search_engine)
            .with_success_notifications(config.notify_success),
    )
}
