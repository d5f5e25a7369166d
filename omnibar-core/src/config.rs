//! Configuration system for Omnibar.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config -> environment variables -> CLI overrides.

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::collaborators::{SearchEngine, ShortcutTable};
use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmnibarConfig {
    /// Engine used when a line matches no command, shortcut, or URL.
    pub search_engine: SearchEngine,
    /// Maximum number of lines kept in the history log.
    pub history_capacity: usize,
    /// History file location. Defaults to `history.json` in the data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
    /// First-word shortcuts, e.g. `mail = "https://mail.example.com"`.
    pub shortcuts: ShortcutTable,
    pub theme: String,
    /// Show a notification after every successful command.
    pub notify_success: bool,
}

impl Default for OmnibarConfig {
    fn default() -> Self {
        Self {
            search_engine: SearchEngine::Default,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_file: None,
            shortcuts: ShortcutTable::new(),
            theme: "dark".to_string(),
            notify_success: true,
        }
    }
}

impl OmnibarConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                message: "history_capacity must be at least 1".into(),
            });
        }
        if self.theme.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "theme must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Resolved history file path, if one can be determined.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("history.json")))
    }
}

/// Values supplied on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_engine: Option<SearchEngine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "omnibar", "omnibar")
}

/// `~/.config/omnibar/config.toml` or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// `<workspace>/.omnibar/config.toml`.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".omnibar").join("config.toml")
}

/// Platform data directory, home of the history file, dashboard state, and logs.
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Load configuration from all layers and validate the result.
///
/// `config_file` replaces the user-level file; it must exist when given.
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&ConfigOverrides>,
) -> Result<OmnibarConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(OmnibarConfig::default()));

    // User-level config, or the explicitly requested file
    match config_file {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            if let Some(user_config) = user_config_path().filter(|p| p.exists()) {
                figment = figment.merge(Toml::file(user_config));
            }
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(ws_config));
        }
    }

    // Environment variables (OMNIBAR_SEARCH_ENGINE, OMNIBAR_SHORTCUTS__MAIL, etc.)
    figment = figment.merge(Env::prefixed("OMNIBAR_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: OmnibarConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Render a config as TOML, as shown by `omnibar config show`.
pub fn to_toml(config: &OmnibarConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}
