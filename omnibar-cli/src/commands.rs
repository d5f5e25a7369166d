//! CLI subcommand handlers.

use std::path::Path;

use omnibar_core::config::{self, OmnibarConfig};

use crate::{Commands, ConfigAction};

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => handle_config(action, workspace, config_file),
    }
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = config::workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let toml_str = config::to_toml(&OmnibarConfig::default())?;
            std::fs::write(&config_path, toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = config::load_config(Some(workspace), config_file, None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            println!("{}", config::to_toml(&config)?);
            Ok(())
        }
        ConfigAction::Path => {
            let config = config::load_config(Some(workspace), config_file, None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            let user = config_file
                .map(Path::to_path_buf)
                .or_else(config::user_config_path);
            print_path("user config", user.as_deref());
            print_path(
                "workspace config",
                Some(&config::workspace_config_path(workspace)),
            );
            print_path("history", config.history_path().as_deref());
            print_path("data", config::data_dir().as_deref());
            Ok(())
        }
    }
}

fn print_path(label: &str, path: Option<&Path>) {
    match path {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (missing)" };
            println!("{label:<18} {}{marker}", path.display());
        }
        None => println!("{label:<18} (unavailable)"),
    }
}
