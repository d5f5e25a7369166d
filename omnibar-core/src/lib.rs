//! # Omnibar Core
//!
//! Command dispatch engine for the productivity dashboard's command line.
//! Provides the command registry, the persistent history log, the
//! keystroke-driven command line session, and the built-in command set.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod history;
pub mod loader;
pub mod persistence;
pub mod registry;
pub mod session;

// Re-export commonly used types at the crate root.
pub use collaborators::{
    Dashboard, Navigator, Notifier, SearchEngine, Severity, ShortcutTable, looks_like_url,
};
pub use config::{ConfigOverrides, OmnibarConfig, load_config};
pub use error::{
    ActionError, ConfigError, DispatchError, OmnibarError, PersistenceError, RegistryError, Result,
};
pub use history::{DEFAULT_HISTORY_CAPACITY, Direction, HistoryLog};
pub use loader::register_builtin_commands;
pub use persistence::{HistoryStore, JsonHistoryStore, MemoryHistoryStore};
pub use registry::{Command, CommandAction, CommandRegistry, Resolution};
pub use session::{CommandLineSession, Dispatch, Key, SessionState};
