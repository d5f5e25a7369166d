//! Interfaces to the world outside the command engine.
//!
//! The session never reaches for globals: navigation, notifications, and the
//! dashboard features it dispatches to are all handed in as trait objects.
//! Search-engine templates and the user shortcut table live here too, since
//! they only matter once a line falls through to navigation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ActionError;

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Toast/notification surface.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Opens a destination URL. Well-formedness is the navigator's problem.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// Feature capabilities the built-in commands are wired to.
///
/// Every method receives already-trimmed arguments and reports failure
/// through [`ActionError`].
pub trait Dashboard: Send + Sync {
    fn create_note(&self, title: &str) -> Result<(), ActionError>;
    fn open_notes(&self, query: &str) -> Result<(), ActionError>;
    fn add_task(&self, text: &str) -> Result<(), ActionError>;
    fn complete_task(&self, text: &str) -> Result<(), ActionError>;
    fn clear_done_tasks(&self) -> Result<(), ActionError>;
    fn clear_screen(&self) -> Result<(), ActionError>;
    fn start_timer(&self, minutes: u32) -> Result<(), ActionError>;
    fn stop_timer(&self) -> Result<(), ActionError>;
    fn open_panel(&self, panel: &str) -> Result<(), ActionError>;
    fn apply_theme(&self, name: &str) -> Result<(), ActionError>;
    fn reload(&self) -> Result<(), ActionError>;
    fn show_help(&self) -> Result<(), ActionError>;
}

/// Web search destinations for lines that match nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchEngine {
    #[default]
    Default,
    DuckDuckGo,
    Bing,
    Brave,
    Perplexity,
    ChatGpt,
    YouTube,
}

impl SearchEngine {
    pub fn all() -> &'static [SearchEngine] {
        &[
            SearchEngine::Default,
            SearchEngine::DuckDuckGo,
            SearchEngine::Bing,
            SearchEngine::Brave,
            SearchEngine::Perplexity,
            SearchEngine::ChatGpt,
            SearchEngine::YouTube,
        ]
    }

    /// Configuration key for this engine.
    pub fn key(&self) -> &'static str {
        match self {
            SearchEngine::Default => "default",
            SearchEngine::DuckDuckGo => "ddg",
            SearchEngine::Bing => "bing",
            SearchEngine::Brave => "brave",
            SearchEngine::Perplexity => "perplexity",
            SearchEngine::ChatGpt => "chatgpt",
            SearchEngine::YouTube => "youtube",
        }
    }

    /// Parse a configuration value; anything unrecognized selects `Default`.
    pub fn from_key(key: &str) -> Self {
        let key = key.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|engine| engine.key() == key)
            .unwrap_or_default()
    }

    fn template(&self) -> &'static str {
        match self {
            SearchEngine::Default => "https://www.google.com/search?q={}",
            SearchEngine::DuckDuckGo => "https://duckduckgo.com/?q={}",
            SearchEngine::Bing => "https://www.bing.com/search?q={}",
            SearchEngine::Brave => "https://search.brave.com/search?q={}",
            SearchEngine::Perplexity => "https://www.perplexity.ai/search?q={}",
            SearchEngine::ChatGpt => "https://chatgpt.com/?q={}",
            SearchEngine::YouTube => "https://www.youtube.com/results?search_query={}",
        }
    }

    /// Percent-encode `query` and substitute it into this engine's template.
    pub fn search_url(&self, query: &str) -> String {
        self.template()
            .replace("{}", &urlencoding::encode(query))
    }
}

impl From<String> for SearchEngine {
    fn from(value: String) -> Self {
        Self::from_key(&value)
    }
}

impl From<SearchEngine> for String {
    fn from(value: SearchEngine) -> Self {
        value.key().to_string()
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// User-defined first-word → URL shortcuts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortcutTable {
    entries: BTreeMap<String, String>,
}

impl ShortcutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shortcut. Keys are matched case-insensitively.
    pub fn insert(&mut self, word: impl Into<String>, url: impl Into<String>) {
        self.entries.insert(word.into().to_lowercase(), url.into());
    }

    /// Look up the destination for the first whitespace-delimited word of `line`.
    pub fn lookup(&self, line: &str) -> Option<&str> {
        let word = line.split_whitespace().next()?.to_lowercase();
        self.entries
            .get(&word)
            .or_else(|| {
                // Keys deserialized from config files keep their original case.
                self.entries
                    .iter()
                    .find(|(key, _)| key.to_lowercase() == word)
                    .map(|(_, url)| url)
            })
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ShortcutTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (word, url) in iter {
            table.insert(word, url);
        }
        table
    }
}

/// Whether `line` begins with a URL scheme marker such as `https://`.
pub fn looks_like_url(line: &str) -> bool {
    let Some((scheme, _)) = line.trim_start().split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
