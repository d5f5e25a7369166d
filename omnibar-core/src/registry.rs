//! Command registry for the command bar.
//!
//! Holds every dispatchable command in registration order and owns the two
//! matching rules: substring search for live suggestions and
//! longest-trigger-match for resolving a confirmed line.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ActionError, DispatchError, RegistryError};

/// Marker shown next to commands that don't declare an icon.
pub const DEFAULT_ICON: &str = "›";

/// Capability invoked with the text following the trigger.
pub type CommandAction = Arc<dyn Fn(&str) -> Result<(), ActionError> + Send + Sync>;

/// A dispatchable command.
#[derive(Clone)]
pub struct Command {
    /// Unique identifier, e.g. "task:add".
    pub id: String,
    /// Lowercase keyword typed to invoke the command.
    pub trigger: String,
    /// Human-readable label.
    pub title: String,
    /// Usage hint shown once the trigger is fully typed, e.g. "[text]".
    pub hint: Option<String>,
    /// Display-only icon.
    pub icon: String,
    action: CommandAction,
}

impl Command {
    pub fn new<F>(
        id: impl Into<String>,
        trigger: impl Into<String>,
        title: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: Fn(&str) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            trigger: trigger.into(),
            title: title.into(),
            hint: None,
            icon: DEFAULT_ICON.to_string(),
            action: Arc::new(action),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Invoke the action directly.
    pub fn run(&self, args: &str) -> Result<(), ActionError> {
        (self.action)(args)
    }

    /// `"<trigger> <hint>"`, when the command has a hint.
    pub fn usage(&self) -> Option<String> {
        self.hint
            .as_ref()
            .map(|hint| format!("{} {}", self.trigger, hint))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("trigger", &self.trigger)
            .field("title", &self.title)
            .field("hint", &self.hint)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

/// A confirmed line matched to a command.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub command: Arc<Command>,
    /// Remainder of the line after the trigger, trimmed, original casing.
    pub args: String,
}

impl Resolution {
    /// The canonical history line: `"<trigger>[ <args>]"`.
    pub fn history_line(&self) -> String {
        if self.args.is_empty() {
            self.command.trigger.clone()
        } else {
            format!("{} {}", self.command.trigger, self.args)
        }
    }
}

/// Registry holding all commands in registration order.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<Command>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command.
    ///
    /// The trigger is trimmed and lowercased. Returns `Ok(false)` without
    /// touching the table when a command with the same id already exists;
    /// the first registration wins.
    pub fn register(&mut self, mut command: Command) -> Result<bool, RegistryError> {
        command.trigger = command.trigger.trim().to_lowercase();
        if command.trigger.is_empty() {
            return Err(RegistryError::EmptyTrigger { id: command.id });
        }
        if self.get(&command.id).is_some() {
            debug!(id = %command.id, "Ignoring duplicate command registration");
            return Ok(false);
        }
        debug!(id = %command.id, trigger = %command.trigger, "Registered command");
        self.commands.push(Arc::new(command));
        Ok(true)
    }

    /// Look up a command by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Command>> {
        self.commands.iter().find(|cmd| cmd.id == id)
    }

    /// Suggestions for a partially typed line.
    ///
    /// Once the query is a trigger followed by a space, only that command is
    /// returned so the list stays put while arguments are typed. A query that
    /// is exactly a multi-word trigger counts too, so "timer stop" suggests
    /// only `timer stop` rather than `timer`. Otherwise
    /// commands whose trigger or title contains the query are returned,
    /// trigger-prefix matches first, registration order within each group.
    pub fn search(&self, query: &str) -> Vec<Arc<Command>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let multi_word = query.contains(' ');
        let typed_in_full = |rest: &str| rest.starts_with(' ') || (multi_word && rest.is_empty());
        if let Some((command, _)) = self.longest_match(&query, typed_in_full) {
            return vec![command.clone()];
        }

        let mut matches: Vec<Arc<Command>> = self
            .commands
            .iter()
            .filter(|cmd| cmd.trigger.contains(&query) || cmd.title.to_lowercase().contains(&query))
            .cloned()
            .collect();
        matches.sort_by_key(|cmd| !cmd.trigger.starts_with(&query));
        matches
    }

    /// Resolve a confirmed line by longest-trigger-match.
    ///
    /// Among commands whose trigger is a case-insensitive prefix of `line`
    /// ending on a word boundary, the longest trigger wins ("clear done"
    /// beats "clear"). "google maps" does not resolve to `go`.
    pub fn resolve(&self, line: &str) -> Option<Resolution> {
        let line = line.trim();
        self.longest_match(line, |rest| {
            rest.is_empty() || rest.starts_with(char::is_whitespace)
        })
        .map(|(command, rest)| Resolution {
            command: command.clone(),
            args: rest.trim().to_string(),
        })
    }

    /// Execute a command by id with the given arguments.
    pub fn execute(&self, id: &str, args: &str) -> Result<(), DispatchError> {
        let command = self.get(id).ok_or_else(|| DispatchError::UnknownCommand {
            id: id.to_string(),
        })?;
        command
            .run(args)
            .map_err(|source| DispatchError::ActionFailed {
                title: command.title.clone(),
                source,
            })
    }

    /// Longest trigger `t` such that `line` starts with `t`, ignoring case,
    /// and the rest satisfies `accept`. Returns the command and that rest.
    fn longest_match<'a>(
        &self,
        line: &'a str,
        accept: impl Fn(&str) -> bool,
    ) -> Option<(&Arc<Command>, &'a str)> {
        let mut best: Option<(&Arc<Command>, &'a str)> = None;
        for command in &self.commands {
            let Some(rest) = strip_prefix_ignore_case(line, &command.trigger) else {
                continue;
            };
            if !accept(rest) {
                continue;
            }
            if best.is_none_or(|(current, _)| command.trigger.len() > current.trigger.len()) {
                best = Some((command, rest));
            }
        }
        best
    }

    /// Formatted listing of every command, in registration order.
    pub fn help_text(&self) -> String {
        let mut output = String::from("\nAvailable commands:\n\n");
        for cmd in &self.commands {
            let usage = cmd.usage().unwrap_or_else(|| cmd.trigger.clone());
            output.push_str(&format!("  {} {:<22} {}\n", cmd.icon, usage, cmd.title));
        }
        output.push_str(
            "\nAnything else is opened as a shortcut, a URL, or a web search.\n",
        );
        output
    }

    /// Return all registered commands.
    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    /// Return the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// `line` with a case-insensitive `prefix` removed. `prefix` must be lowercase.
fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let mut lowered = String::with_capacity(prefix.len());
    for (index, ch) in line.char_indices() {
        lowered.extend(ch.to_lowercase());
        if !prefix.starts_with(lowered.as_str()) {
            return None;
        }
        if lowered.len() == prefix.len() {
            return Some(&line[index + ch.len_utf8()..]);
        }
    }
    None
}
