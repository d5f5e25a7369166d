//! Per-input-field command line state machine.
//!
//! A [`CommandLineSession`] owns the text being typed, the live suggestion
//! list, the selection and history cursors, and the inline hint. Every
//! transition happens synchronously inside one input or key event; the
//! session never spawns work of its own.
//!
//! Keyboard model:
//! - Typing recomputes suggestions and the hint.
//! - Up/Down cycle the suggestion list, or walk the history log when there
//!   are no suggestions.
//! - Enter executes, autocompletes a command that takes arguments, or falls
//!   through to a shortcut, a URL, or a web search.
//! - Tab autocompletes the selected (or first) suggestion, Esc dismisses.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::collaborators::{
    Navigator, Notifier, SearchEngine, Severity, ShortcutTable, looks_like_url,
};
use crate::history::{Direction, HistoryLog};
use crate::registry::{Command, CommandRegistry, Resolution};

/// Keys the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Tab,
    Escape,
}

/// Coarse state of the session, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Empty buffer, nothing selected.
    Idle,
    /// Suggestions are showing; arrows move the selection.
    Suggesting,
    /// No suggestions; arrows walk the history log.
    HistoryBrowsing,
}

/// What a key press ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing to do (empty line, arrow keys, nothing to complete).
    Ignored,
    /// The buffer was rewritten to `"<trigger> "` so arguments can follow.
    Autocompleted { buffer: String },
    /// A command ran successfully.
    Executed { id: String, args: String },
    /// A command ran and its action failed.
    Failed { id: String, message: String },
    /// A user shortcut matched the first word.
    Shortcut { url: String },
    /// The line itself was a URL.
    Url { url: String },
    /// The line was sent to a search engine.
    Search { engine: SearchEngine, url: String },
}

/// One command line, wired to its registry, history, and collaborators.
pub struct CommandLineSession {
    registry: Arc<CommandRegistry>,
    history: HistoryLog,
    navigator: Arc<dyn Navigator>,
    notifier: Option<Arc<dyn Notifier>>,
    shortcuts: ShortcutTable,
    search_engine: SearchEngine,
    notify_success: bool,

    buffer: String,
    suggestions: Vec<Arc<Command>>,
    suggestion_cursor: Option<usize>,
    history_cursor: Option<usize>,
    hint: Option<String>,
}

impl fmt::Debug for CommandLineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLineSession")
            .field("buffer", &self.buffer)
            .field("suggestions", &self.suggestions.len())
            .field("suggestion_cursor", &self.suggestion_cursor)
            .field("history_cursor", &self.history_cursor)
            .field("hint", &self.hint)
            .field("search_engine", &self.search_engine)
            .finish_non_exhaustive()
    }
}

impl CommandLineSession {
    /// Create a session. The registry must be fully populated by now.
    pub fn new(
        registry: Arc<CommandRegistry>,
        history: HistoryLog,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            registry,
            history,
            navigator,
            notifier: None,
            shortcuts: ShortcutTable::default(),
            search_engine: SearchEngine::default(),
            notify_success: true,
            buffer: String::new(),
            suggestions: Vec::new(),
            suggestion_cursor: None,
            history_cursor: None,
            hint: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_shortcuts(mut self, shortcuts: ShortcutTable) -> Self {
        self.shortcuts = shortcuts;
        self
    }

    pub fn with_search_engine(mut self, engine: SearchEngine) -> Self {
        self.search_engine = engine;
        self
    }

    /// Whether successful executions raise an info notification.
    pub fn with_success_notifications(mut self, enabled: bool) -> Self {
        self.notify_success = enabled;
        self
    }

    // --- Input ---

    /// Replace the buffer as if the user edited it.
    ///
    /// Recomputes suggestions (clearing the selection), leaves history
    /// browsing, and recomputes the hint.
    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.suggestions = self.registry.search(&self.buffer);
        self.suggestion_cursor = None;
        self.history_cursor = None;
        self.hint = self.compute_hint();
    }

    /// The hint is shown when exactly one suggestion's trigger has been
    /// typed in full and that command declares a hint.
    fn compute_hint(&self) -> Option<String> {
        let typed = self.buffer.trim_start().to_lowercase();
        let mut typed_triggers = self
            .suggestions
            .iter()
            .filter(|cmd| typed.starts_with(cmd.trigger.as_str()));
        match (typed_triggers.next(), typed_triggers.next()) {
            (Some(command), None) => command.usage(),
            _ => None,
        }
    }

    /// Route a key press.
    pub fn handle_key(&mut self, key: Key) -> Dispatch {
        match key {
            Key::Up => {
                self.navigate(Direction::Older);
                Dispatch::Ignored
            }
            Key::Down => {
                self.navigate(Direction::Newer);
                Dispatch::Ignored
            }
            Key::Enter => self.confirm(),
            Key::Tab => self.autocomplete(),
            Key::Escape => {
                self.dismiss();
                Dispatch::Ignored
            }
        }
    }

    /// Arrow key: cycle suggestions when there are any, otherwise history.
    pub fn navigate(&mut self, direction: Direction) {
        if self.suggestions.is_empty() {
            self.step_history(direction);
        } else {
            self.step_selection(direction);
        }
    }

    fn step_selection(&mut self, direction: Direction) {
        let count = self.suggestions.len();
        self.suggestion_cursor = Some(match (direction, self.suggestion_cursor) {
            (Direction::Newer, None) => 0,
            (Direction::Newer, Some(index)) => (index + 1) % count,
            (Direction::Older, None) => count - 1,
            (Direction::Older, Some(index)) => (index + count - 1) % count,
        });
    }

    fn step_history(&mut self, direction: Direction) {
        if self.history.is_empty() {
            return;
        }
        self.history_cursor = self.history.navigate(direction, self.history_cursor);
        // Recalled lines are not searched; arrows keep walking history.
        self.buffer = self
            .history_cursor
            .and_then(|index| self.history.get(index))
            .unwrap_or_default()
            .to_string();
        self.hint = None;
    }

    /// Tab: complete the selected suggestion, or the first one.
    pub fn autocomplete(&mut self) -> Dispatch {
        let index = self.suggestion_cursor.unwrap_or(0);
        match self.suggestions.get(index).cloned() {
            Some(command) => self.autocomplete_to(&command),
            None => Dispatch::Ignored,
        }
    }

    fn autocomplete_to(&mut self, command: &Command) -> Dispatch {
        let buffer = format!("{} ", command.trigger);
        self.set_buffer(buffer.clone());
        debug!(id = %command.id, "Autocompleted command");
        Dispatch::Autocompleted { buffer }
    }

    /// Esc: hide suggestions first, clear the line on a second press.
    pub fn dismiss(&mut self) {
        if self.suggestions.is_empty() && self.hint.is_none() {
            self.reset();
        } else {
            self.suggestions.clear();
            self.suggestion_cursor = None;
            self.hint = None;
        }
    }

    /// Enter.
    pub fn confirm(&mut self) -> Dispatch {
        if let Some(command) = self.selected().cloned() {
            if command.hint.is_some() && !self.buffer.contains(' ') {
                return self.autocomplete_to(&command);
            }
            return self.run(Resolution {
                command,
                args: String::new(),
            });
        }

        let line = self.buffer.trim().to_string();
        if line.is_empty() {
            return Dispatch::Ignored;
        }

        if let Some(resolution) = self.registry.resolve(&line) {
            let bare_trigger =
                resolution.args.is_empty() && !self.buffer.ends_with(char::is_whitespace);
            if resolution.command.hint.is_some() && bare_trigger {
                let command = resolution.command.clone();
                return self.autocomplete_to(&command);
            }
            return self.run(resolution);
        }

        let dispatch = self.fall_through(&line);
        self.history.append(&line);
        self.reset();
        dispatch
    }

    fn fall_through(&self, line: &str) -> Dispatch {
        if let Some(url) = self.shortcuts.lookup(line) {
            debug!(%url, "Opening shortcut");
            self.navigator.navigate(url);
            return Dispatch::Shortcut {
                url: url.to_string(),
            };
        }
        if looks_like_url(line) {
            debug!(url = %line, "Opening URL");
            self.navigator.navigate(line);
            return Dispatch::Url {
                url: line.to_string(),
            };
        }
        let url = self.search_engine.search_url(line);
        debug!(engine = %self.search_engine, %url, "Searching the web");
        self.navigator.navigate(&url);
        Dispatch::Search {
            engine: self.search_engine,
            url,
        }
    }

    /// Execute a resolved command, then always record and reset.
    fn run(&mut self, resolution: Resolution) -> Dispatch {
        let line = resolution.history_line();
        let Resolution { command, args } = resolution;

        let dispatch = match self.registry.execute(&command.id, &args) {
            Ok(()) => {
                info!(id = %command.id, args = %args, "Executed command");
                if self.notify_success {
                    self.notify(&command.title, Severity::Info);
                }
                Dispatch::Executed {
                    id: command.id.clone(),
                    args,
                }
            }
            Err(e) => {
                warn!(id = %command.id, error = %e, "Command failed");
                self.notify(&e.to_string(), Severity::Error);
                Dispatch::Failed {
                    id: command.id.clone(),
                    message: e.to_string(),
                }
            }
        };

        self.history.append(&line);
        self.reset();
        dispatch
    }

    fn notify(&self, message: &str, severity: Severity) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(message, severity);
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.suggestions.clear();
        self.suggestion_cursor = None;
        self.history_cursor = None;
        self.hint = None;
    }

    // --- Accessors ---

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn suggestions(&self) -> &[Arc<Command>] {
        &self.suggestions
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.suggestion_cursor
    }

    pub fn selected(&self) -> Option<&Arc<Command>> {
        self.suggestion_cursor
            .and_then(|index| self.suggestions.get(index))
    }

    /// `"<trigger> <hint>"` while a hinted trigger is fully typed.
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn history_cursor(&self) -> Option<usize> {
        self.history_cursor
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn search_engine(&self) -> SearchEngine {
        self.search_engine
    }

    pub fn state(&self) -> SessionState {
        if !self.suggestions.is_empty() {
            SessionState::Suggesting
        } else if self.buffer.is_empty() && self.history_cursor.is_none() {
            SessionState::Idle
        } else {
            SessionState::HistoryBrowsing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNavigator {
        urls: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, url: &str) {
            self.urls.lock().unwrap().push(url.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<(String, Severity)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str, severity: Severity) {
            self.messages
                .lock()
                .unwrap()
                .push((message.to_string(), severity));
        }
    }

    fn registry() -> Arc<CommandRegistry> {
        let mut registry = CommandRegistry::new();
        for command in [
            Command::new("task:add", "task", "Add task", |_| Ok(())).with_hint("[text]"),
            Command::new("task:list", "tasks", "Show tasks", |_| Ok(())),
            Command::new("ui:clear", "clear", "Clear the screen", |_| Ok(())),
            Command::new("task:clear-done", "clear done", "Clear finished items", |_| Ok(())),
            Command::new("timer:start", "timer", "Run timer", |args: &str| {
                args.parse::<u32>()
                    .map(|_| ())
                    .map_err(|_| ActionError::new(format!("invalid duration '{args}'")))
            }),
        ] {
            registry.register(command).unwrap();
        }
        Arc::new(registry)
    }

    fn session() -> (CommandLineSession, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let session = CommandLineSession::new(registry(), HistoryLog::default(), navigator.clone());
        (session, navigator)
    }

    #[test]
    fn test_starts_idle() {
        let (session, _) = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.hint().is_none());
    }

    #[test]
    fn test_typing_enters_suggesting() {
        let (mut session, _) = session();
        session.set_buffer("ta");
        assert_eq!(session.state(), SessionState::Suggesting);
        assert_eq!(session.suggestions().len(), 2);
        assert_eq!(session.selected_index(), None);
    }

    #[test]
    fn test_hint_shown_for_single_typed_trigger() {
        let (mut session, _) = session();
        session.set_buffer("task");
        assert_eq!(session.hint(), Some("task [text]"));
        session.set_buffer("task buy");
        assert_eq!(session.hint(), Some("task [text]"));
        session.set_buffer("ta");
        assert_eq!(session.hint(), None);
    }

    #[test]
    fn test_hint_hidden_without_declared_hint() {
        let (mut session, _) = session();
        session.set_buffer("tasks");
        assert_eq!(session.hint(), None);
    }

    #[test]
    fn test_selection_cycles_both_ways() {
        let (mut session, _) = session();
        session.set_buffer("ta");
        session.handle_key(Key::Down);
        assert_eq!(session.selected_index(), Some(0));
        session.handle_key(Key::Down);
        assert_eq!(session.selected_index(), Some(1));
        session.handle_key(Key::Down);
        assert_eq!(session.selected_index(), Some(0));
        session.handle_key(Key::Up);
        assert_eq!(session.selected_index(), Some(1));
        assert_eq!(session.buffer(), "ta");
    }

    #[test]
    fn test_up_from_no_selection_selects_last() {
        let (mut session, _) = session();
        session.set_buffer("ta");
        session.handle_key(Key::Up);
        assert_eq!(session.selected_index(), Some(1));
    }

    #[test]
    fn test_edit_resets_selection() {
        let (mut session, _) = session();
        session.set_buffer("ta");
        session.handle_key(Key::Down);
        session.set_buffer("tas");
        assert_eq!(session.selected_index(), None);
    }

    #[test]
    fn test_enter_on_selected_hinted_command_autocompletes() {
        let (mut session, _) = session();
        session.set_buffer("ta");
        session.handle_key(Key::Down);
        assert_eq!(session.selected().unwrap().id, "task:add");
        let dispatch = session.handle_key(Key::Enter);
        assert_eq!(
            dispatch,
            Dispatch::Autocompleted {
                buffer: "task ".into()
            }
        );
        assert_eq!(session.buffer(), "task ");
        assert_eq!(session.state(), SessionState::Suggesting);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_enter_on_selected_plain_command_executes() {
        let (mut session, _) = session();
        session.set_buffer("ta");
        session.handle_key(Key::Down);
        session.handle_key(Key::Down);
        let dispatch = session.handle_key(Key::Enter);
        assert_eq!(
            dispatch,
            Dispatch::Executed {
                id: "task:list".into(),
                args: String::new()
            }
        );
        assert_eq!(session.history().entries(), &["tasks"]);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_enter_with_args_executes_longest_trigger() {
        let (mut session, _) = session();
        session.set_buffer("clear done now");
        let dispatch = session.confirm();
        assert_eq!(
            dispatch,
            Dispatch::Executed {
                id: "task:clear-done".into(),
                args: "now".into()
            }
        );
        assert_eq!(session.history().last(), Some("clear done now"));
    }

    #[test]
    fn test_enter_on_empty_buffer_is_ignored() {
        let (mut session, navigator) = session();
        session.set_buffer("   ");
        assert_eq!(session.confirm(), Dispatch::Ignored);
        assert!(navigator.urls.lock().unwrap().is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_action_failure_still_cleans_up() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (session, _) = session();
        let mut session = session.with_notifier(notifier.clone());
        session.set_buffer("timer abc");
        let dispatch = session.confirm();
        assert_eq!(
            dispatch,
            Dispatch::Failed {
                id: "timer:start".into(),
                message: "Run timer failed: invalid duration 'abc'".into()
            }
        );
        assert_eq!(session.buffer(), "");
        assert!(session.suggestions().is_empty());
        assert_eq!(session.history().last(), Some("timer abc"));
        let messages = notifier.messages.lock().unwrap();
        assert_eq!(
            messages.last(),
            Some(&(
                "Run timer failed: invalid duration 'abc'".to_string(),
                Severity::Error
            ))
        );
    }

    #[test]
    fn test_success_notification_can_be_disabled() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (session, _) = session();
        let mut session = session
            .with_notifier(notifier.clone())
            .with_success_notifications(false);
        session.set_buffer("clear");
        session.confirm();
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_success_notification_carries_title() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (session, _) = session();
        let mut session = session.with_notifier(notifier.clone());
        session.set_buffer("clear");
        session.confirm();
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec![("Clear the screen".to_string(), Severity::Info)]
        );
    }

    #[test]
    fn test_shortcut_then_url_then_search() {
        let (session, navigator) = session();
        let mut session = session
            .with_shortcuts([("gh", "https://github.com")].into_iter().collect())
            .with_search_engine(SearchEngine::Bing);

        session.set_buffer("gh issues");
        assert_eq!(
            session.confirm(),
            Dispatch::Shortcut {
                url: "https://github.com".into()
            }
        );

        session.set_buffer("https://docs.rs");
        assert_eq!(
            session.confirm(),
            Dispatch::Url {
                url: "https://docs.rs".into()
            }
        );

        session.set_buffer("rust lifetimes");
        assert_eq!(
            session.confirm(),
            Dispatch::Search {
                engine: SearchEngine::Bing,
                url: "https://www.bing.com/search?q=rust%20lifetimes".into()
            }
        );

        assert_eq!(
            *navigator.urls.lock().unwrap(),
            vec![
                "https://github.com",
                "https://docs.rs",
                "https://www.bing.com/search?q=rust%20lifetimes"
            ]
        );
        assert_eq!(
            session.history().entries(),
            &["gh issues", "https://docs.rs", "rust lifetimes"]
        );
    }

    #[test]
    fn test_history_browsing_with_empty_suggestions() {
        let (mut session, _) = session();
        for line in ["clear", "tasks"] {
            session.set_buffer(line);
            session.confirm();
        }
        session.handle_key(Key::Up);
        assert_eq!(session.buffer(), "tasks");
        assert_eq!(session.state(), SessionState::HistoryBrowsing);
        session.handle_key(Key::Up);
        assert_eq!(session.buffer(), "clear");
        session.handle_key(Key::Up);
        assert_eq!(session.buffer(), "clear");
        session.handle_key(Key::Down);
        assert_eq!(session.buffer(), "tasks");
        session.handle_key(Key::Down);
        assert_eq!(session.buffer(), "");
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_arrows_with_empty_history_leave_buffer_alone() {
        let (mut session, _) = session();
        session.set_buffer("zzz");
        assert!(session.suggestions().is_empty());
        session.handle_key(Key::Up);
        assert_eq!(session.buffer(), "zzz");
    }

    #[test]
    fn test_tab_completes_first_suggestion() {
        let (mut session, _) = session();
        session.set_buffer("tim");
        assert_eq!(
            session.handle_key(Key::Tab),
            Dispatch::Autocompleted {
                buffer: "timer ".into()
            }
        );
        assert_eq!(session.buffer(), "timer ");
    }

    #[test]
    fn test_tab_without_suggestions_is_ignored() {
        let (mut session, _) = session();
        session.set_buffer("zzz");
        assert_eq!(session.handle_key(Key::Tab), Dispatch::Ignored);
        assert_eq!(session.buffer(), "zzz");
    }

    #[test]
    fn test_escape_hides_then_clears() {
        let (mut session, _) = session();
        session.set_buffer("task");
        session.handle_key(Key::Escape);
        assert!(session.suggestions().is_empty());
        assert!(session.hint().is_none());
        assert_eq!(session.buffer(), "task");
        session.handle_key(Key::Escape);
        assert_eq!(session.buffer(), "");
        assert_eq!(session.state(), SessionState::Idle);
    }
}
