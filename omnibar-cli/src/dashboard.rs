//! Local dashboard backing the built-in commands.
//!
//! Notes, tasks, the focus timer, the open panel, and the theme live in one
//! JSON document in the data directory. Every mutation is written back with
//! the core's atomic JSON helpers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{DateTime, Duration, Utc};
use omnibar_core::persistence::{atomic_write_json, load_json};
use omnibar_core::{ActionError, Dashboard};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::terminal::{Console, ConsoleLine};

/// Panels `go` can open.
pub const PANELS: &[&str] = &["home", "notes", "tasks", "timer", "settings"];

/// Themes `theme` accepts.
pub const THEMES: &[&str] = &["dark", "light", "solarized", "high-contrast"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub text: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusTimer {
    pub minutes: u32,
    pub started_at: DateTime<Utc>,
}

impl FocusTimer {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.started_at + Duration::minutes(i64::from(self.minutes))
    }

    /// Whole minutes left, rounded up. Zero once elapsed.
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        let seconds = (self.ends_at() - now).num_seconds().max(0);
        (seconds + 59) / 60
    }
}

/// Persisted dashboard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardState {
    pub notes: Vec<Note>,
    pub tasks: Vec<Task>,
    pub timer: Option<FocusTimer>,
    pub panel: String,
    pub theme: String,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            tasks: Vec::new(),
            timer: None,
            panel: "home".to_string(),
            theme: "dark".to_string(),
        }
    }
}

/// Dashboard whose output goes to the terminal console.
pub struct LocalDashboard {
    state: Mutex<DashboardState>,
    path: Option<PathBuf>,
    console: Arc<Console>,
    help: OnceLock<String>,
    reload_requested: AtomicBool,
}

impl LocalDashboard {
    /// In-memory dashboard starting from `theme`.
    pub fn new(console: Arc<Console>, theme: &str) -> Self {
        let state = DashboardState {
            theme: theme.to_string(),
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
            path: None,
            console,
            help: OnceLock::new(),
            reload_requested: AtomicBool::new(false),
        }
    }

    /// Dashboard persisted at `path`. A missing file starts from defaults
    /// with `theme`; an unreadable one is logged and replaced.
    pub fn open(path: impl Into<PathBuf>, console: Arc<Console>, theme: &str) -> Self {
        let path = path.into();
        let mut dashboard = Self::new(console, theme);
        match load_json::<DashboardState>(&path) {
            Ok(Some(state)) => {
                debug!(
                    notes = state.notes.len(),
                    tasks = state.tasks.len(),
                    "Loaded dashboard state"
                );
                dashboard.state = Mutex::new(state);
            }
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable dashboard state"),
        }
        dashboard.path = Some(path);
        dashboard
    }

    /// Text shown by `help`. Only the first call has an effect.
    pub fn set_help(&self, text: String) {
        let _ = self.help.set(text);
    }

    /// Whether `reload` ran since the last call.
    pub fn take_reload(&self) -> bool {
        self.reload_requested.swap(false, Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, DashboardState>, ActionError> {
        self.state
            .lock()
            .map_err(|_| ActionError::new("dashboard state is unavailable"))
    }

    /// Run `f` against the state, then persist it.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut DashboardState) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let mut state = self.lock()?;
        let result = f(&mut state)?;
        if let Some(path) = &self.path {
            if let Err(e) = atomic_write_json(path, &*state) {
                warn!(path = %path.display(), error = %e, "Failed to save dashboard state");
            }
        }
        Ok(result)
    }

    fn print_tasks(&self, tasks: &[Task]) {
        if tasks.is_empty() {
            self.console.plain("  No tasks.");
        }
        for task in tasks {
            let mark = if task.done { "☑" } else { "☐" };
            self.console.plain(format!("  {mark} {}", task.text));
        }
    }

    fn print_notes(&self, notes: &[&Note]) {
        if notes.is_empty() {
            self.console.plain("  No notes.");
        }
        for note in notes {
            self.console.plain(format!(
                "  ✎ {}  \x1b[90m{}\x1b[0m",
                note.title,
                note.created_at.format("%Y-%m-%d %H:%M")
            ));
        }
    }
}

impl Dashboard for LocalDashboard {
    fn create_note(&self, title: &str) -> Result<(), ActionError> {
        let title = match title.trim() {
            "" => "Untitled".to_string(),
            title => title.to_string(),
        };
        self.update(|state| {
            state.notes.push(Note {
                id: Uuid::new_v4(),
                title: title.clone(),
                created_at: Utc::now(),
            });
            Ok(())
        })?;
        self.console.plain(format!("  ✎ {title}"));
        Ok(())
    }

    fn open_notes(&self, query: &str) -> Result<(), ActionError> {
        let query = query.trim().to_lowercase();
        let state = self.lock()?;
        let notes: Vec<&Note> = state
            .notes
            .iter()
            .filter(|note| note.title.to_lowercase().contains(&query))
            .collect();
        self.print_notes(&notes);
        Ok(())
    }

    fn add_task(&self, text: &str) -> Result<(), ActionError> {
        self.update(|state| {
            state.tasks.push(Task {
                id: Uuid::new_v4(),
                text: text.to_string(),
                done: false,
                created_at: Utc::now(),
            });
            Ok(())
        })
    }

    fn complete_task(&self, text: &str) -> Result<(), ActionError> {
        let needle = text.to_lowercase();
        let completed = self.update(|state| {
            let task = state
                .tasks
                .iter_mut()
                .find(|task| !task.done && task.text.to_lowercase().contains(&needle))
                .ok_or_else(|| ActionError::new(format!("no open task matching '{text}'")))?;
            task.done = true;
            Ok(task.text.clone())
        })?;
        self.console.plain(format!("  ☑ {completed}"));
        Ok(())
    }

    fn clear_done_tasks(&self) -> Result<(), ActionError> {
        let removed = self.update(|state| {
            let before = state.tasks.len();
            state.tasks.retain(|task| !task.done);
            Ok(before - state.tasks.len())
        })?;
        self.console.plain(format!("  Removed {removed} completed task(s)."));
        Ok(())
    }

    fn clear_screen(&self) -> Result<(), ActionError> {
        self.console.push(ConsoleLine::ClearScreen);
        Ok(())
    }

    fn start_timer(&self, minutes: u32) -> Result<(), ActionError> {
        let timer = FocusTimer {
            minutes,
            started_at: Utc::now(),
        };
        let ends_at = timer.ends_at();
        let replaced = self.update(|state| Ok(state.timer.replace(timer).is_some()))?;
        if replaced {
            self.console.plain("  Restarted the running timer.");
        }
        self.console.plain(format!(
            "  ⏱ {minutes} min, until {}",
            ends_at.with_timezone(&chrono::Local).format("%H:%M")
        ));
        Ok(())
    }

    fn stop_timer(&self) -> Result<(), ActionError> {
        let timer = self.update(|state| {
            state
                .timer
                .take()
                .ok_or_else(|| ActionError::new("no timer is running"))
        })?;
        let left = timer.remaining_minutes(Utc::now());
        self.console
            .plain(format!("  ⏱ stopped with {left} min remaining"));
        Ok(())
    }

    fn open_panel(&self, panel: &str) -> Result<(), ActionError> {
        if !PANELS.contains(&panel) {
            return Err(ActionError::new(format!(
                "unknown panel '{panel}' (expected one of: {})",
                PANELS.join(", ")
            )));
        }
        let state = self.update(|state| {
            state.panel = panel.to_string();
            Ok(state.clone())
        })?;
        match panel {
            "tasks" => self.print_tasks(&state.tasks),
            "notes" => self.print_notes(&state.notes.iter().collect::<Vec<_>>()),
            "timer" => match &state.timer {
                Some(timer) => self.console.plain(format!(
                    "  ⏱ {} min remaining",
                    timer.remaining_minutes(Utc::now())
                )),
                None => self.console.plain("  No timer running."),
            },
            "settings" => self.console.plain(format!("  Theme: {}", state.theme)),
            _ => {
                let open = state.tasks.iter().filter(|task| !task.done).count();
                self.console.plain(format!(
                    "  {} note(s), {open} open task(s)",
                    state.notes.len()
                ));
            }
        }
        Ok(())
    }

    fn apply_theme(&self, name: &str) -> Result<(), ActionError> {
        if !THEMES.contains(&name) {
            return Err(ActionError::new(format!(
                "unknown theme '{name}' (expected one of: {})",
                THEMES.join(", ")
            )));
        }
        self.update(|state| {
            state.theme = name.to_string();
            Ok(())
        })
    }

    fn reload(&self) -> Result<(), ActionError> {
        self.reload_requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn show_help(&self) -> Result<(), ActionError> {
        let help = self
            .help
            .get()
            .ok_or_else(|| ActionError::new("help is not available yet"))?;
        self.console.plain(help.trim_end());
        Ok(())
    }
}
