//! Built-in command set.
//!
//! Wires the dashboard's notes, tasks, timer, navigation, and system
//! capabilities to triggers. Must run before any session is created; the
//! session takes the registry behind an `Arc`, which freezes it.

use std::sync::Arc;

use crate::collaborators::Dashboard;
use crate::error::{ActionError, RegistryError};
use crate::registry::{Command, CommandRegistry};

/// Minutes used by `timer` when no duration is given.
pub const DEFAULT_TIMER_MINUTES: u32 = 25;

/// Register every built-in command. Returns how many were added.
pub fn register_builtin_commands(
    registry: &mut CommandRegistry,
    dashboard: Arc<dyn Dashboard>,
) -> Result<usize, RegistryError> {
    let mut added = 0;
    for command in builtin_commands(dashboard) {
        if registry.register(command)? {
            added += 1;
        }
    }
    Ok(added)
}

fn builtin_commands(dashboard: Arc<dyn Dashboard>) -> Vec<Command> {
    let d = dashboard;
    vec![
        // Notes
        Command::new("note:new", "note", "Create a note", with(&d, |d, args| {
            d.create_note(args)
        }))
        .with_hint("[title]")
        .with_icon("✎"),
        Command::new("note:open", "notes", "Browse notes", with(&d, |d, args| {
            d.open_notes(args)
        }))
        .with_hint("[query]")
        .with_icon("✎"),
        // Tasks
        Command::new("task:add", "task", "Add a task", with(&d, |d, args| {
            d.add_task(require(args, "task text")?)
        }))
        .with_hint("[text]")
        .with_icon("☐"),
        Command::new("task:done", "done", "Complete a task", with(&d, |d, args| {
            d.complete_task(require(args, "task text")?)
        }))
        .with_hint("[text]")
        .with_icon("☑"),
        Command::new("task:clear-done", "clear done", "Clear completed tasks", with(&d, |d, _| {
            d.clear_done_tasks()
        }))
        .with_icon("☑"),
        Command::new("ui:clear", "clear", "Clear the screen", with(&d, |d, _| d.clear_screen())),
        // Timer
        Command::new("timer:start", "timer", "Start a focus timer", with(&d, |d, args| {
            d.start_timer(parse_minutes(args)?)
        }))
        .with_hint("[minutes]")
        .with_icon("⏱"),
        Command::new("timer:stop", "timer stop", "Stop the focus timer", with(&d, |d, _| {
            d.stop_timer()
        }))
        .with_icon("⏱"),
        // Navigation
        Command::new("nav:open", "go", "Open a dashboard panel", with(&d, |d, args| {
            d.open_panel(&require(args, "panel name")?.to_lowercase())
        }))
        .with_hint("[panel]")
        .with_icon("→"),
        Command::new("nav:settings", "settings", "Open settings", with(&d, |d, _| {
            d.open_panel("settings")
        }))
        .with_icon("⚙"),
        // System
        Command::new("sys:theme", "theme", "Apply a colour theme", with(&d, |d, args| {
            d.apply_theme(&require(args, "theme name")?.to_lowercase())
        }))
        .with_hint("[name]")
        .with_icon("◐"),
        Command::new("sys:reload", "reload", "Reload the dashboard", with(&d, |d, _| d.reload()))
            .with_icon("↻"),
        Command::new("sys:help", "help", "List available commands", with(&d, |d, _| {
            d.show_help()
        }))
        .with_icon("?"),
    ]
}

/// Bind `f` to a shared dashboard handle.
fn with<F>(
    dashboard: &Arc<dyn Dashboard>,
    f: F,
) -> impl Fn(&str) -> Result<(), ActionError> + Send + Sync + 'static
where
    F: Fn(&dyn Dashboard, &str) -> Result<(), ActionError> + Send + Sync + 'static,
{
    let dashboard = dashboard.clone();
    move |args: &str| f(dashboard.as_ref(), args)
}

fn require<'a>(args: &'a str, what: &str) -> Result<&'a str, ActionError> {
    let args = args.trim();
    if args.is_empty() {
        return Err(ActionError::new(format!("{what} is required")));
    }
    Ok(args)
}

fn parse_minutes(args: &str) -> Result<u32, ActionError> {
    let args = args.trim();
    if args.is_empty() {
        return Ok(DEFAULT_TIMER_MINUTES);
    }
    match args.parse::<u32>() {
        Ok(0) => Err(ActionError::new("timer duration must be at least one minute")),
        Ok(minutes) => Ok(minutes),
        Err(_) => Err(ActionError::new(format!("invalid duration '{args}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every capability call as `"method(args)"`.
    #[derive(Default)]
    struct FakeDashboard {
        calls: Mutex<Vec<String>>,
    }

    impl FakeDashboard {
        fn record(&self, call: String) -> Result<(), ActionError> {
            self.calls.lock().unwrap().push(call);
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Dashboard for FakeDashboard {
        fn create_note(&self, title: &str) -> Result<(), ActionError> {
            self.record(format!("create_note({title})"))
        }
        fn open_notes(&self, query: &str) -> Result<(), ActionError> {
            self.record(format!("open_notes({query})"))
        }
        fn add_task(&self, text: &str) -> Result<(), ActionError> {
            self.record(format!("add_task({text})"))
        }
        fn complete_task(&self, text: &str) -> Result<(), ActionError> {
            self.record(format!("complete_task({text})"))
        }
        fn clear_done_tasks(&self) -> Result<(), ActionError> {
            self.record("clear_done_tasks()".into())
        }
        fn clear_screen(&self) -> Result<(), ActionError> {
            self.record("clear_screen()".into())
        }
        fn start_timer(&self, minutes: u32) -> Result<(), ActionError> {
            self.record(format!("start_timer({minutes})"))
        }
        fn stop_timer(&self) -> Result<(), ActionError> {
            self.record("stop_timer()".into())
        }
        fn open_panel(&self, panel: &str) -> Result<(), ActionError> {
            self.record(format!("open_panel({panel})"))
        }
        fn apply_theme(&self, name: &str) -> Result<(), ActionError> {
            self.record(format!("apply_theme({name})"))
        }
        fn reload(&self) -> Result<(), ActionError> {
            self.record("reload()".into())
        }
        fn show_help(&self) -> Result<(), ActionError> {
            self.record("show_help()".into())
        }
    }

    fn loaded() -> (CommandRegistry, Arc<FakeDashboard>) {
        let dashboard = Arc::new(FakeDashboard::default());
        let mut registry = CommandRegistry::new();
        register_builtin_commands(&mut registry, dashboard.clone()).unwrap();
        (registry, dashboard)
    }

    #[test]
    fn test_registers_all_builtins() {
        let (registry, _) = loaded();
        assert_eq!(registry.len(), 13);
    }

    #[test]
    fn test_triggers_and_ids_unique() {
        let (registry, _) = loaded();
        let mut triggers = HashSet::new();
        let mut ids = HashSet::new();
        for cmd in registry.commands() {
            assert!(triggers.insert(cmd.trigger.clone()), "Duplicate trigger: {}", cmd.trigger);
            assert!(ids.insert(cmd.id.clone()), "Duplicate id: {}", cmd.id);
        }
    }

    #[test]
    fn test_second_load_adds_nothing() {
        let dashboard = Arc::new(FakeDashboard::default());
        let mut registry = CommandRegistry::new();
        assert_eq!(
            register_builtin_commands(&mut registry, dashboard.clone()).unwrap(),
            13
        );
        assert_eq!(register_builtin_commands(&mut registry, dashboard).unwrap(), 0);
        assert_eq!(registry.len(), 13);
    }

    #[test]
    fn test_actions_reach_dashboard() {
        let (registry, dashboard) = loaded();
        registry.execute("note:new", "Standup notes").unwrap();
        registry.execute("task:add", "buy milk").unwrap();
        registry.execute("nav:open", "Kanban").unwrap();
        registry.execute("nav:settings", "").unwrap();
        registry.execute("timer:start", "").unwrap();
        registry.execute("timer:start", "50").unwrap();
        assert_eq!(
            dashboard.calls(),
            vec![
                "create_note(Standup notes)",
                "add_task(buy milk)",
                "open_panel(kanban)",
                "open_panel(settings)",
                "start_timer(25)",
                "start_timer(50)",
            ]
        );
    }

    #[test]
    fn test_required_arguments_are_enforced() {
        let (registry, dashboard) = loaded();
        let err = registry.execute("task:add", "  ").unwrap_err();
        assert_eq!(err.to_string(), "Add a task failed: task text is required");
        assert!(registry.execute("sys:theme", "").is_err());
        assert!(dashboard.calls().is_empty());
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("").unwrap(), DEFAULT_TIMER_MINUTES);
        assert_eq!(parse_minutes(" 5 ").unwrap(), 5);
        assert!(parse_minutes("0").is_err());
        assert_eq!(
            parse_minutes("abc").unwrap_err().message,
            "invalid duration 'abc'"
        );
    }

    #[test]
    fn test_builtin_hints() {
        let (registry, _) = loaded();
        assert_eq!(
            registry.get("task:add").unwrap().usage().as_deref(),
            Some("task [text]")
        );
        assert!(registry.get("sys:reload").unwrap().hint.is_none());
    }
}
