//! Property-based tests for the registry and history log using proptest.

use proptest::prelude::*;

use omnibar_core::history::{DEFAULT_HISTORY_CAPACITY, Direction, HistoryLog};
use omnibar_core::registry::{Command, CommandRegistry};

fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for (id, trigger, title) in [
        ("note:new", "note", "Create a note"),
        ("note:open", "notes", "Browse notes"),
        ("task:add", "task", "Add a task"),
        ("ui:clear", "clear", "Clear the screen"),
        ("task:clear-done", "clear done", "Clear completed tasks"),
        ("timer:start", "timer", "Start a focus timer"),
        ("timer:stop", "timer stop", "Stop the focus timer"),
    ] {
        registry
            .register(Command::new(id, trigger, title, |_| Ok(())))
            .unwrap();
    }
    registry
}

fn trigger_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["note", "notes", "task", "clear", "clear done", "timer"])
}

// --- Registry properties ---

proptest! {
    #[test]
    fn search_is_deterministic(query in "[a-z ]{0,12}") {
        let registry = registry();
        let first: Vec<String> = registry.search(&query).iter().map(|c| c.id.clone()).collect();
        let second: Vec<String> = registry.search(&query).iter().map(|c| c.id.clone()).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn search_results_contain_the_query(query in "[a-z]{1,6}") {
        let registry = registry();
        for cmd in registry.search(&query) {
            prop_assert!(cmd.trigger.contains(&query) || cmd.title.to_lowercase().contains(&query));
        }
    }

    #[test]
    fn resolve_keeps_argument_text(trigger in trigger_strategy(), args in "[A-Za-z0-9]{1,10}") {
        let registry = registry();
        let line = format!("{trigger} {args}");
        let resolution = registry.resolve(&line).unwrap();
        prop_assert!(resolution.command.trigger.len() >= trigger.len());
        prop_assert!(line.to_lowercase().starts_with(&resolution.command.trigger));
        if resolution.command.trigger == trigger {
            prop_assert_eq!(resolution.args, args);
        }
    }

    #[test]
    fn resolve_ignores_case(trigger in trigger_strategy(), upper in any::<bool>()) {
        let registry = registry();
        let line = if upper { trigger.to_uppercase() } else { trigger.to_string() };
        let resolution = registry.resolve(&line).unwrap();
        prop_assert_eq!(resolution.command.trigger.as_str(), trigger);
        prop_assert!(resolution.args.is_empty());
    }
}

// --- History properties ---

proptest! {
    #[test]
    fn history_never_exceeds_capacity(lines in prop::collection::vec("[a-z]{1,4}", 0..200)) {
        let mut log = HistoryLog::default();
        for line in &lines {
            log.append(line);
        }
        prop_assert!(log.len() <= DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn history_has_no_adjacent_duplicates(lines in prop::collection::vec("[ab]{1,2}", 0..100)) {
        let mut log = HistoryLog::default();
        for line in &lines {
            log.append(line);
        }
        for pair in log.entries().windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
    }

    #[test]
    fn history_walk_round_trips(count in 1usize..30, steps in 0usize..40) {
        let mut log = HistoryLog::default();
        for i in 0..count {
            log.append(&format!("line {i}"));
        }
        let mut cursor = None;
        for _ in 0..steps {
            cursor = log.navigate(Direction::Older, cursor);
        }
        // One more Newer than Older always lands back on a blank line.
        for _ in 0..=steps {
            cursor = log.navigate(Direction::Newer, cursor);
        }
        prop_assert_eq!(cursor, None);
    }
}
