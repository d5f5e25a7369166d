//! Interactive prompt.
//!
//! A crossterm raw-mode line editor on top of [`CommandLineSession`]:
//! - typing and Backspace/Delete edit the buffer and refresh suggestions
//! - Up/Down, Enter, Tab, and Esc are handed to the session
//! - Left/Right/Home/End move the cursor
//! - Ctrl-C clears the line, Ctrl-D on an empty line exits
//!
//! Suggestions render as a dropdown below the input, the hint as ghost text.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, terminal};
use omnibar_core::{Command, CommandLineSession, Dispatch, Key};
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;

/// Maximum number of suggestions shown at once.
const MAX_VISIBLE_SUGGESTIONS: usize = 8;

/// Width of the `> ` prompt.
const PROMPT_WIDTH: usize = 2;

/// Run the prompt until EOF.
pub fn run(app: &mut App) -> anyhow::Result<()> {
    debug!(
        history = ?app.history_file(),
        theme = %app.config.theme,
        "Starting interactive prompt"
    );
    let state = app.dashboard.snapshot();
    let open_tasks = state.tasks.iter().filter(|task| !task.done).count();
    println!(
        "\x1b[1;34mOmnibar\x1b[0m \x1b[90m· {open_tasks} open task(s) · Tab completes, `help` lists commands, Ctrl-D exits\x1b[0m"
    );
    let mut prompt = Prompt::default();
    while prompt.read(&mut app.session)?.is_some() {
        app.console.flush()?;
        if app.dashboard.take_reload() {
            match app.reload() {
                Ok(()) => app.console.plain("  Reloaded configuration."),
                Err(e) => app
                    .console
                    .plain(format!("\x1b[31m✗ Reload failed: {e:#}\x1b[0m")),
            }
            app.console.flush()?;
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Prompt {
    /// Cursor position in characters.
    cursor: usize,
    /// Dropdown lines currently drawn below the input.
    rendered_lines: usize,
}

impl Prompt {
    /// Read keys until something is dispatched. `None` on Ctrl-D.
    fn read(&mut self, session: &mut CommandLineSession) -> io::Result<Option<Dispatch>> {
        self.cursor = session.buffer().chars().count();
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), event::EnableBracketedPaste)?;
        let result = self.render(session).and_then(|()| self.read_raw(session));
        // Leave the terminal usable even if reading failed.
        self.clear_dropdown()?;
        execute!(io::stdout(), event::DisableBracketedPaste)?;
        terminal::disable_raw_mode()?;
        print!("\r\n");
        io::stdout().flush()?;
        result
    }

    fn read_raw(&mut self, session: &mut CommandLineSession) -> io::Result<Option<Dispatch>> {
        loop {
            match event::read()? {
                Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press | KeyEventKind::Repeat,
                    ..
                }) => {
                    if let Some(outcome) = self.on_key(session, code, modifiers) {
                        return Ok(outcome);
                    }
                }
                Event::Paste(text) => {
                    let text: String = text.chars().filter(|c| !c.is_control()).collect();
                    let (buffer, cursor) = insert_at(session.buffer(), self.cursor, &text);
                    session.set_buffer(buffer);
                    self.cursor = cursor;
                }
                Event::Resize(..) => {}
                _ => continue,
            }
            self.render(session)?;
        }
    }

    /// Apply one key. `Some` ends the read.
    fn on_key(
        &mut self,
        session: &mut CommandLineSession,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> Option<Option<Dispatch>> {
        let end = |session: &CommandLineSession| session.buffer().chars().count();
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                session.set_buffer("");
                self.cursor = 0;
            }
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                if session.buffer().is_empty() {
                    return Some(None);
                }
            }
            (KeyCode::Enter, _) => match session.handle_key(Key::Enter) {
                Dispatch::Ignored => {}
                Dispatch::Autocompleted { .. } => self.cursor = end(session),
                dispatch => return Some(Some(dispatch)),
            },
            (KeyCode::Tab, _) => {
                session.handle_key(Key::Tab);
                self.cursor = end(session);
            }
            (KeyCode::Esc, _) => {
                session.handle_key(Key::Escape);
                self.cursor = self.cursor.min(end(session));
            }
            (KeyCode::Up, _) => {
                session.handle_key(Key::Up);
                self.cursor = end(session);
            }
            (KeyCode::Down, _) => {
                session.handle_key(Key::Down);
                self.cursor = end(session);
            }
            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = (self.cursor + 1).min(end(session)),
            (KeyCode::Home, _) => self.cursor = 0,
            (KeyCode::End, _) => self.cursor = end(session),
            (KeyCode::Backspace, _) => {
                if let Some((buffer, cursor)) = remove_before(session.buffer(), self.cursor) {
                    session.set_buffer(buffer);
                    self.cursor = cursor;
                }
            }
            (KeyCode::Delete, _) => {
                if let Some((buffer, cursor)) = remove_before(session.buffer(), self.cursor + 1) {
                    session.set_buffer(buffer);
                    self.cursor = cursor;
                }
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                let (buffer, cursor) = insert_at(session.buffer(), self.cursor, &c.to_string());
                session.set_buffer(buffer);
                self.cursor = cursor;
            }
            _ => {}
        }
        None
    }

    /// Redraw the input line, ghost hint, and dropdown.
    fn render(&mut self, session: &CommandLineSession) -> io::Result<()> {
        self.clear_dropdown()?;
        let mut stdout = io::stdout();
        let buffer = session.buffer();

        write!(stdout, "\r\x1b[2K\x1b[1;34m> \x1b[0m{buffer}")?;
        if let Some(ghost) = session.hint().and_then(|hint| ghost_text(buffer, hint)) {
            write!(stdout, "\x1b[90m{ghost}\x1b[0m")?;
        }

        let width = terminal::size().map(|(w, _)| w as usize).unwrap_or(80);
        let suggestions = session.suggestions();
        let (start, end) = visible_range(session.selected_index(), suggestions.len());
        for (index, command) in suggestions.iter().enumerate().take(end).skip(start) {
            let row = suggestion_row(command, width);
            if session.selected_index() == Some(index) {
                write!(stdout, "\r\n\x1b[2K\x1b[7m{row}\x1b[0m")?;
            } else {
                write!(stdout, "\r\n\x1b[2K\x1b[36m{row}\x1b[0m")?;
            }
        }
        self.rendered_lines = end - start;
        if suggestions.len() > self.rendered_lines {
            write!(
                stdout,
                "\r\n\x1b[2K  \x1b[90m({}/{} commands)\x1b[0m",
                self.rendered_lines,
                suggestions.len()
            )?;
            self.rendered_lines += 1;
        }

        if self.rendered_lines > 0 {
            write!(stdout, "\x1b[{}A", self.rendered_lines)?;
        }
        let column = PROMPT_WIDTH + display_width(buffer, self.cursor);
        write!(stdout, "{}", cursor::MoveToColumn(column as u16))?;
        stdout.flush()
    }

    fn clear_dropdown(&mut self) -> io::Result<()> {
        if self.rendered_lines == 0 {
            return Ok(());
        }
        let mut stdout = io::stdout();
        for _ in 0..self.rendered_lines {
            write!(stdout, "\r\n\x1b[2K")?;
        }
        write!(stdout, "\x1b[{}A", self.rendered_lines)?;
        stdout.flush()?;
        self.rendered_lines = 0;
        Ok(())
    }
}

/// Byte offset of the `chars`-th character.
fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// `text` inserted at character `cursor`; returns the new buffer and cursor.
fn insert_at(buffer: &str, cursor: usize, text: &str) -> (String, usize) {
    let at = byte_index(buffer, cursor);
    let mut edited = String::with_capacity(buffer.len() + text.len());
    edited.push_str(&buffer[..at]);
    edited.push_str(text);
    edited.push_str(&buffer[at..]);
    (edited, cursor + text.chars().count())
}

/// Remove the character before `cursor`. `None` when there is none.
fn remove_before(buffer: &str, cursor: usize) -> Option<(String, usize)> {
    if cursor == 0 || cursor > buffer.chars().count() {
        return None;
    }
    let start = byte_index(buffer, cursor - 1);
    let end = byte_index(buffer, cursor);
    let mut edited = String::with_capacity(buffer.len());
    edited.push_str(&buffer[..start]);
    edited.push_str(&buffer[end..]);
    Some((edited, cursor - 1))
}

/// Terminal columns taken by the first `chars` characters.
fn display_width(text: &str, chars: usize) -> usize {
    text[..byte_index(text, chars)].width()
}

/// Ghost text for `hint` after `buffer`: the untyped tail when the hint
/// continues what was typed, otherwise the whole hint set off by spaces.
fn ghost_text(buffer: &str, hint: &str) -> Option<String> {
    let typed = buffer.to_lowercase();
    if hint.len() > typed.len()
        && hint.to_lowercase().starts_with(&typed)
        && hint.is_char_boundary(typed.len())
    {
        return Some(hint[typed.len()..].to_string());
    }
    if buffer.trim().is_empty() {
        return None;
    }
    Some(format!("  {hint}"))
}

/// Window of suggestions to draw so the selection stays visible.
fn visible_range(selected: Option<usize>, total: usize) -> (usize, usize) {
    if total <= MAX_VISIBLE_SUGGESTIONS {
        return (0, total);
    }
    let selected = selected.unwrap_or(0).min(total - 1);
    let start = selected
        .saturating_sub(MAX_VISIBLE_SUGGESTIONS - 1)
        .min(total - MAX_VISIBLE_SUGGESTIONS);
    (start, start + MAX_VISIBLE_SUGGESTIONS)
}

/// `"  <icon> <usage>  <title>"`, cut to fit `width` columns.
fn suggestion_row(command: &Arc<Command>, width: usize) -> String {
    let usage = command.usage().unwrap_or_else(|| command.trigger.clone());
    let row = format!("  {} {usage:<20} {}", command.icon, command.title);
    truncate_to_width(&row, width.saturating_sub(1)).to_string()
}

/// Longest prefix of `text` that fits in `max` columns.
fn truncate_to_width(text: &str, max: usize) -> &str {
    let mut used = 0;
    for (index, ch) in text.char_indices() {
        used += ch.width().unwrap_or(0);
        if used > max {
            return &text[..index];
        }
    }
    text
}
