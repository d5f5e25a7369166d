//! Terminal-side collaborators: the buffered console, the notifier, and the
//! browser navigator.
//!
//! Actions run while the prompt holds the terminal in raw mode, so nothing
//! they produce is written directly. Output is queued on a [`Console`] and
//! flushed once the prompt has released the terminal.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use omnibar_core::{Navigator, Notifier, Severity};

/// One queued piece of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Plain(String),
    Notice(Severity, String),
    /// Link being handed to the browser.
    Opening(String),
    ClearScreen,
}

/// Output queue shared by everything that wants to print.
#[derive(Debug, Default)]
pub struct Console {
    pending: Mutex<Vec<ConsoleLine>>,
    quiet: bool,
}

impl Console {
    pub fn new(quiet: bool) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            quiet,
        }
    }

    pub fn push(&self, line: ConsoleLine) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(line);
        }
    }

    pub fn plain(&self, text: impl Into<String>) {
        self.push(ConsoleLine::Plain(text.into()));
    }

    /// Drain the queue.
    pub fn take(&self) -> Vec<ConsoleLine> {
        self.pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }

    /// Write everything queued so far to `out`.
    ///
    /// Quiet mode drops info notices and link echoes; warnings, errors, and
    /// command output still show.
    pub fn flush_to(&self, out: &mut impl Write) -> io::Result<()> {
        for line in self.take() {
            match line {
                ConsoleLine::Plain(text) => writeln!(out, "{text}")?,
                ConsoleLine::Notice(Severity::Info, _) | ConsoleLine::Opening(_) if self.quiet => {}
                ConsoleLine::Notice(severity, message) => {
                    writeln!(out, "{}", format_notice(severity, &message))?
                }
                ConsoleLine::Opening(url) => writeln!(out, "\x1b[90m→ {url}\x1b[0m")?,
                ConsoleLine::ClearScreen => write!(out, "\x1b[2J\x1b[H")?,
            }
        }
        out.flush()
    }

    pub fn flush(&self) -> io::Result<()> {
        self.flush_to(&mut io::stdout())
    }
}

/// Colored single-line rendering of a notification.
pub fn format_notice(severity: Severity, message: &str) -> String {
    match severity {
        Severity::Info => format!("\x1b[32m✓ {message}\x1b[0m"),
        Severity::Warning => format!("\x1b[33m! {message}\x1b[0m"),
        Severity::Error => format!("\x1b[31m✗ {message}\x1b[0m"),
    }
}

/// Notifier that queues colored notices on the console.
pub struct TerminalNotifier {
    console: Arc<Console>,
}

impl TerminalNotifier {
    pub fn new(console: Arc<Console>) -> Self {
        Self { console }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.console
            .push(ConsoleLine::Notice(severity, message.to_string()));
    }
}

/// Navigator that opens URLs with the system browser.
pub struct BrowserNavigator {
    console: Arc<Console>,
}

impl BrowserNavigator {
    pub fn new(console: Arc<Console>) -> Self {
        Self { console }
    }
}

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &str) {
        self.console.push(ConsoleLine::Opening(url.to_string()));
        if let Err(e) = open::that(url) {
            tracing::warn!(%url, error = %e, "Failed to open browser");
            self.console.push(ConsoleLine::Notice(
                Severity::Error,
                format!("Could not open {url}: {e}"),
            ));
        }
    }
}
