//! Output formatting: JSON / plain rendering and notification lines.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tokio::sync::broadcast::{self, error::TryRecvError};

use catalogo_core::{Notification, Severity};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Render a serializable value; `plain_fn` supplies the plain-text form.
pub fn render<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
    plain_fn: impl FnOnce(&T) -> String,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(data),
        OutputFormat::JsonCompact => serde_json::to_string(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn format_notification(note: &Notification, color: bool) -> String {
    let tag = match note.severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Error => "error",
    };
    if !color {
        return format!("[{tag}] {}", note.message);
    }
    let tag = match note.severity {
        Severity::Info => tag.cyan().to_string(),
        Severity::Success => tag.green().to_string(),
        Severity::Error => tag.red().bold().to_string(),
    };
    format!("[{tag}] {}", note.message)
}

/// Print every notification published so far to stderr.
pub fn drain_notifications(rx: &mut broadcast::Receiver<Notification>, global: &GlobalOpts) {
    let color = should_color(global.color);
    let mut stderr = io::stderr().lock();
    loop {
        match rx.try_recv() {
            Ok(note) => {
                if global.quiet && note.severity != Severity::Error {
                    continue;
                }
                let _ = writeln!(stderr, "{}", format_notification(&note, color));
            }
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "notifications dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
