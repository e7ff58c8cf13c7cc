//! Terminal UI helpers for consistent colored output.

use std::future::Future;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Print a success message with green checkmark.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an info message with blue info icon.
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue(), msg);
}

/// Print an error message with red X.
fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a hint/suggestion (dimmed, indented).
fn hint(msg: &str) {
    eprintln!("  {} {}", "→".dimmed(), msg.dimmed());
}

/// Format a value as bold (for slugs, keys, etc.).
pub fn bold(s: &str) -> String {
    s.bold().to_string()
}

/// Shortens `s` to at most `max` characters, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    let single_line = s.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let mut out: String = single_line.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Run an async operation with a spinner showing the given message.
/// Returns the result of the operation.
pub async fn spin<T, F: Future<Output = T>>(msg: &str, fut: F) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.dim} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = fut.await;

    spinner.finish_and_clear();
    result
}

/// Display an error with contextual hints based on the error message.
pub fn print_error(err: &anyhow::Error) {
    let msg = err.to_string();
    error(&msg);

    // Add contextual hints based on error patterns (more specific checks first)
    if msg.contains("Not signed in") {
        // Already has suggestion in message
    } else if msg.contains("Invalid credentials") {
        hint("Check BIGSOLO_ADMIN_USERNAME / BIGSOLO_ADMIN_PASSWORD on the server.");
    } else if msg.contains("401") || msg.contains("Unauthorized") {
        hint("Your token may have changed. Run: bigsolo-admin login");
    } else if msg.contains("unknown namespace") {
        hint("Namespaces: INTERACTIONS_LOG, INTERACTIONS_CACHE, IMG_CHEST_CACHE");
    } else if msg.contains("Too many requests") {
        hint("Wait for the lock to expire or for the next processing run.");
    } else if msg.contains("connection")
        || msg.contains("Connection")
        || msg.contains("dns")
        || msg.contains("timeout")
        || msg.contains("Timeout")
        || msg.contains("network")
        || msg.contains("resolve")
    {
        hint("Check BIGSOLO_API_URL and your internet connection.");
    }
}
