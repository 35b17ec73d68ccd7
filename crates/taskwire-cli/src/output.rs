//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use taskwire_core::{NotificationLevel, Notifier, Task};

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// One task as a table row.
pub fn task_row(task: &Task) {
    let status = if task.is_completable() {
        task.status_label().yellow()
    } else {
        task.status_label().green()
    };
    let due = task
        .complete_before
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    println!(
        "{:>6}  {:<40}  {:<12}  {:<16}  {}",
        task.id.to_string().dimmed(),
        task.title(),
        status,
        task.assignee().unwrap_or("-"),
        due.dimmed()
    );
}

/// Prints notifications to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, level: NotificationLevel) {
        match level {
            NotificationLevel::Success => success(message),
            NotificationLevel::Info => eprintln!("{} {}", "NOTICE".blue(), message),
            NotificationLevel::Error => error(message),
        }
    }
}
