//! Console output helpers.
//!
//! Formatting for everything the CLI prints outside of tracing: status
//! badges, key/value summaries, and spinners for API round trips.

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};
use lambda::InstanceStatus;

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", "═".repeat(70).bright_black());
    println!("{}", title.cyan().bold());
    println!("{}", "═".repeat(70).bright_black());
    println!();
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print an indented list item.
pub fn print_list_item(message: &str) {
    println!("  {} {}", "•".cyan(), message);
}

/// Print an aligned key/value line.
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<18} {}", format!("{key}:").bright_black(), value);
}

/// Colored status badge for an instance.
#[must_use]
pub fn status_badge(status: InstanceStatus) -> String {
    let badge = format!("● {status}");
    match status {
        InstanceStatus::Active => badge.green().to_string(),
        InstanceStatus::Booting => badge.yellow().to_string(),
        InstanceStatus::Unhealthy
        | InstanceStatus::Terminating
        | InstanceStatus::Terminated => badge.red().to_string(),
        InstanceStatus::Unknown => badge.bright_black().to_string(),
    }
}

/// Format an hourly price given in cents.
#[must_use]
pub fn format_price(cents_per_hour: u64) -> String {
    format!("${:.2}/hr", cents_per_hour as f64 / 100.0)
}

/// Format a wall-clock duration as `2h 4m 11s` / `4m 11s` / `11s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Map Ctrl-C inside a raw-mode prompt (an interrupted read, not a signal)
/// to a back-out instead of an error.
fn suppress_interrupt<T>(result: dialoguer::Result<Option<T>>) -> Result<Option<T>> {
    match result {
        Ok(answer) => Ok(answer),
        Err(dialoguer::Error::IO(err)) if err.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Yes/no prompt. Backing out with Esc or Ctrl-C counts as "no".
///
/// # Errors
/// Fails when the terminal cannot be driven.
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    let answer = suppress_interrupt(
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact_opt(),
    )?;
    Ok(answer.unwrap_or(false))
}

/// Single-choice prompt over fixed rows. `None` when the user backs out.
///
/// # Errors
/// Fails when the terminal cannot be driven.
pub fn choose(prompt: &str, rows: &[&str], default: usize) -> Result<Option<usize>> {
    suppress_interrupt(
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(rows)
            .default(default)
            .interact_opt(),
    )
}

/// Create a spinner for an API round trip.
///
/// # Panics
/// Panics if the template string is invalid (it is a constant).
#[must_use]
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
