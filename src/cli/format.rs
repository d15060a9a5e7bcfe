//! Output formatting utilities for CLI commands.
//!
//! Provides a unified `OutputFormat` enum plus the one-line pattern summary
//! shared by the listing commands.

use clap::ValueEnum;
use colored::Colorize;

use wikai::storage::Pattern;

/// Output format options for CLI commands.
///
/// - `Text` for human-readable terminal output (default)
/// - `Json` for machine-readable output and scripting
/// - `Markdown` for documentation and copy-paste to issues
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default).
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
    /// Markdown-formatted output (for show command).
    Markdown,
}

/// Formats a stability score for display, `-` when absent.
pub fn stability_label(pattern: &Pattern) -> String {
    pattern
        .stability_score()
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

/// Prints one pattern as a single summary line.
pub fn print_pattern_row(pattern: &Pattern) {
    let tags = if pattern.tags.is_empty() {
        String::new()
    } else {
        format!("[{}]", pattern.tags.join(", "))
    };
    println!(
        "  {}  {:>5}  {}  {}",
        pattern.id.cyan(),
        stability_label(pattern),
        pattern.title.bold(),
        tags.dimmed()
    );
}
