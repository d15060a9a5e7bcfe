//! Show command - display a single pattern.
//!
//! Prints the full record: axiom, abstract, mechanism, reasoning chain,
//! metrics, and validation history. JSON output is the stored document.

use anyhow::Result;
use colored::Colorize;

use crate::cli::{stability_label, Context, OutputFormat};
use wikai::storage::Pattern;

/// Arguments for the show command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    wikai show WIKAI_0001                  Show a pattern\n    \
    wikai show WIKAI_0001 --format json    Print the stored document\n    \
    wikai show WIKAI_0001 --format markdown")]
pub struct Args {
    /// Pattern id (e.g. WIKAI_0001)
    pub id: String,

    /// Output format: text (default), json, markdown
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the show command.
pub fn run(args: Args, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let pattern = store.get(&args.id)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(pattern)?),
        OutputFormat::Markdown => print!("{}", render_markdown(pattern)),
        OutputFormat::Text => print_text(pattern),
    }
    Ok(())
}

fn print_text(pattern: &Pattern) {
    println!("{} {}", pattern.id.cyan(), pattern.title.bold());
    println!();
    println!("  {}  {}", "Axiom:".dimmed(), pattern.axiom);
    println!("  {}  {}", "Origin:".dimmed(), pattern.origin);
    println!(
        "  {}  {}",
        "Captured:".dimmed(),
        pattern.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  {}  {}", "Stability:".dimmed(), stability_label(pattern));
    if !pattern.tags.is_empty() {
        println!("  {}  {}", "Tags:".dimmed(), pattern.tags.join(", "));
    }

    if !pattern.summary.is_empty() {
        println!();
        println!("{}", "Abstract".bold());
        println!("  {}", pattern.summary);
    }

    if !pattern.reasoning_chain.is_empty() {
        println!();
        println!("{}", "Reasoning".bold());
        for (i, step) in pattern.reasoning_chain.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }

    if !pattern.metrics.is_empty() {
        println!();
        println!("{}", "Metrics".bold());
        for (key, value) in &pattern.metrics {
            println!("  {:<24} {}", key.dimmed(), value);
        }
    }

    if !pattern.validation_history.is_empty() {
        println!();
        println!("{}", "Validation history".bold());
        for record in &pattern.validation_history {
            let delta = format!("{:+.3}", record.delta);
            let delta = if record.delta >= 0.0 {
                delta.green()
            } else {
                delta.red()
            };
            println!(
                "  {}  {}  {}  {}",
                record.recorded_at.format("%Y-%m-%d").to_string().dimmed(),
                delta,
                record.result,
                record.context.dimmed()
            );
        }
    }
}

/// Renders a pattern as a markdown document.
fn render_markdown(pattern: &Pattern) -> String {
    let mut out = format!("# {}: {}\n\n", pattern.id, pattern.title);
    out.push_str(&format!("> {}\n\n", pattern.axiom));
    out.push_str(&format!("- **Origin:** {}\n", pattern.origin));
    out.push_str(&format!(
        "- **Captured:** {}\n",
        pattern.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("- **Stability:** {}\n", stability_label(pattern)));
    if !pattern.tags.is_empty() {
        let tags: Vec<String> = pattern.tags.iter().map(|t| format!("`{t}`")).collect();
        out.push_str(&format!("- **Tags:** {}\n", tags.join(" ")));
    }

    if !pattern.summary.is_empty() {
        out.push_str(&format!("\n## Abstract\n\n{}\n", pattern.summary));
    }
    if !pattern.reasoning_chain.is_empty() {
        out.push_str("\n## Reasoning\n\n");
        for (i, step) in pattern.reasoning_chain.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }
    }
    if !pattern.metrics.is_empty() {
        out.push_str("\n## Metrics\n\n| Metric | Value |\n|---|---|\n");
        for (key, value) in &pattern.metrics {
            out.push_str(&format!("| {key} | {value} |\n"));
        }
    }
    if !pattern.validation_history.is_empty() {
        out.push_str("\n## Validation history\n\n");
        for record in &pattern.validation_history {
            out.push_str(&format!(
                "- {} ({:+.3}): {}\n",
                record.result, record.delta, record.context
            ));
        }
    }
    out
}
