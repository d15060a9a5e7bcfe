//! Stats command - aggregate view of the Commons.

use anyhow::Result;
use colored::Colorize;

use crate::cli::{Context, OutputFormat};

/// Arguments for the stats command.
#[derive(clap::Args)]
pub struct Args {
    /// Number of most-used tags to show
    #[arg(short, long, default_value = "10", value_name = "N")]
    pub top: usize,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the stats command.
pub fn run(args: Args, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let stats = store.stats();

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "WIKAI Commons".bold());
    println!();
    println!("  {}  {}", "Directory:".dimmed(), store.dir().display());
    println!("  {}  {}", "Patterns:".dimmed(), stats.count);
    println!("  {}  {:.3}", "Mean stability:".dimmed(), stats.mean_stability);
    println!("  {}  {} distinct", "Tags:".dimmed(), stats.total_tags);
    if !stats.origins.is_empty() {
        let origins: Vec<&str> = stats.origins.iter().map(String::as_str).collect();
        println!("  {}  {}", "Origins:".dimmed(), origins.join(", "));
    }

    let top: Vec<_> = store.tag_counts().into_iter().take(args.top).collect();
    if !top.is_empty() {
        println!();
        println!("{}", "Top tags:".bold());
        for (tag, count) in top {
            println!("  {:>4}  {}", count.to_string().cyan(), tag);
        }
    }
    Ok(())
}
