//! Tags command - tag usage across the Commons.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use crate::cli::{Context, OutputFormat};

/// Arguments for the tags command.
#[derive(clap::Args)]
pub struct Args {
    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the tags command.
pub fn run(args: Args, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let counts = store.tag_counts();

    match args.format {
        OutputFormat::Json => {
            let rows: Vec<_> = counts
                .iter()
                .map(|(tag, count)| json!({ "tag": tag, "count": count }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            if counts.is_empty() {
                println!("{}", "No tags yet.".dimmed());
                return Ok(());
            }
            for (tag, count) in counts {
                println!("  {:>4}  {}", count.to_string().cyan(), tag);
            }
        }
    }
    Ok(())
}
