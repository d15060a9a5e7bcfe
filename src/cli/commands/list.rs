//! List command - every pattern in id order.

use anyhow::Result;
use colored::Colorize;

use crate::cli::{print_pattern_row, Context, OutputFormat};

/// Arguments for the list command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    wikai list                  List all patterns\n    \
    wikai list --format json    Output as JSON")]
pub struct Args {
    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the list command.
pub fn run(args: Args, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let patterns = store.list_all();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&patterns)?),
        OutputFormat::Text | OutputFormat::Markdown => {
            if patterns.is_empty() {
                println!("{}", "No patterns in the Commons yet.".dimmed());
                println!();
                println!("Run 'wikai capture <TITLE> <AXIOM>' to add one.");
                return Ok(());
            }
            println!(
                "{}",
                format!("  {:<10}  {:>5}  TITLE", "ID", "STAB").bold()
            );
            for pattern in patterns {
                print_pattern_row(pattern);
            }
        }
    }
    Ok(())
}
