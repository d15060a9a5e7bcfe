//! Suggest command - keyword-based tag suggestions.

use anyhow::Result;
use colored::Colorize;

use wikai::storage::schema::suggest_tags;

/// Arguments for the suggest command.
#[derive(clap::Args)]
pub struct Args {
    /// Pattern title
    pub title: String,

    /// Pattern axiom
    pub axiom: String,

    /// Longer description
    #[arg(long = "abstract", value_name = "TEXT", default_value = "")]
    pub summary: String,
}

/// Executes the suggest command.
pub fn run(args: Args) -> Result<()> {
    let tags = suggest_tags(&args.title, &args.axiom, &args.summary);
    if tags.is_empty() {
        println!("{}", "No tag suggestions.".dimmed());
    } else {
        for tag in tags {
            println!("{tag}");
        }
    }
    Ok(())
}
