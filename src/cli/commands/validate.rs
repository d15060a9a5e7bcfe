//! Validate command - append a validation outcome to a pattern.

use anyhow::Result;
use colored::Colorize;

use crate::cli::{Context, OutputFormat};
use wikai::storage::ValidationRecord;

/// Arguments for the validate command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    wikai validate WIKAI_0001 \"payments rollout\" held --delta 0.12\n    \
    wikai validate WIKAI_0002 \"chaos drill\" failed --delta -0.3")]
pub struct Args {
    /// Pattern id
    pub id: String,

    /// Where the pattern was tried
    pub context: String,

    /// Outcome, e.g. "held" or "failed"
    pub result: String,

    /// Fitness change observed
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    pub delta: f64,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the validate command.
pub fn run(args: Args, ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let record = ValidationRecord::new(args.context, args.result, args.delta);
    let pattern = store.record_validation(&args.id, record)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(pattern)?),
        OutputFormat::Text | OutputFormat::Markdown => {
            println!(
                "{} {} ({} validation record(s))",
                "Recorded validation for".green(),
                pattern.id.cyan(),
                pattern.validation_history.len()
            );
        }
    }
    Ok(())
}
