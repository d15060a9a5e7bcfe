//! Schema command - JSON schema of a stored pattern.

use anyhow::Result;

/// Arguments for the schema command.
#[derive(clap::Args)]
pub struct Args {
    /// Print on a single line
    #[arg(long)]
    pub compact: bool,
}

/// Executes the schema command.
pub fn run(args: Args) -> Result<()> {
    let schema = wikai::storage::schema::json_schema();
    let text = if args.compact {
        serde_json::to_string(&schema)?
    } else {
        serde_json::to_string_pretty(&schema)?
    };
    println!("{text}");
    Ok(())
}
