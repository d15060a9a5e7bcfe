//! Config command - manage configuration

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::cli::Context;
use wikai::config::{Config, CONFIG_KEYS};

#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    wikai config                                 Show all settings\n    \
    wikai config get stability_threshold\n    \
    wikai config set system_name Forge\n    \
    wikai config set require_convergence_event true")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Print the config file location
    Path,
}

pub fn run(args: Args, ctx: &Context) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => show_config(ctx),
        Some(ConfigCommand::Get { key }) => {
            println!("{}", ctx.config()?.get(&key)?);
            Ok(())
        }
        Some(ConfigCommand::Set { key, value }) => set_config(&key, &value),
        Some(ConfigCommand::Path) => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    println!("{}", "WIKAI Configuration".bold());
    println!();
    println!("  {}  {}", "File:".dimmed(), Config::config_path()?.display());
    println!();
    for key in CONFIG_KEYS {
        println!("  {:<26} {}", format!("{key}:").dimmed(), config.get(key)?);
    }
    Ok(())
}

/// Sets a value in the config file. Environment overrides are not persisted.
fn set_config(key: &str, value: &str) -> Result<()> {
    let path = Config::config_path()?;
    let mut config = Config::load_from(&path)?;
    config.set(key, value)?;
    config.save_to(&path)?;
    println!("{} {} = {}", "Set".green(), key, value);
    Ok(())
}
