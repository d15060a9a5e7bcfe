use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "wikai")]
#[command(version)]
#[command(about = "Institutional memory for AI systems - capture the patterns that converge")]
#[command(long_about = "WIKAI keeps a shared Commons of validated patterns: principles a\n\
    system discovered, written down as durable JSON documents.\n\n\
    The Librarian stores and searches patterns. The Observer watches\n\
    event streams and captures a pattern once its stability crosses\n\
    the configured threshold.")]
#[command(after_help = "EXAMPLES:\n    \
    wikai capture \"Bounded retries\" \"Retry at most three times\" --stability 0.9\n    \
    wikai list                       List every pattern\n    \
    wikai search --tag resilience    Find patterns by tag\n    \
    wikai show WIKAI_0001            View one pattern\n    \
    wikai observe events.jsonl       Feed an event stream to the Observer\n\n\
    For more information about a command, run 'wikai <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Patterns directory (overrides config and WIKAI_PATTERNS_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    patterns_dir: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Capture a new pattern into the Commons
    #[command(long_about = "Validates and stores a new pattern. The pattern receives the\n\
        next WIKAI id and is written as its own JSON file.")]
    Capture(commands::capture::Args),

    /// Show a single pattern
    #[command(long_about = "Displays the full record for one pattern, including metrics and\n\
        validation history.\n\
        \n\
        Supports multiple output formats:\n\
        - text: colored terminal output (default)\n\
        - json: the stored document\n\
        - markdown: formatted for documentation")]
    Show(commands::show::Args),

    /// Search patterns by text, tags, stability, domain, or origin
    #[command(long_about = "Filters the Commons. All given filters must match. Results are\n\
        ranked by stability, highest first.")]
    Search(commands::search::Args),

    /// List every pattern in id order
    List(commands::list::Args),

    /// List tags with usage counts
    Tags(commands::tags::Args),

    /// Show Commons statistics
    Stats(commands::stats::Args),

    /// Feed JSON-lines events to the Observer
    #[command(long_about = "Reads one JSON event per line from a file or stdin and passes each\n\
        to the Observer. Signals whose stability crosses the threshold are\n\
        captured into the Commons.")]
    Observe(commands::observe::Args),

    /// Record a validation outcome against a pattern
    Validate(commands::validate::Args),

    /// Suggest tags for a pattern from its text
    Suggest(commands::suggest::Args),

    /// Print the JSON schema of a stored pattern
    Schema(commands::schema::Args),

    /// View and manage configuration settings
    #[command(long_about = "Provides subcommands to show, get, and set configuration values.\n\
        Configuration is stored in ~/.wikai/config.yaml.")]
    Config(commands::config::Args),

    /// Generate shell completion scripts
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "wikai=debug"
    } else {
        "wikai=warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let ctx = cli::Context {
        patterns_dir: cli.patterns_dir,
    };

    match cli.command {
        Commands::Capture(args) => commands::capture::run(args, &ctx),
        Commands::Show(args) => commands::show::run(args, &ctx),
        Commands::Search(args) => commands::search::run(args, &ctx),
        Commands::List(args) => commands::list::run(args, &ctx),
        Commands::Tags(args) => commands::tags::run(args, &ctx),
        Commands::Stats(args) => commands::stats::run(args, &ctx),
        Commands::Observe(args) => commands::observe::run(args, &ctx),
        Commands::Validate(args) => commands::validate::run(args, &ctx),
        Commands::Suggest(args) => commands::suggest::run(args),
        Commands::Schema(args) => commands::schema::run(args),
        Commands::Config(args) => commands::config::run(args, &ctx),
        Commands::Completions(args) => {
            commands::completions::generate_completions(&mut Cli::command(), args.shell);
            Ok(())
        }
    }
}
