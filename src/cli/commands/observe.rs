//! Observe command - feed a JSON-lines event stream to the Observer.
//!
//! Each non-blank line is parsed as one JSON event. Lines that are not valid
//! JSON are logged and skipped; the stream keeps going.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Context, OutputFormat};
use wikai::observer::{Observer, ObserverStats, PatternSink};

/// Arguments for the observe command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    wikai observe events.jsonl                   Observe a recorded stream\n    \
    tail -f arena.log | wikai observe            Observe stdin\n    \
    wikai observe events.jsonl --threshold 0.9   Require higher stability\n    \
    wikai observe events.jsonl --force           Capture every event\n    \
    wikai observe events.jsonl --debug           Trace every decision")]
pub struct Args {
    /// File of JSON events, one per line (reads stdin when omitted or '-')
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Stability threshold for auto-capture (overrides config)
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Origin for events that do not name one (overrides config)
    #[arg(long, value_name = "NAME")]
    pub system: Option<String>,

    /// Track signals without capturing
    #[arg(long)]
    pub no_capture: bool,

    /// Only capture on convergence-type events
    #[arg(long)]
    pub require_convergence: bool,

    /// Capture every event regardless of threshold
    #[arg(long, conflicts_with = "no_capture")]
    pub force: bool,

    /// Print the Observer's decision trace to stderr
    #[arg(long)]
    pub debug: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Summary printed when the stream ends.
#[derive(Debug, Default, Serialize)]
struct Report {
    lines: usize,
    skipped: usize,
    captured: Vec<String>,
    rejected: usize,
    stats: Option<ObserverStats>,
}

/// Executes the observe command.
pub fn run(args: Args, ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.open_store()?;

    let mut observer_config = config.observer_config();
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            bail!("--threshold must be between 0 and 1, got {threshold}");
        }
        observer_config.stability_threshold = threshold;
    }
    if let Some(system) = &args.system {
        observer_config.system_name = system.clone();
    }
    if args.no_capture {
        observer_config.auto_capture = false;
    }
    if args.require_convergence {
        observer_config.require_convergence_event = true;
    }

    let mut observer = Observer::with_config(store, observer_config);
    if args.format == OutputFormat::Text {
        observer = observer.on_capture(|id, title| {
            println!("{} {} {}", "Captured".green(), id.cyan(), title);
        });
    }
    if args.debug {
        observer = observer.debug_callback(|message| eprintln!("{}", message.dimmed()));
    }

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) if path.as_os_str() != "-" => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        _ => Box::new(BufReader::new(io::stdin())),
    };

    let report = feed(&mut observer, reader, args.force)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text | OutputFormat::Markdown => print_report(&report),
    }
    Ok(())
}

/// Feeds every line of `reader` to the observer.
fn feed<S: PatternSink>(
    observer: &mut Observer<S>,
    reader: impl BufRead,
    force: bool,
) -> Result<Report> {
    let mut report = Report::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read event stream")?;
        if line.trim().is_empty() {
            continue;
        }
        report.lines += 1;

        let event: Value = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Skipping line {}: not valid JSON ({e})", index + 1);
                report.skipped += 1;
                continue;
            }
        };

        if force {
            match observer.force_capture(&event) {
                Ok(id) => report.captured.push(id),
                Err(e) => {
                    tracing::warn!("Line {} not captured: {e}", index + 1);
                    report.rejected += 1;
                }
            }
        } else if let Some(id) = observer.observe(&event) {
            report.captured.push(id);
        }
    }
    report.stats = Some(observer.stats());
    Ok(report)
}

fn print_report(report: &Report) {
    println!();
    println!(
        "{} {} event(s), {} captured",
        "Observed".bold(),
        report.lines - report.skipped,
        report.captured.len()
    );
    if report.skipped > 0 {
        println!("  {} {} invalid line(s)", "Skipped".yellow(), report.skipped);
    }
    if report.rejected > 0 {
        println!("  {} {} event(s)", "Rejected".yellow(), report.rejected);
    }
    if let Some(stats) = &report.stats {
        println!(
            "  {}  {} signal(s) tracked, threshold {:.2}",
            "Candidates:".dimmed(),
            stats.candidates_count,
            stats.threshold
        );
        if stats.failed_captures > 0 {
            println!(
                "  {}  {}",
                "Failed captures:".dimmed(),
                stats.failed_captures.to_string().red()
            );
        }
    }
}
