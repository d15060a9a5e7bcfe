//! Capture command - store a new pattern.

use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use serde_json::{json, Map, Value};

use crate::cli::{Context, OutputFormat};
use wikai::storage::schema::suggest_tags;
use wikai::storage::NewPattern;

/// Arguments for the capture command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    wikai capture \"Bounded retries\" \"Retry at most three times\"\n    \
    wikai capture \"Load shedding\" \"Drop work before queues grow\" --stability 0.92 --tag resilience\n    \
    wikai capture \"T\" \"A\" --metric latency_ms=12.5 --step \"observed backlog\" --domain ops\n    \
    wikai capture \"T\" \"A\" --suggest-tags --format json")]
pub struct Args {
    #[command(flatten)]
    pub pattern: PatternArgs,

    /// Add tags suggested from the title, axiom, and abstract
    #[arg(long)]
    pub suggest_tags: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Fields of the pattern being captured.
#[derive(clap::Args, Default)]
pub struct PatternArgs {
    /// Short name of the pattern
    pub title: String,

    /// One-sentence statement of the principle
    pub axiom: String,

    /// Producing system (defaults to "unknown")
    #[arg(short, long)]
    pub origin: Option<String>,

    /// Longer free-text description
    #[arg(long = "abstract", value_name = "TEXT")]
    pub summary: Option<String>,

    /// Stability score in [0, 1]; values outside are clamped
    #[arg(short, long)]
    pub stability: Option<f64>,

    /// Additional metric as KEY=VALUE (repeatable)
    #[arg(short, long = "metric", value_name = "KEY=VALUE")]
    pub metrics: Vec<String>,

    /// Tag to attach (repeatable)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Reasoning step (repeatable, kept in order)
    #[arg(long = "step", value_name = "TEXT")]
    pub steps: Vec<String>,

    /// Mechanism as a JSON object
    #[arg(long, value_name = "JSON")]
    pub mechanism: Option<String>,

    /// Domain recorded with the pattern, used by `search --domain`
    #[arg(short, long)]
    pub domain: Option<String>,
}

/// Executes the capture command.
pub fn run(args: Args, ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let mut new = build_pattern(args.pattern)?;
    if args.suggest_tags {
        let suggested = suggest_tags(&new.title, &new.axiom, new.summary.as_deref().unwrap_or(""));
        new = new.tags(suggested);
    }

    let id = store.capture(new)?;
    let pattern = store.get(&id)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(pattern)?);
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            println!("{} {}", "Captured".green(), id.cyan());
            println!("  {}  {}", "Title:".dimmed(), pattern.title);
            if !pattern.tags.is_empty() {
                println!("  {}  {}", "Tags:".dimmed(), pattern.tags.join(", "));
            }
        }
    }
    Ok(())
}

fn build_pattern(fields: PatternArgs) -> Result<NewPattern> {
    let mut new = NewPattern::new(fields.title, fields.axiom)
        .tags(fields.tags)
        .reasoning_chain(fields.steps);

    if let Some(origin) = fields.origin {
        new = new.origin(origin);
    }
    if let Some(summary) = fields.summary {
        new = new.summary(summary);
    }
    if let Some(stability) = fields.stability {
        new = new.stability(stability);
    }
    for metric in &fields.metrics {
        let (key, value) = parse_metric(metric)?;
        new = new.metric(key, value);
    }
    if let Some(raw) = fields.mechanism {
        new = new.mechanism(parse_mechanism(&raw)?);
    }
    if let Some(domain) = fields.domain {
        new = new.extra("domain", json!(domain));
    }
    Ok(new)
}

fn parse_metric(raw: &str) -> Result<(String, f64)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Metric '{raw}' must be KEY=VALUE");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Metric '{raw}' has an empty key");
    }
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Metric '{key}' is not a number"))?;
    Ok((key.to_string(), value))
}

fn parse_mechanism(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw).context("Mechanism is not valid JSON")? {
        Value::Object(map) => Ok(map),
        _ => bail!("Mechanism must be a JSON object"),
    }
}
