//! Search command - filter the Commons.

use anyhow::{bail, Result};
use colored::Colorize;

use crate::cli::{print_pattern_row, Context, OutputFormat};
use wikai::storage::SearchQuery;

/// Arguments for the search command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    wikai search retry                       Text in title, axiom, or abstract\n    \
    wikai search --tag resilience --tag ops  Patterns carrying either tag\n    \
    wikai search --min-stability 0.8         Stable patterns only\n    \
    wikai search --domain ops --limit 5      Top five in a domain")]
pub struct Args {
    /// Case-insensitive text to find in title, axiom, or abstract
    pub query: Option<String>,

    /// Tag to match (repeatable; a pattern matches if it carries any)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Minimum stability score (inclusive)
    #[arg(short = 's', long, value_name = "SCORE")]
    pub min_stability: Option<f64>,

    /// Domain recorded with the pattern
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Producing system
    #[arg(short, long)]
    pub origin: Option<String>,

    /// Maximum number of results
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl Args {
    fn to_query(&self) -> Result<SearchQuery> {
        let mut query = SearchQuery::new().tags(self.tags.iter().cloned());
        if let Some(text) = &self.query {
            query = query.text(text.clone());
        }
        if let Some(min) = self.min_stability {
            if !min.is_finite() {
                bail!("--min-stability must be a finite number");
            }
            query = query.min_stability(min);
        }
        if let Some(domain) = &self.domain {
            query = query.domain(domain.clone());
        }
        if let Some(origin) = &self.origin {
            query = query.origin(origin.clone());
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

/// Executes the search command.
pub fn run(args: Args, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let query = args.to_query()?;
    let results = store.search(&query);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text | OutputFormat::Markdown => {
            if results.is_empty() {
                println!("{}", "No matching patterns.".dimmed());
                return Ok(());
            }
            println!("{}", format!("{} matching pattern(s)", results.len()).bold());
            for pattern in results {
                print_pattern_row(pattern);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_args() -> Args {
        Args {
            query: None,
            tags: Vec::new(),
            min_stability: None,
            domain: None,
            origin: None,
            limit: None,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_to_query_maps_every_filter() {
        let mut args = create_test_args();
        args.query = Some("retry".to_string());
        args.tags = vec!["ops".to_string()];
        args.min_stability = Some(0.8);
        args.domain = Some("infra".to_string());
        args.origin = Some("Forge".to_string());
        args.limit = Some(3);

        let query = args.to_query().unwrap();
        assert_eq!(query.text.as_deref(), Some("retry"));
        assert_eq!(query.tags, vec!["ops"]);
        assert_eq!(query.min_stability, Some(0.8));
        assert_eq!(query.domain.as_deref(), Some("infra"));
        assert_eq!(query.origin.as_deref(), Some("Forge"));
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn test_to_query_rejects_nan() {
        let mut args = create_test_args();
        args.min_stability = Some(f64::NAN);
        assert!(args.to_query().is_err());
    }
}
