//! Core data models for the Commons
//!
//! A [`Pattern`] is the persisted unit. [`NewPattern`] is what callers hand
//! to the store; the store fills in the id and timestamp.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema;

/// Origin recorded when the producing system is not named.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Metric key holding the stability score.
pub const STABILITY_KEY: &str = "stability_score";

/// Metric key holding the fitness delta.
pub const FITNESS_KEY: &str = "fitness_delta";

fn default_origin() -> String {
    UNKNOWN_ORIGIN.to_string()
}

/// A captured pattern: one stable strategy discovered by some AI system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Pattern {
    /// Store-assigned identifier (e.g. `WIKAI_0001`)
    pub id: String,

    /// Human-readable name
    pub title: String,

    /// The core claim, in one statement
    pub axiom: String,

    /// System that discovered it
    #[serde(default = "default_origin")]
    pub origin: String,

    /// When the store captured it
    pub timestamp: DateTime<Utc>,

    /// Free-text description
    #[serde(default, rename = "abstract")]
    pub summary: String,

    /// Operational detail, stored verbatim
    #[serde(default)]
    pub mechanism: Map<String, Value>,

    /// Steps that led to the discovery
    #[serde(default)]
    pub reasoning_chain: Vec<String>,

    /// Numeric measurements (stability_score, fitness_delta, ...)
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,

    /// Classification tags, no duplicates
    #[serde(default)]
    pub tags: Vec<String>,

    /// Outcomes of applying the pattern, oldest first
    #[serde(default)]
    pub validation_history: Vec<ValidationRecord>,

    /// Extra caller-supplied fields
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Pattern {
    /// The declared stability score, if any.
    pub fn stability_score(&self) -> Option<f64> {
        self.metrics.get(STABILITY_KEY).copied()
    }

    /// Stability used for ranking and threshold filters; absent counts as 0.
    pub fn ranking_stability(&self) -> f64 {
        self.stability_score().unwrap_or(0.0)
    }

    /// The declared fitness delta, if any.
    pub fn fitness_delta(&self) -> Option<f64> {
        self.metrics.get(FITNESS_KEY).copied()
    }

    /// Whether the pattern carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Deterministic unit file name: `{id}_{slug}.json`.
    pub fn file_name(&self) -> String {
        let slug = schema::slugify(&self.title);
        if slug.is_empty() {
            format!("{}.json", self.id)
        } else {
            format!("{}_{}.json", self.id, slug)
        }
    }
}

/// One recorded application of a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationRecord {
    /// Where the pattern was applied
    pub context: String,

    /// What happened (e.g. "success", "failure")
    pub result: String,

    /// Measured change attributable to the pattern
    pub delta: f64,

    /// When the outcome was recorded
    pub recorded_at: DateTime<Utc>,
}

impl ValidationRecord {
    /// Creates a record stamped with the current time.
    pub fn new(context: impl Into<String>, result: impl Into<String>, delta: f64) -> Self {
        Self {
            context: context.into(),
            result: result.into(),
            delta,
            recorded_at: Utc::now(),
        }
    }
}

/// Input to [`PatternStore::capture`](super::PatternStore::capture).
///
/// Built with the chaining setters:
///
/// ```
/// use wikai::storage::NewPattern;
///
/// let pattern = NewPattern::new("Iron Wood Protocol", "Hardness + Softness = Persistence")
///     .origin("ExampleSystem")
///     .stability(0.98)
///     .tags(["conflict_resolution", "symbiosis"]);
/// assert_eq!(pattern.tags.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPattern {
    pub title: String,
    pub axiom: String,
    pub origin: Option<String>,
    pub summary: Option<String>,
    pub mechanism: Map<String, Value>,
    pub reasoning_chain: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
    pub tags: Vec<String>,
    pub extra: Map<String, Value>,
}

impl NewPattern {
    pub fn new(title: impl Into<String>, axiom: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            axiom: axiom.into(),
            ..Self::default()
        }
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn mechanism(mut self, mechanism: Map<String, Value>) -> Self {
        self.mechanism = mechanism;
        self
    }

    pub fn reasoning_chain<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reasoning_chain = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Shorthand for `metric("stability_score", value)`.
    pub fn stability(self, value: f64) -> Self {
        self.metric(STABILITY_KEY, value)
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds an extra field, kept under the pattern's `data` map.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Aggregate view over the Commons.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of stored patterns
    pub count: usize,

    /// Mean over patterns that declare a stability score (0 when none do)
    pub mean_stability: f64,

    /// How many patterns carry each tag
    pub tag_frequency: BTreeMap<String, usize>,

    /// Number of distinct tags
    pub total_tags: usize,

    /// Distinct origins
    pub origins: BTreeSet<String>,
}
