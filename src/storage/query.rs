//! Search predicates and result ordering.

use std::cmp::Ordering;

use serde_json::Value;

use super::models::Pattern;
use super::schema;

/// Extra-data key consulted by the `domain` filter.
pub const DOMAIN_KEY: &str = "domain";

/// A multi-predicate search; every predicate that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    /// Case-insensitive substring over title, axiom and abstract
    pub text: Option<String>,
    /// Matches when the pattern carries any of these tags
    pub tags: Vec<String>,
    /// Minimum stability score (absent scores count as 0); a non-finite
    /// minimum matches nothing
    pub min_stability: Option<f64>,
    /// Case-insensitive match on the pattern's `domain` extra field
    pub domain: Option<String>,
    /// Case-insensitive match on the pattern's origin
    pub origin: Option<String>,
    /// Maximum number of results, applied after ordering
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn min_stability(mut self, min: f64) -> Self {
        self.min_stability = Some(min);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `pattern` satisfies every predicate in this query.
    pub fn matches(&self, pattern: &Pattern) -> bool {
        if !self.tags.is_empty() && !self.tags.iter().any(|t| pattern.has_tag(t)) {
            return false;
        }

        if let Some(min) = self.min_stability {
            if !min.is_finite() || pattern.ranking_stability() < min {
                return false;
            }
        }

        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let hit = [&pattern.title, &pattern.axiom, &pattern.summary]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(domain) = &self.domain {
            match pattern.data.get(DOMAIN_KEY).and_then(Value::as_str) {
                Some(value) if value.eq_ignore_ascii_case(domain) => {}
                _ => return false,
            }
        }

        if let Some(origin) = &self.origin {
            if !pattern.origin.eq_ignore_ascii_case(origin) {
                return false;
            }
        }

        true
    }
}

/// Search result order: stability descending, then id ascending.
pub fn rank_order(a: &Pattern, b: &Pattern) -> Ordering {
    b.ranking_stability()
        .total_cmp(&a.ranking_stability())
        .then_with(|| schema::compare_ids(&a.id, &b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Map};
    use std::collections::BTreeMap;

    fn pattern(id: &str, stability: Option<f64>, tags: &[&str]) -> Pattern {
        let mut metrics = BTreeMap::new();
        if let Some(s) = stability {
            metrics.insert("stability_score".to_string(), s);
        }
        Pattern {
            id: id.to_string(),
            title: "Iron Wood Protocol".to_string(),
            axiom: "Hardness plus softness".to_string(),
            origin: "Forge".to_string(),
            timestamp: Utc::now(),
            summary: "Conflict resolution through role transformation".to_string(),
            mechanism: Map::new(),
            reasoning_chain: Vec::new(),
            metrics,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            validation_history: Vec::new(),
            data: Map::new(),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(SearchQuery::new().matches(&pattern("WIKAI_0001", None, &[])));
    }

    #[test]
    fn test_text_matches_case_insensitively_across_fields() {
        let p = pattern("WIKAI_0001", None, &[]);
        assert!(SearchQuery::new().text("iron wood").matches(&p));
        assert!(SearchQuery::new().text("SOFTNESS").matches(&p));
        assert!(SearchQuery::new().text("role transform").matches(&p));
        assert!(!SearchQuery::new().text("granite").matches(&p));
    }

    #[test]
    fn test_tags_match_any() {
        let p = pattern("WIKAI_0001", None, &["symbiosis"]);
        assert!(SearchQuery::new().tags(["other", "symbiosis"]).matches(&p));
        assert!(!SearchQuery::new().tags(["other"]).matches(&p));
    }

    #[test]
    fn test_min_stability_inclusive_and_defaults_to_zero() {
        let p = pattern("WIKAI_0001", Some(0.8), &[]);
        assert!(SearchQuery::new().min_stability(0.8).matches(&p));
        assert!(!SearchQuery::new().min_stability(0.81).matches(&p));

        let unscored = pattern("WIKAI_0002", None, &[]);
        assert!(SearchQuery::new().min_stability(0.0).matches(&unscored));
        assert!(!SearchQuery::new().min_stability(0.1).matches(&unscored));
    }

    #[test]
    fn test_domain_uses_extra_field() {
        let mut p = pattern("WIKAI_0001", None, &[]);
        assert!(!SearchQuery::new().domain("games").matches(&p));
        p.data.insert(DOMAIN_KEY.to_string(), json!("Games"));
        assert!(SearchQuery::new().domain("games").matches(&p));
        assert!(!SearchQuery::new().domain("finance").matches(&p));
    }

    #[test]
    fn test_origin_filter() {
        let p = pattern("WIKAI_0001", None, &[]);
        assert!(SearchQuery::new().origin("forge").matches(&p));
        assert!(!SearchQuery::new().origin("anvil").matches(&p));
    }

    #[test]
    fn test_predicates_are_anded() {
        let p = pattern("WIKAI_0001", Some(0.9), &["symbiosis"]);
        let query = SearchQuery::new()
            .text("iron")
            .tags(["symbiosis"])
            .min_stability(0.95);
        assert!(!query.matches(&p));
    }

    #[test]
    fn test_non_finite_min_stability_matches_nothing() {
        let p = pattern("WIKAI_0001", Some(0.9), &[]);
        assert!(!SearchQuery::new().min_stability(f64::NAN).matches(&p));
        assert!(!SearchQuery::new().min_stability(f64::INFINITY).matches(&p));
        assert!(!SearchQuery::new().min_stability(f64::NEG_INFINITY).matches(&p));
    }

    #[test]
    fn test_rank_order() {
        let mut patterns = vec![
            pattern("WIKAI_0003", Some(0.9), &[]),
            pattern("WIKAI_0001", Some(0.5), &[]),
            pattern("WIKAI_0002", Some(0.9), &[]),
            pattern("WIKAI_0004", None, &[]),
        ];
        patterns.sort_by(rank_order);
        let ids: Vec<&str> = patterns.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["WIKAI_0002", "WIKAI_0003", "WIKAI_0001", "WIKAI_0004"]);
    }
}
