//! Pattern document rules shared by the store and the observer.
//!
//! Covers required-field validation, tag normalisation, stability clamping,
//! id formatting, unit file slugs and a small keyword-based tag suggester.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::models::{NewPattern, Pattern, STABILITY_KEY};
use super::{Result, StoreError};

/// Prefix of every store-assigned id.
pub const ID_PREFIX: &str = "WIKAI_";

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Axioms longer than this are accepted but logged.
pub const RECOMMENDED_AXIOM_CHARS: usize = 500;

/// Abstracts longer than this are accepted but logged.
pub const RECOMMENDED_ABSTRACT_CHARS: usize = 2000;

/// Maximum slug length used in unit file names.
const MAX_SLUG_CHARS: usize = 50;

static SLUG_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9]+").expect("slug separator regex is valid")
});

/// Keyword stems that suggest each tag.
const KEYWORD_TAGS: &[(&str, &[&str])] = &[
    ("cooperation", &["cooperat", "mutual", "together", "share"]),
    ("competition", &["compet", "rival", "contest", "versus"]),
    ("optimization", &["optim", "improve", "enhance", "better"]),
    ("learning", &["learn", "train", "adapt", "improve"]),
    ("emergence", &["emerg", "arise", "spontan", "self-organ"]),
    ("convergence", &["converg", "stabil", "lock", "settle"]),
    ("stable", &["stable", "persist", "endur", "robust"]),
    ("recursive", &["recurs", "self-refer", "fractal", "nested"]),
];

/// Formats the id for sequence number `seq` (`WIKAI_0001`, ..., `WIKAI_10000`).
pub fn format_id(seq: u64) -> String {
    format!("{ID_PREFIX}{seq:04}")
}

/// Parses the sequence number out of a store-assigned id.
pub fn parse_id_sequence(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Orders ids by sequence number; ids outside the scheme sort last, by text.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (parse_id_sequence(a), parse_id_sequence(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Lowercases `text` and collapses everything outside `[a-z0-9]` to `_`.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let slug = SLUG_SEPARATORS.replace_all(&lower, "_");
    slug.trim_matches('_').chars().take(MAX_SLUG_CHARS).collect()
}

/// Checks a capture request before any id is allocated.
///
/// Title and axiom must be non-blank, the title must fit
/// [`MAX_TITLE_CHARS`], and every metric must be a finite number.
pub fn validate_new_pattern(pattern: &NewPattern) -> Result<()> {
    if pattern.title.trim().is_empty() {
        return Err(StoreError::Validation("title must not be empty".to_string()));
    }
    if pattern.axiom.trim().is_empty() {
        return Err(StoreError::Validation("axiom must not be empty".to_string()));
    }

    let title_chars = pattern.title.chars().count();
    if title_chars > MAX_TITLE_CHARS {
        return Err(StoreError::Validation(format!(
            "title too long ({title_chars} chars, max {MAX_TITLE_CHARS})"
        )));
    }

    if let Some((key, value)) = pattern.metrics.iter().find(|(_, v)| !v.is_finite()) {
        return Err(StoreError::Validation(format!(
            "metric '{key}' must be a finite number, got {value}"
        )));
    }

    let axiom_chars = pattern.axiom.chars().count();
    if axiom_chars > RECOMMENDED_AXIOM_CHARS {
        tracing::warn!(
            "Axiom for '{}' is long ({axiom_chars} chars, recommended max {RECOMMENDED_AXIOM_CHARS})",
            pattern.title
        );
    }
    if let Some(summary) = &pattern.summary {
        let summary_chars = summary.chars().count();
        if summary_chars > RECOMMENDED_ABSTRACT_CHARS {
            tracing::warn!(
                "Abstract for '{}' is long ({summary_chars} chars, recommended max {RECOMMENDED_ABSTRACT_CHARS})",
                pattern.title
            );
        }
    }

    Ok(())
}

/// Sequence number encoded in a unit file name (`WIKAI_0007_slug.json`).
///
/// Used to keep ids of unreadable units out of circulation.
pub fn unit_file_sequence(file_name: &str) -> Option<u64> {
    let rest = file_name.strip_prefix(ID_PREFIX)?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 || !matches!(rest[digits_end..].chars().next(), Some('_' | '.')) {
        return None;
    }
    rest[..digits_end].parse().ok()
}

/// Outcome of checking a stored document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentReport {
    /// Problems that make the document unusable
    pub errors: Vec<String>,
    /// Problems worth logging; the document still loads
    pub warnings: Vec<String>,
}

impl DocumentReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks a persisted document, e.g. one edited outside the store.
///
/// Blank id, title or axiom, an over-long title and non-finite metrics are
/// errors. An id outside the `WIKAI_` scheme, a long axiom and a stability
/// score outside [0, 1] are warnings.
pub fn validate_pattern(pattern: &Pattern) -> DocumentReport {
    let mut report = DocumentReport::default();

    if pattern.id.trim().is_empty() {
        report.errors.push("missing required field: id".to_string());
    } else if !pattern.id.starts_with(ID_PREFIX) {
        report
            .warnings
            .push(format!("id '{}' should start with '{ID_PREFIX}'", pattern.id));
    }
    if pattern.title.trim().is_empty() {
        report.errors.push("missing required field: title".to_string());
    }
    if pattern.axiom.trim().is_empty() {
        report.errors.push("missing required field: axiom".to_string());
    }

    let title_chars = pattern.title.chars().count();
    if title_chars > MAX_TITLE_CHARS {
        report.errors.push(format!(
            "title too long ({title_chars} chars, max {MAX_TITLE_CHARS})"
        ));
    }
    let axiom_chars = pattern.axiom.chars().count();
    if axiom_chars > RECOMMENDED_AXIOM_CHARS {
        report.warnings.push(format!(
            "axiom is long ({axiom_chars} chars, recommended max {RECOMMENDED_AXIOM_CHARS})"
        ));
    }

    for (key, value) in &pattern.metrics {
        if !value.is_finite() {
            report
                .errors
                .push(format!("metric '{key}' must be a finite number, got {value}"));
        }
    }
    if let Some(stability) = pattern.stability_score() {
        if stability.is_finite() && !(0.0..=1.0).contains(&stability) {
            report.warnings.push(format!(
                "{STABILITY_KEY} {stability} is outside the range [0, 1]"
            ));
        }
    }

    report
}

/// Drops blank tags and duplicates, keeping first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if tag.trim().is_empty() || seen.contains(&tag) {
            continue;
        }
        seen.push(tag);
    }
    seen
}

/// Clamps `stability_score` into [0, 1] in place.
///
/// Returns `(original, clamped)` when the value had to move.
pub fn clamp_stability(metrics: &mut BTreeMap<String, f64>) -> Option<(f64, f64)> {
    let value = metrics.get_mut(STABILITY_KEY)?;
    let original = *value;
    let clamped = original.clamp(0.0, 1.0);
    if clamped == original {
        return None;
    }
    *value = clamped;
    Some((original, clamped))
}

/// Suggests tags from keywords found in the pattern's text.
pub fn suggest_tags(title: &str, axiom: &str, summary: &str) -> Vec<String> {
    let text = format!("{title} {axiom} {summary}").to_lowercase();
    KEYWORD_TAGS
        .iter()
        .filter(|(_, stems)| stems.iter().any(|stem| text.contains(stem)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

/// JSON Schema of the persisted pattern document.
pub fn json_schema() -> Value {
    schemars::schema_for!(Pattern).to_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_id_zero_padded() {
        assert_eq!(format_id(1), "WIKAI_0001");
        assert_eq!(format_id(42), "WIKAI_0042");
        assert_eq!(format_id(12345), "WIKAI_12345");
    }

    #[test]
    fn test_parse_id_sequence() {
        assert_eq!(parse_id_sequence("WIKAI_0001"), Some(1));
        assert_eq!(parse_id_sequence("WIKAI_12345"), Some(12345));
        assert_eq!(parse_id_sequence("WIKAI_"), None);
        assert_eq!(parse_id_sequence("WIKAI_12a"), None);
        assert_eq!(parse_id_sequence("OTHER_0001"), None);
    }

    #[test]
    fn test_compare_ids_numeric_order() {
        assert_eq!(compare_ids("WIKAI_9999", "WIKAI_10000"), Ordering::Less);
        assert_eq!(compare_ids("WIKAI_0002", "WIKAI_0002"), Ordering::Equal);
        assert_eq!(compare_ids("custom", "WIKAI_0001"), Ordering::Greater);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Iron Wood Protocol"), "the_iron_wood_protocol");
        assert_eq!(slugify("  Hardness + Softness!  "), "hardness_softness");
        assert_eq!(slugify("???"), "");
        assert_eq!(slugify(&"a".repeat(80)).len(), 50);
    }

    #[test]
    fn test_validate_rejects_blank_title_and_axiom() {
        let err = validate_new_pattern(&NewPattern::new("", "x")).unwrap_err();
        assert!(err.is_validation());
        let err = validate_new_pattern(&NewPattern::new("x", "   ")).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("axiom"));
    }

    #[test]
    fn test_validate_rejects_long_title() {
        let title = "t".repeat(MAX_TITLE_CHARS + 1);
        let err = validate_new_pattern(&NewPattern::new(title, "x")).unwrap_err();
        assert!(err.to_string().contains("too long"));

        let title = "t".repeat(MAX_TITLE_CHARS);
        assert!(validate_new_pattern(&NewPattern::new(title, "x")).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite_metrics() {
        let pattern = NewPattern::new("t", "a").metric("fitness_delta", f64::NAN);
        let err = validate_new_pattern(&pattern).unwrap_err();
        assert!(err.to_string().contains("fitness_delta"));

        let pattern = NewPattern::new("t", "a").stability(f64::INFINITY);
        assert!(validate_new_pattern(&pattern).is_err());
    }

    #[test]
    fn test_validate_accepts_long_axiom() {
        let pattern = NewPattern::new("t", "a".repeat(RECOMMENDED_AXIOM_CHARS + 10));
        assert!(validate_new_pattern(&pattern).is_ok());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            " ".to_string(),
            "a".to_string(),
        ];
        assert_eq!(normalize_tags(tags), vec!["b", "a"]);
    }

    #[test]
    fn test_clamp_stability() {
        let mut metrics = BTreeMap::from([(STABILITY_KEY.to_string(), 1.4)]);
        assert_eq!(clamp_stability(&mut metrics), Some((1.4, 1.0)));
        assert_eq!(metrics[STABILITY_KEY], 1.0);

        let mut metrics = BTreeMap::from([(STABILITY_KEY.to_string(), -0.2)]);
        assert_eq!(clamp_stability(&mut metrics), Some((-0.2, 0.0)));

        let mut metrics = BTreeMap::from([(STABILITY_KEY.to_string(), 0.8)]);
        assert_eq!(clamp_stability(&mut metrics), None);
        assert_eq!(metrics[STABILITY_KEY], 0.8);

        let mut metrics = BTreeMap::new();
        assert_eq!(clamp_stability(&mut metrics), None);
    }

    #[test]
    fn test_suggest_tags() {
        let tags = suggest_tags(
            "Cooperative Equilibrium",
            "Mutual benefit converges to a stable state",
            "",
        );
        assert!(tags.contains(&"cooperation".to_string()));
        assert!(tags.contains(&"convergence".to_string()));
        assert!(tags.contains(&"stable".to_string()));
        assert!(!tags.contains(&"recursive".to_string()));
    }

    #[test]
    fn test_suggest_tags_none() {
        assert!(suggest_tags("Plain", "Nothing here", "").is_empty());
    }

    #[test]
    fn test_json_schema_lists_pattern_fields() {
        let schema = json_schema();
        let properties = schema["properties"].as_object().unwrap();
        for field in ["id", "title", "axiom", "abstract", "metrics", "validation_history"] {
            assert!(properties.contains_key(field), "schema should describe {field}");
        }
    }

    #[test]
    fn test_unit_file_sequence() {
        assert_eq!(unit_file_sequence("WIKAI_0007_iron_wood.json"), Some(7));
        assert_eq!(unit_file_sequence("WIKAI_0012.json"), Some(12));
        assert_eq!(unit_file_sequence("WIKAI_0012x.json"), None);
        assert_eq!(unit_file_sequence("WIKAI_.json"), None);
        assert_eq!(unit_file_sequence("broken.json"), None);
    }

    fn create_test_document() -> Pattern {
        Pattern {
            id: "WIKAI_0001".to_string(),
            title: "Iron Wood".to_string(),
            axiom: "Hardness + Softness = Persistence".to_string(),
            origin: "Forge".to_string(),
            timestamp: chrono::Utc::now(),
            summary: String::new(),
            mechanism: Default::default(),
            reasoning_chain: Vec::new(),
            metrics: BTreeMap::from([(STABILITY_KEY.to_string(), 0.9)]),
            tags: Vec::new(),
            validation_history: Vec::new(),
            data: Default::default(),
        }
    }

    #[test]
    fn test_validate_pattern_accepts_well_formed_document() {
        let report = validate_pattern(&create_test_document());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_validate_pattern_errors() {
        let mut doc = create_test_document();
        doc.title = " ".to_string();
        doc.axiom.clear();
        doc.metrics.insert("fitness_delta".to_string(), f64::NAN);

        let report = validate_pattern(&doc);
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 3, "errors: {:?}", report.errors);
        assert!(report.errors.iter().any(|e| e.contains("title")));
        assert!(report.errors.iter().any(|e| e.contains("fitness_delta")));
    }

    #[test]
    fn test_validate_pattern_warnings() {
        let mut doc = create_test_document();
        doc.id = "custom-7".to_string();
        doc.metrics.insert(STABILITY_KEY.to_string(), 7.5);

        let report = validate_pattern(&doc);
        assert!(report.is_valid(), "Warnings alone should not invalidate");
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().any(|w| w.contains("7.5")));
    }
}
