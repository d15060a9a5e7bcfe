//! Field extraction from loosely shaped event values.
//!
//! Events are arbitrary JSON. Numeric signals are read through an ordered
//! list of [`Extractor`]s; the first one that yields a finite number wins.
//! Anything that cannot be read confidently counts as absent.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::storage::{NewPattern, FITNESS_KEY, STABILITY_KEY};

/// One way of reading a number out of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// The number at this key path
    Field(&'static [&'static str]),
    /// `1 - x` for the number at this key path
    Complement(&'static [&'static str]),
}

/// Outcome of applying one extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Nothing at the path (or an explicit null)
    Absent,
    /// Something at the path that is not a finite number
    Malformed(String),
    Value(f64),
}

/// Stability sources, highest priority first.
pub const STABILITY_EXTRACTORS: &[Extractor] = &[
    Extractor::Field(&["stability"]),
    Extractor::Field(&["stability_score"]),
    Extractor::Field(&["metrics", "stability"]),
    Extractor::Field(&["metrics", "stability_score"]),
    Extractor::Field(&["health_score"]),
    Extractor::Field(&["coherence"]),
    Extractor::Field(&["components", "coherence"]),
    Extractor::Field(&["components", "stability"]),
    Extractor::Complement(&["loss"]),
];

/// Fitness sources, highest priority first.
pub const FITNESS_EXTRACTORS: &[Extractor] = &[
    Extractor::Field(&["fitness_delta"]),
    Extractor::Field(&["fitness"]),
    Extractor::Field(&["metrics", "fitness_delta"]),
    Extractor::Field(&["metrics", "fitness"]),
    Extractor::Field(&["components", "adaptability"]),
];

/// Keys that may carry the pattern title.
pub const TITLE_KEYS: &[&str] = &["title", "name"];

/// Keys that may carry the axiom.
pub const AXIOM_KEYS: &[&str] = &["axiom", "description"];

/// Keys that may carry the event type.
pub const EVENT_TYPE_KEYS: &[&str] = &["event", "event_type", "type"];

impl Extractor {
    pub fn path(&self) -> &'static [&'static str] {
        match self {
            Extractor::Field(path) | Extractor::Complement(path) => path,
        }
    }

    pub fn apply(&self, event: &Value) -> Extraction {
        let raw = match lookup(event, self.path()) {
            None | Some(Value::Null) => return Extraction::Absent,
            Some(raw) => raw,
        };
        match (self, as_number(raw)) {
            (Extractor::Field(_), Some(n)) => Extraction::Value(n),
            (Extractor::Complement(_), Some(n)) => Extraction::Value(1.0 - n),
            (_, None) => Extraction::Malformed(self.path().join(".")),
        }
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Reads a finite number from a JSON number or numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// First value produced by `extractors`, skipping absent and malformed fields.
pub fn first_value(event: &Value, extractors: &[Extractor]) -> Option<f64> {
    extractors.iter().find_map(|e| match e.apply(event) {
        Extraction::Value(n) => Some(n),
        Extraction::Absent | Extraction::Malformed(_) => None,
    })
}

/// Like [`first_value`], but a malformed field that would have won is an
/// error naming its path.
pub fn first_value_strict(
    event: &Value,
    extractors: &[Extractor],
) -> Result<Option<f64>, String> {
    for extractor in extractors {
        match extractor.apply(event) {
            Extraction::Absent => continue,
            Extraction::Value(n) => return Ok(Some(n)),
            Extraction::Malformed(path) => return Err(path),
        }
    }
    Ok(None)
}

pub fn extract_stability(event: &Value) -> Option<f64> {
    first_value(event, STABILITY_EXTRACTORS)
}

pub fn extract_fitness(event: &Value) -> Option<f64> {
    first_value(event, FITNESS_EXTRACTORS)
}

/// First non-blank string among `keys`, with the key it came from.
pub fn text_field<'a>(event: &'a Value, keys: &[&'static str]) -> Option<(&'static str, &'a str)> {
    keys.iter().find_map(|key| {
        event
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| (*key, s))
    })
}

/// The event type, or `"unknown"`.
pub fn event_type(event: &Value) -> String {
    text_field(event, EVENT_TYPE_KEYS)
        .map(|(_, s)| s.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// String items of an array field; a bare string counts as one item.
fn string_list(event: &Value, key: &str) -> Vec<String> {
    match event.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Builds a capture request from whatever the event provides.
///
/// Title and axiom stay empty when the event has none, leaving the store to
/// reject the request. Event fields not mapped onto a pattern field are kept
/// in the pattern's extra data.
pub fn pattern_from_event(event: &Value, default_origin: &str, stability: Option<f64>) -> NewPattern {
    let mut consumed: Vec<&str> = vec!["abstract", "mechanism", "reasoning_chain", "tags", "metrics"];

    let title = text_field(event, TITLE_KEYS).map(|(key, s)| {
        consumed.push(key);
        s.to_string()
    });
    let axiom = text_field(event, AXIOM_KEYS).map(|(key, s)| {
        consumed.push(key);
        s.to_string()
    });
    let origin = match text_field(event, &["origin"]) {
        Some((key, s)) => {
            consumed.push(key);
            s.to_string()
        }
        None => default_origin.to_string(),
    };

    let mut metrics: BTreeMap<String, f64> = event
        .get("metrics")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| as_number(v).map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default();
    if let Some(s) = stability {
        metrics.insert(STABILITY_KEY.to_string(), s);
    }
    if let Some(f) = extract_fitness(event) {
        metrics.insert(FITNESS_KEY.to_string(), f);
    }

    let extra: Map<String, Value> = event
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter(|(k, _)| !consumed.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();

    NewPattern {
        title: title.unwrap_or_default(),
        axiom: axiom.unwrap_or_default(),
        origin: Some(origin),
        summary: text_field(event, &["abstract"]).map(|(_, s)| s.to_string()),
        mechanism: event
            .get("mechanism")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        reasoning_chain: string_list(event, "reasoning_chain"),
        metrics,
        tags: string_list(event, "tags"),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_stability_wins() {
        let event = json!({"stability": 0.9, "stability_score": 0.1, "loss": 0.5});
        assert_eq!(extract_stability(&event), Some(0.9));
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(extract_stability(&json!({"stability_score": 0.7})), Some(0.7));
        assert_eq!(
            extract_stability(&json!({"metrics": {"stability": 0.6}, "health_score": 0.2})),
            Some(0.6)
        );
        assert_eq!(
            extract_stability(&json!({"metrics": {"stability_score": 0.55}})),
            Some(0.55)
        );
        assert_eq!(
            extract_stability(&json!({"health_score": 0.4, "coherence": 0.3})),
            Some(0.4)
        );
        assert_eq!(extract_stability(&json!({"coherence": 0.3, "loss": 0.9})), Some(0.3));
        assert_eq!(
            extract_stability(&json!({"components": {"stability": 0.35}})),
            Some(0.35)
        );
    }

    #[test]
    fn test_loss_complement() {
        let stability = extract_stability(&json!({"loss": 0.25})).unwrap();
        assert!((stability - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_no_signal_is_undefined() {
        assert_eq!(extract_stability(&json!({"title": "T"})), None);
        assert_eq!(extract_stability(&json!("not an object")), None);
        assert_eq!(extract_stability(&json!({"stability": null})), None);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        assert_eq!(extract_stability(&json!({"stability": " 0.85 "})), Some(0.85));
    }

    #[test]
    fn test_malformed_field_falls_through() {
        let event = json!({"stability": "high", "coherence": 0.6});
        assert_eq!(extract_stability(&event), Some(0.6));
        let event = json!({"metrics": "oops", "stability": [1]});
        assert_eq!(extract_stability(&event), None);
    }

    #[test]
    fn test_strict_reports_malformed_path() {
        let event = json!({"metrics": {"stability": "high"}, "coherence": 0.6});
        assert_eq!(
            first_value_strict(&event, STABILITY_EXTRACTORS),
            Err("metrics.stability".to_string())
        );
        assert_eq!(
            first_value_strict(&json!({"coherence": 0.6}), STABILITY_EXTRACTORS),
            Ok(Some(0.6))
        );
        assert_eq!(first_value_strict(&json!({}), STABILITY_EXTRACTORS), Ok(None));
    }

    #[test]
    fn test_fitness_extraction() {
        assert_eq!(extract_fitness(&json!({"fitness": 0.2})), Some(0.2));
        assert_eq!(
            extract_fitness(&json!({"components": {"adaptability": 0.4}})),
            Some(0.4)
        );
        assert_eq!(extract_fitness(&json!({})), None);
    }

    #[test]
    fn test_event_type() {
        assert_eq!(event_type(&json!({"event": "convergence"})), "convergence");
        assert_eq!(event_type(&json!({"type": "lock"})), "lock");
        assert_eq!(event_type(&json!({})), "unknown");
    }

    #[test]
    fn test_pattern_from_event() {
        let event = json!({
            "event": "convergence",
            "title": "T",
            "description": "A",
            "abstract": "about",
            "mechanism": {"strategy": "tit-for-tat"},
            "reasoning_chain": ["one", 2, "three"],
            "tags": "solo",
            "metrics": {"throughput": 12, "label": "x"},
            "fitness_delta": 0.1,
            "details": {"round": 3}
        });

        let pattern = pattern_from_event(&event, "host", Some(0.9));
        assert_eq!(pattern.title, "T");
        assert_eq!(pattern.axiom, "A");
        assert_eq!(pattern.origin.as_deref(), Some("host"));
        assert_eq!(pattern.summary.as_deref(), Some("about"));
        assert_eq!(pattern.mechanism["strategy"], json!("tit-for-tat"));
        assert_eq!(pattern.reasoning_chain, vec!["one", "three"]);
        assert_eq!(pattern.tags, vec!["solo"]);
        assert_eq!(pattern.metrics.get("throughput"), Some(&12.0));
        assert_eq!(pattern.metrics.get(STABILITY_KEY), Some(&0.9));
        assert_eq!(pattern.metrics.get(FITNESS_KEY), Some(&0.1));
        assert!(!pattern.metrics.contains_key("label"));
        assert_eq!(pattern.extra["details"], json!({"round": 3}));
        assert_eq!(pattern.extra["event"], json!("convergence"));
        assert!(!pattern.extra.contains_key("title"));
        assert!(!pattern.extra.contains_key("description"));
    }

    #[test]
    fn test_pattern_from_event_prefers_event_origin() {
        let event = json!({"title": "T", "axiom": "A", "origin": "Arena"});
        let pattern = pattern_from_event(&event, "host", None);
        assert_eq!(pattern.origin.as_deref(), Some("Arena"));
        assert!(!pattern.metrics.contains_key(STABILITY_KEY));
    }

    #[test]
    fn test_pattern_from_event_missing_fields() {
        let pattern = pattern_from_event(&json!(42), "host", None);
        assert!(pattern.title.is_empty());
        assert!(pattern.axiom.is_empty());
        assert!(pattern.extra.is_empty());
    }
}
