//! Passive pattern detection.
//!
//! The [`Observer`] watches a stream of loosely shaped events from a host
//! system. Each event is filed under a signal key; when a key's stability
//! signal reaches the configured threshold the observer builds a pattern
//! from the event and hands it to its [`PatternSink`], exactly once per key.
//!
//! ```no_run
//! use serde_json::json;
//! use wikai::observer::{Observer, ObserverConfig};
//! use wikai::storage::PatternStore;
//!
//! let store = PatternStore::open("./patterns")?;
//! let mut observer = Observer::with_config(store, ObserverConfig::default())
//!     .on_capture(|id, title| println!("captured {id}: {title}"));
//!
//! observer.observe(&json!({
//!     "event": "convergence",
//!     "title": "Found stable solution",
//!     "axiom": "The core truth discovered",
//!     "stability": 0.95
//! }));
//! # Ok::<(), wikai::storage::StoreError>(())
//! ```

pub mod candidate;
pub mod extract;

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::storage::{self, NewPattern, PatternStore, StoreError};

pub use candidate::{Candidate, CandidateState};

/// Default minimum stability for auto-capture.
pub const DEFAULT_STABILITY_THRESHOLD: f64 = 0.8;

/// Default number of recent events kept for inspection.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Event-type fragments that mark a convergence event.
pub const CONVERGENCE_KEYWORDS: &[&str] = &[
    "converge",
    "stable",
    "lock",
    "crystallize",
    "emerge",
    "synthesis",
    "equilibrium",
    "solution",
];

/// Destination for patterns the observer decides to capture.
pub trait PatternSink {
    /// Persists the pattern and returns its id.
    fn capture(&mut self, pattern: NewPattern) -> storage::Result<String>;
}

impl PatternSink for PatternStore {
    fn capture(&mut self, pattern: NewPattern) -> storage::Result<String> {
        PatternStore::capture(self, pattern)
    }
}

impl<S: PatternSink + ?Sized> PatternSink for &mut S {
    fn capture(&mut self, pattern: NewPattern) -> storage::Result<String> {
        (**self).capture(pattern)
    }
}

/// Capture policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverConfig {
    /// Capture automatically once a key reaches the threshold
    pub auto_capture: bool,
    /// Minimum stability (inclusive) for auto-capture
    pub stability_threshold: f64,
    /// Origin for patterns whose events do not name one
    pub system_name: String,
    /// Only events whose type contains a [`CONVERGENCE_KEYWORDS`] entry may trigger auto-capture
    pub require_convergence_event: bool,
    /// How many recent events to keep
    pub buffer_size: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            auto_capture: true,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            system_name: storage::UNKNOWN_ORIGIN.to_string(),
            require_convergence_event: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// An event as the observer received it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedEvent {
    pub received_at: DateTime<Utc>,
    pub event_type: String,
    pub data: Value,
}

/// Observer counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObserverStats {
    pub observed_count: u64,
    pub captured_count: u64,
    pub threshold: f64,
    pub candidates_count: usize,
    /// Captures the sink rejected
    pub failed_captures: u64,
    pub buffer_size: usize,
}

/// Called with `(pattern_id, title)` after each successful capture.
pub type CaptureHook = Box<dyn FnMut(&str, &str) + Send>;

/// Called with a message at every decision point.
pub type DebugHook = Box<dyn FnMut(&str) + Send>;

/// Watches events and captures converging signals into a [`PatternSink`].
pub struct Observer<S: PatternSink = PatternStore> {
    sink: S,
    config: ObserverConfig,
    candidates: BTreeMap<String, Candidate>,
    recent: VecDeque<ObservedEvent>,
    observed_count: u64,
    captured_count: u64,
    failed_captures: u64,
    on_capture: Option<CaptureHook>,
    debug_hook: Option<DebugHook>,
}

impl<S: PatternSink> Observer<S> {
    /// Creates an observer with the default policy.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, ObserverConfig::default())
    }

    pub fn with_config(sink: S, config: ObserverConfig) -> Self {
        Self {
            sink,
            config,
            candidates: BTreeMap::new(),
            recent: VecDeque::new(),
            observed_count: 0,
            captured_count: 0,
            failed_captures: 0,
            on_capture: None,
            debug_hook: None,
        }
    }

    /// Installs the capture hook. A panicking hook is logged and ignored.
    pub fn on_capture<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, &str) + Send + 'static,
    {
        self.on_capture = Some(Box::new(hook));
        self
    }

    /// Installs the debug hook. A panicking hook is logged and ignored.
    pub fn debug_callback<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.debug_hook = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Observes one event; returns the new pattern id if it triggered a capture.
    ///
    /// Never fails: fields that cannot be read are treated as absent, and a
    /// capture the sink rejects leaves the key in `Tracking` so a later
    /// qualifying event can retry.
    pub fn observe(&mut self, event: &Value) -> Option<String> {
        self.observed_count += 1;
        let now = Utc::now();
        let event_type = extract::event_type(event);
        self.remember(event, &event_type, now);

        let stability = extract::extract_stability(event);
        let key = self.signal_key(event, &event_type);
        self.emit_debug(&format!(
            "Observed: {event_type} | stability={} | key={key}",
            describe(stability)
        ));

        let title = extract::text_field(event, extract::TITLE_KEYS)
            .map(|(_, s)| s)
            .unwrap_or_default();
        let candidate = self
            .candidates
            .entry(key.clone())
            .or_insert_with(|| Candidate::new(title, now));
        let is_new = candidate.observations == 0;
        candidate.record(stability, now);
        let already_captured = candidate.is_captured();

        if is_new {
            self.emit_debug(&format!("New candidate: {key}"));
        }
        if already_captured {
            self.emit_debug(&format!("Duplicate signal skipped: {key}"));
            return None;
        }
        if !self.config.auto_capture {
            return None;
        }
        let Some(value) = stability else {
            self.emit_debug(&format!("No stability signal, tracking only: {key}"));
            return None;
        };
        if value < self.config.stability_threshold {
            self.emit_debug(&format!(
                "Below threshold ({value:.3} < {:.3}): {key}",
                self.config.stability_threshold
            ));
            return None;
        }
        if self.config.require_convergence_event && !is_convergence_event(&event_type) {
            self.emit_debug(&format!("Not a convergence event ({event_type}): {key}"));
            return None;
        }

        let pattern = extract::pattern_from_event(event, &self.config.system_name, Some(value));
        match self.capture_for_key(&key, pattern) {
            Ok(id) => Some(id),
            Err(e) => {
                self.failed_captures += 1;
                tracing::warn!("Auto-capture failed for {key}: {e}");
                self.emit_debug(&format!("Capture failed, still tracking {key}: {e}"));
                None
            }
        }
    }

    /// Captures the event regardless of threshold or prior capture.
    ///
    /// Fails with [`StoreError::Validation`] when the event carries no title
    /// (`title`/`name`) or axiom (`axiom`/`description`), or when its winning
    /// stability field is not a number.
    pub fn force_capture(&mut self, event: &Value) -> storage::Result<String> {
        let stability = extract::first_value_strict(event, extract::STABILITY_EXTRACTORS)
            .map_err(|path| StoreError::Validation(format!("malformed stability value at '{path}'")))?;

        let Some((_, title)) = extract::text_field(event, extract::TITLE_KEYS) else {
            return Err(StoreError::Validation(format!(
                "event has no title (expected one of: {})",
                extract::TITLE_KEYS.join(", ")
            )));
        };
        if extract::text_field(event, extract::AXIOM_KEYS).is_none() {
            return Err(StoreError::Validation(format!(
                "event has no axiom (expected one of: {})",
                extract::AXIOM_KEYS.join(", ")
            )));
        }

        let now = Utc::now();
        let event_type = extract::event_type(event);
        let key = self.signal_key(event, &event_type);
        self.candidates
            .entry(key.clone())
            .or_insert_with(|| Candidate::new(title, now))
            .record(stability, now);
        self.emit_debug(&format!("Force capture requested: {key}"));

        let pattern = extract::pattern_from_event(event, &self.config.system_name, stability);
        self.capture_for_key(&key, pattern)
    }

    fn capture_for_key(&mut self, key: &str, pattern: NewPattern) -> storage::Result<String> {
        let title = pattern.title.clone();
        let id = self.sink.capture(pattern)?;

        if let Some(candidate) = self.candidates.get_mut(key) {
            candidate.mark_captured(id.clone());
        }
        self.captured_count += 1;

        tracing::info!("Observer captured {id} - {title}");
        self.emit_debug(&format!("CAPTURED: {id} - {title}"));
        if let Some(hook) = self.on_capture.as_mut() {
            run_hook("on_capture", || hook(id.as_str(), title.as_str()));
        }
        Ok(id)
    }

    /// Signal key: the event's `key` field, else `origin::title::axiom`.
    fn signal_key(&self, event: &Value, event_type: &str) -> String {
        if let Some((_, key)) = extract::text_field(event, &["key"]) {
            return key.to_string();
        }
        let origin = extract::text_field(event, &["origin"])
            .map(|(_, s)| s)
            .unwrap_or(self.config.system_name.as_str());
        let title = extract::text_field(event, extract::TITLE_KEYS)
            .map(|(_, s)| s)
            .unwrap_or(event_type);
        let axiom = extract::text_field(event, extract::AXIOM_KEYS)
            .map(|(_, s)| s)
            .unwrap_or_default();
        format!("{origin}::{title}::{axiom}")
    }

    fn remember(&mut self, event: &Value, event_type: &str, now: DateTime<Utc>) {
        if self.config.buffer_size == 0 {
            return;
        }
        self.recent.push_back(ObservedEvent {
            received_at: now,
            event_type: event_type.to_string(),
            data: event.clone(),
        });
        while self.recent.len() > self.config.buffer_size {
            self.recent.pop_front();
        }
    }

    fn emit_debug(&mut self, message: &str) {
        tracing::debug!("[observer] {message}");
        if let Some(hook) = self.debug_hook.as_mut() {
            run_hook("debug", || hook(message));
        }
    }

    /// Tracked signal keys and their state.
    pub fn candidates(&self) -> &BTreeMap<String, Candidate> {
        &self.candidates
    }

    pub fn candidate(&self, key: &str) -> Option<&Candidate> {
        self.candidates.get(key)
    }

    /// Most recent events, oldest first.
    pub fn recent_events(&self) -> &VecDeque<ObservedEvent> {
        &self.recent
    }

    pub fn stats(&self) -> ObserverStats {
        ObserverStats {
            observed_count: self.observed_count,
            captured_count: self.captured_count,
            threshold: self.config.stability_threshold,
            candidates_count: self.candidates.len(),
            failed_captures: self.failed_captures,
            buffer_size: self.recent.len(),
        }
    }
}

/// Whether the event type names a convergence.
pub fn is_convergence_event(event_type: &str) -> bool {
    let event_type = event_type.to_lowercase();
    CONVERGENCE_KEYWORDS.iter().any(|kw| event_type.contains(kw))
}

fn describe(stability: Option<f64>) -> String {
    stability.map_or_else(|| "undefined".to_string(), |s| format!("{s:.3}"))
}

fn run_hook(name: &str, hook: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(hook)).is_err() {
        tracing::warn!("Observer {name} hook panicked; ignoring");
    }
}
