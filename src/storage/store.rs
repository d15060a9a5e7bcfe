//! The Librarian: JSON-file storage layer for the Commons

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::models::{NewPattern, Pattern, StoreStats, ValidationRecord, UNKNOWN_ORIGIN};
use super::query::{self, SearchQuery};
use super::schema;
use super::{Result, StoreError};

/// Owns one directory of pattern units and the index built from it.
///
/// The store is single-writer: mutating calls take `&mut self`. Callers that
/// share a store across threads wrap it in a `Mutex`.
pub struct PatternStore {
    dir: PathBuf,
    patterns: BTreeMap<String, Pattern>,
    files: HashMap<String, PathBuf>,
    next_seq: u64,
}

impl PatternStore {
    /// Opens (creating if needed) the Commons stored in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| StoreError::storage(&dir, e))?;
            tracing::info!("Created patterns directory: {}", dir.display());
        }

        let mut store = Self {
            dir,
            patterns: BTreeMap::new(),
            files: HashMap::new(),
            next_seq: 1,
        };
        store.reload()?;
        Ok(store)
    }

    /// Directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rebuilds the index from the units on disk.
    ///
    /// Units that cannot be read, parsed or validated are skipped with a
    /// warning, but the id in their file name is still counted. The id
    /// counter never moves backwards, so ids handed out by this instance are
    /// not reissued even if their units have disappeared.
    pub fn reload(&mut self) -> Result<usize> {
        let mut patterns = BTreeMap::new();
        let mut files = HashMap::new();
        let mut max_seq = 0;

        for path in self.unit_paths()? {
            let pattern = match read_unit(&path) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("Failed to load pattern {}: {e}", path.display());
                    // Its id stays reserved until the unit is repaired or removed
                    if let Some(seq) = path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .and_then(schema::unit_file_sequence)
                    {
                        max_seq = max_seq.max(seq);
                    }
                    continue;
                }
            };

            if patterns.contains_key(&pattern.id) {
                tracing::warn!(
                    "Duplicate pattern id {} in {}, keeping the first copy",
                    pattern.id,
                    path.display()
                );
                continue;
            }

            if let Some(seq) = schema::parse_id_sequence(&pattern.id) {
                max_seq = max_seq.max(seq);
            }
            files.insert(pattern.id.clone(), path);
            patterns.insert(pattern.id.clone(), pattern);
        }

        self.patterns = patterns;
        self.files = files;
        self.next_seq = self.next_seq.max(max_seq + 1);

        tracing::info!("Loaded {} patterns from Commons", self.patterns.len());
        Ok(self.patterns.len())
    }

    fn unit_paths(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/*.json",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );
        let paths = glob::glob(&pattern)
            .map_err(|e| StoreError::storage(&self.dir, io::Error::other(e)))?;

        let mut units = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => units.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable pattern path: {e}"),
            }
        }
        units.sort();
        Ok(units)
    }

    /// Captures a new pattern and returns its id.
    ///
    /// Validation runs before an id is allocated, so a rejected request
    /// consumes no id. Once allocated, an id is never reissued, even when the
    /// write fails; the store's visible state is unchanged in that case.
    /// An existing file at the target path is never replaced.
    pub fn capture(&mut self, new: NewPattern) -> Result<String> {
        schema::validate_new_pattern(&new)?;

        let NewPattern {
            title,
            axiom,
            origin,
            summary,
            mechanism,
            reasoning_chain,
            mut metrics,
            tags,
            extra,
        } = new;

        if let Some((original, clamped)) = schema::clamp_stability(&mut metrics) {
            tracing::debug!("Clamped stability_score {original} to {clamped} for '{title}'");
        }

        let id = self.allocate_id();
        let pattern = Pattern {
            id: id.clone(),
            title,
            axiom,
            origin: origin
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string()),
            timestamp: Utc::now(),
            summary: summary.unwrap_or_default(),
            mechanism,
            reasoning_chain,
            metrics,
            tags: schema::normalize_tags(tags),
            validation_history: Vec::new(),
            data: extra,
        };

        let path = self.dir.join(pattern.file_name());
        if path.exists() {
            return Err(StoreError::storage(
                &path,
                io::Error::new(io::ErrorKind::AlreadyExists, "unit file already exists"),
            ));
        }
        write_unit(&path, &pattern)?;

        tracing::info!("Captured: {} - {}", pattern.id, pattern.title);
        self.files.insert(id.clone(), path);
        self.patterns.insert(id.clone(), pattern);
        Ok(id)
    }

    fn allocate_id(&mut self) -> String {
        let id = schema::format_id(self.next_seq);
        self.next_seq += 1;
        id
    }

    /// Looks up a pattern by exact id.
    pub fn get(&self, id: &str) -> Result<&Pattern> {
        self.patterns
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Appends an application outcome to a pattern's validation history.
    ///
    /// The unit is rewritten atomically; on failure the in-memory pattern is
    /// left as it was.
    pub fn record_validation(&mut self, id: &str, record: ValidationRecord) -> Result<&Pattern> {
        if !record.delta.is_finite() {
            return Err(StoreError::Validation(format!(
                "validation delta must be a finite number, got {}",
                record.delta
            )));
        }

        let mut updated = self.get(id)?.clone();
        updated.validation_history.push(record);

        let path = self
            .files
            .get(id)
            .cloned()
            .unwrap_or_else(|| self.dir.join(updated.file_name()));
        write_unit(&path, &updated)?;

        tracing::info!(
            "Recorded validation #{} for {}",
            updated.validation_history.len(),
            id
        );
        self.files.insert(id.to_string(), path);
        self.patterns.insert(id.to_string(), updated);
        self.get(id)
    }

    /// Runs a search; see [`SearchQuery`] for the predicates.
    ///
    /// Results are ordered by stability descending, then id ascending.
    pub fn search(&self, query: &SearchQuery) -> Vec<&Pattern> {
        let mut results: Vec<&Pattern> = self
            .patterns
            .values()
            .filter(|p| query.matches(p))
            .collect();
        results.sort_by(|a, b| query::rank_order(a, b));
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        results
    }

    /// Every pattern, ordered by id.
    pub fn list_all(&self) -> Vec<&Pattern> {
        let mut all: Vec<&Pattern> = self.patterns.values().collect();
        all.sort_by(|a, b| schema::compare_ids(&a.id, &b.id));
        all
    }

    /// Number of stored patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Union of all tags.
    pub fn tags(&self) -> BTreeSet<String> {
        self.patterns
            .values()
            .flat_map(|p| p.tags.iter().cloned())
            .collect()
    }

    /// Tags with their usage counts, most used first.
    pub fn tag_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self.tag_frequency().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    fn tag_frequency(&self) -> BTreeMap<String, usize> {
        let mut frequency = BTreeMap::new();
        for tag in self.patterns.values().flat_map(|p| p.tags.iter()) {
            *frequency.entry(tag.clone()).or_insert(0) += 1;
        }
        frequency
    }

    /// Aggregate statistics. An empty store reports zeros.
    pub fn stats(&self) -> StoreStats {
        let scores: Vec<f64> = self
            .patterns
            .values()
            .filter_map(Pattern::stability_score)
            .collect();
        let mean_stability = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        let tag_frequency = self.tag_frequency();
        StoreStats {
            count: self.patterns.len(),
            mean_stability,
            total_tags: tag_frequency.len(),
            tag_frequency,
            origins: self.patterns.values().map(|p| p.origin.clone()).collect(),
        }
    }
}

/// Reads and checks one unit. Stability outside [0, 1] is clamped as on capture.
fn read_unit(path: &Path) -> Result<Pattern> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::storage(path, e))?;
    let mut pattern: Pattern = serde_json::from_str(&content)
        .map_err(|e| StoreError::storage(path, io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let report = schema::validate_pattern(&pattern);
    if !report.is_valid() {
        return Err(StoreError::Validation(format!(
            "{}: {}",
            path.display(),
            report.errors.join("; ")
        )));
    }
    for warning in &report.warnings {
        tracing::warn!("{}: {warning}", path.display());
    }

    if let Some((original, clamped)) = schema::clamp_stability(&mut pattern.metrics) {
        tracing::debug!(
            "Clamped stability_score {original} to {clamped} for {}",
            pattern.id
        );
    }
    Ok(pattern)
}

/// Writes a unit through a temp file and rename so readers never see a
/// partial document.
fn write_unit(path: &Path, pattern: &Pattern) -> Result<()> {
    let content = serde_json::to_string_pretty(pattern)
        .map_err(|e| StoreError::storage(path, io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(|e| StoreError::storage(&temp_path, e))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::storage(path, e));
    }
    Ok(())
}
