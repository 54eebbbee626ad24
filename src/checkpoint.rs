use std::collections::{BTreeSet, VecDeque};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::{GenerationConfig, GenerationProfile};
use crate::error::CheckpointError;

pub const SCHEMA_VERSION: u32 = 1;

/// Everything needed to continue a run after the last completed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationState {
    pub schema_version: u32,
    pub accumulated_words: BTreeSet<String>,
    pub remaining_candidates: VecDeque<String>,
    pub deferred_candidates: Vec<String>,
    pub foundation_words: BTreeSet<String>,
    pub batches_processed: usize,
    pub estimated_total_batches: usize,
    pub profile: GenerationProfile,
    pub target_size: usize,
    pub batch_size: usize,
    pub started_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

impl GenerationState {
    pub fn fresh(
        foundation: BTreeSet<String>,
        pool: Vec<String>,
        config: &GenerationConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let needed = config.target_size.saturating_sub(foundation.len());
        let estimated_total_batches = estimate_batches(needed, pool.len(), config.batch_size);
        Self {
            schema_version: SCHEMA_VERSION,
            accumulated_words: foundation.clone(),
            remaining_candidates: pool.into(),
            deferred_candidates: Vec::new(),
            foundation_words: foundation,
            batches_processed: 0,
            estimated_total_batches,
            profile: config.profile,
            target_size: config.target_size,
            batch_size: config.batch_size,
            started_at: now,
            saved_at: now,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.accumulated_words.len() >= self.target_size
    }

    pub fn progress_percent(&self) -> f64 {
        if self.target_size == 0 {
            return 100.0;
        }
        100.0 * self.accumulated_words.len() as f64 / self.target_size as f64
    }

    /// Structural checks run on every load.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(CheckpointError::SchemaMismatch {
                found: self.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        if self.batch_size == 0 {
            return Err(CheckpointError::Invalid("batch size is zero".into()));
        }
        if self.accumulated_words.len() > self.target_size {
            return Err(CheckpointError::Invalid(format!(
                "{} accumulated words exceed the target of {}",
                self.accumulated_words.len(),
                self.target_size
            )));
        }
        if self.saved_at < self.started_at {
            return Err(CheckpointError::Invalid(
                "saved_at is earlier than started_at".into(),
            ));
        }
        let all_words = self
            .accumulated_words
            .iter()
            .chain(&self.remaining_candidates)
            .chain(&self.deferred_candidates)
            .chain(&self.foundation_words);
        for word in all_words {
            if word.is_empty() || !word.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(CheckpointError::Invalid(format!("malformed word {word:?}")));
            }
        }
        if let Some(missing) = self
            .foundation_words
            .iter()
            .find(|word| !self.accumulated_words.contains(*word))
        {
            return Err(CheckpointError::Invalid(format!(
                "foundation word {missing:?} missing from accumulated words"
            )));
        }
        Ok(())
    }

    /// A checkpoint only resumes under the configuration that wrote it.
    pub fn ensure_matches(&self, config: &GenerationConfig) -> Result<(), CheckpointError> {
        let mismatch = |field, checkpoint: String, current: String| {
            Err(CheckpointError::Mismatch {
                field,
                checkpoint,
                current,
            })
        };
        if self.target_size != config.target_size {
            return mismatch(
                "target_size",
                self.target_size.to_string(),
                config.target_size.to_string(),
            );
        }
        if self.batch_size != config.batch_size {
            return mismatch(
                "batch_size",
                self.batch_size.to_string(),
                config.batch_size.to_string(),
            );
        }
        if self.profile != config.profile {
            return mismatch(
                "profile",
                self.profile.to_string(),
                config.profile.to_string(),
            );
        }
        Ok(())
    }
}

/// Informational batch estimate assuming roughly 60% of candidates pass,
/// capped by how many batches the pool can supply.
pub fn estimate_batches(needed: usize, pool_len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    let base = needed.div_ceil(batch_size);
    let estimate = (base as f64 / 0.6).floor() as usize + 1;
    estimate.min(pool_len.div_ceil(batch_size))
}

/// Writes through a temp file in the destination directory, then renames it
/// over `path`. Readers see the old file or the new one, never a torn write.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<&NamedTempFile>) -> io::Result<()>,
{
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        write(&mut writer)?;
        writer.flush()?;
    }
    temp_file.as_file().sync_all()?;
    temp_file.persist(path)?;
    Ok(())
}

/// On-disk home of a [`GenerationState`].
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn io_error(&self, source: io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, detail: impl ToString) -> CheckpointError {
        CheckpointError::Corrupt {
            path: self.path.clone(),
            detail: detail.to_string(),
        }
    }

    /// `Ok(None)` when no checkpoint exists. Anything unreadable is an error.
    pub fn load(&self) -> Result<Option<GenerationState>, CheckpointError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let value: serde_json::Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| self.corrupt(e))?;

        // Check the version before the strict parse so a newer layout reports
        // a schema mismatch rather than an unknown field.
        let found = value
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| self.corrupt("missing schema_version"))?;
        if found != u64::from(SCHEMA_VERSION) {
            return Err(CheckpointError::SchemaMismatch {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                expected: SCHEMA_VERSION,
            });
        }

        let state: GenerationState = serde_json::from_value(value).map_err(|e| self.corrupt(e))?;
        state.validate()?;
        debug!(
            "Loaded checkpoint {} ({} words, {} batches)",
            self.path.display(),
            state.accumulated_words.len(),
            state.batches_processed
        );
        Ok(Some(state))
    }

    pub fn save(&self, state: &GenerationState) -> Result<(), CheckpointError> {
        write_atomic(&self.path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, state)?;
            writer.write_all(b"\n")
        })
        .map_err(|e| self.io_error(e))
    }

    pub fn remove(&self) -> Result<(), CheckpointError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Renames the checkpoint to `<name>.bak`, replacing an older backup.
    pub fn move_aside(&self) -> Result<Option<PathBuf>, CheckpointError> {
        if !self.exists() {
            return Ok(None);
        }
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".bak");
        let backup = self.path.with_file_name(name);
        fs::rename(&self.path, &backup).map_err(|e| self.io_error(e))?;
        warn!(
            "Moved existing checkpoint {} aside to {}",
            self.path.display(),
            backup.display()
        );
        Ok(Some(backup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn sample_state() -> GenerationState {
        let mut config = GenerationConfig::new(GenerationProfile::Standard, "unused.json");
        config.target_size = 10;
        config.batch_size = 2;
        GenerationState::fresh(
            set(&["apple", "river"]),
            vec!["happy".to_string(), "mountain".to_string()],
            &config,
            Utc::now(),
        )
    }

    #[test]
    fn test_estimate_batches() {
        // base = ceil(8 / 2) = 4, floor(4 / 0.6) + 1 = 7, capped at 1 pool batch
        assert_eq!(estimate_batches(8, 2, 2), 1);
        assert_eq!(estimate_batches(8, 100, 2), 7);
        assert_eq!(estimate_batches(0, 100, 2), 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());

        let state = sample_state();
        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.remaining_candidates.front().map(String::as_str), Some("happy"));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        let mut state = sample_state();
        store.save(&state).unwrap();
        state.accumulated_words.insert("happy".to_string());
        state.remaining_candidates.pop_front();
        state.batches_processed = 1;
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap().unwrap().batches_processed, 1);
        // No temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_corrupt_checkpoint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{\"schema_version\": 1, \"accumulated_words\": [").unwrap();
        let store = CheckpointStore::new(&path);
        assert!(matches!(store.load(), Err(CheckpointError::Corrupt { .. })));
    }

    #[test]
    fn test_unknown_field_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        store.save(&sample_state()).unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        value["surprise"] = serde_json::json!(true);
        fs::write(store.path(), value.to_string()).unwrap();
        assert!(matches!(store.load(), Err(CheckpointError::Corrupt { .. })));
    }

    #[test]
    fn test_schema_mismatch() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        store.save(&sample_state()).unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        value["schema_version"] = serde_json::json!(2);
        fs::write(store.path(), value.to_string()).unwrap();
        assert!(matches!(
            store.load(),
            Err(CheckpointError::SchemaMismatch { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_validate_rejects_inconsistent_state() {
        let mut state = sample_state();
        state.foundation_words.insert("zebra".to_string());
        assert!(matches!(state.validate(), Err(CheckpointError::Invalid(_))));

        let mut state = sample_state();
        state.remaining_candidates.push_back("Bad Word".to_string());
        assert!(matches!(state.validate(), Err(CheckpointError::Invalid(_))));

        let mut state = sample_state();
        state.saved_at = state.started_at - chrono::Duration::seconds(1);
        assert!(matches!(state.validate(), Err(CheckpointError::Invalid(_))));
    }

    #[test]
    fn test_ensure_matches() {
        let state = sample_state();
        let mut config = GenerationConfig::new(GenerationProfile::Standard, "unused.json");
        config.target_size = 10;
        config.batch_size = 2;
        assert!(state.ensure_matches(&config).is_ok());

        config.batch_size = 3;
        assert!(matches!(
            state.ensure_matches(&config),
            Err(CheckpointError::Mismatch { field: "batch_size", .. })
        ));
    }

    #[test]
    fn test_move_aside() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        assert!(store.move_aside().unwrap().is_none());

        store.save(&sample_state()).unwrap();
        let backup = store.move_aside().unwrap().unwrap();
        assert_eq!(backup, dir.path().join("state.json.bak"));
        assert!(backup.exists());
        assert!(!store.exists());
    }
}
