use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkpoint::{GenerationState, write_atomic};
use crate::error::GenerationError;

pub const FORMAT_NAME: &str = "mnemonic-wordlist";
pub const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordlistMetadata {
    pub format: String,
    pub version: String,
    pub word_count: usize,
    pub generation_method: String,
    pub includes_foundation: bool,
    pub target_size: usize,
    pub batch_size: usize,
    pub batches_processed: usize,
    pub generated_at: DateTime<Utc>,
}

/// The deliverable: exactly `target_size` sorted, unique words.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalWordlist {
    pub words: Vec<String>,
    pub metadata: WordlistMetadata,
}

#[derive(Serialize)]
struct ArtifactJson<'a> {
    #[serde(flatten)]
    metadata: &'a WordlistMetadata,
    words: &'a [String],
}

impl FinalWordlist {
    /// Takes the first `target_size` words of the accumulator (already sorted).
    pub fn from_state(state: &GenerationState, generated_at: DateTime<Utc>) -> Self {
        let words: Vec<String> = state
            .accumulated_words
            .iter()
            .take(state.target_size)
            .cloned()
            .collect();
        let metadata = WordlistMetadata {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION.to_string(),
            word_count: words.len(),
            generation_method: format!("heuristic_{}", state.profile),
            includes_foundation: !state.foundation_words.is_empty(),
            target_size: state.target_size,
            batch_size: state.batch_size,
            batches_processed: state.batches_processed,
            generated_at,
        };
        Self { words, metadata }
    }

    pub fn text_path(dir: &Path, target_size: usize) -> PathBuf {
        dir.join(format!("wordlist_{target_size}.txt"))
    }

    pub fn json_path(dir: &Path, target_size: usize) -> PathBuf {
        dir.join(format!("wordlist_{target_size}.json"))
    }

    /// Writes the plain list and the metadata JSON into `dir`, each atomically.
    pub fn write_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf), GenerationError> {
        let text_path = Self::text_path(dir, self.metadata.target_size);
        let json_path = Self::json_path(dir, self.metadata.target_size);

        write_atomic(&text_path, |writer| {
            for word in &self.words {
                writeln!(writer, "{word}")?;
            }
            Ok(())
        })
        .map_err(|e| GenerationError::Artifact(format!("{}: {e}", text_path.display())))?;

        let document = ArtifactJson {
            metadata: &self.metadata,
            words: &self.words,
        };
        write_atomic(&json_path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, &document)?;
            writer.write_all(b"\n")
        })
        .map_err(|e| GenerationError::Artifact(format!("{}: {e}", json_path.display())))?;

        Ok((text_path, json_path))
    }
}
