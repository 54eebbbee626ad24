use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Malformed input handed to the scorer or filter. Callers normalize words
/// before scoring; nothing here lowercases or trims on their behalf.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    #[error("invalid word {word:?}: {reason}")]
    InvalidInput { word: String, reason: &'static str },
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt checkpoint at {path}: {detail}")]
    Corrupt { path: PathBuf, detail: String },

    #[error("checkpoint schema version {found} is not supported (expected {expected})")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error("checkpoint failed validation: {0}")]
    Invalid(String),

    #[error("checkpoint was written with {field} = {checkpoint}, current run uses {current}")]
    Mismatch {
        field: &'static str,
        checkpoint: String,
        current: String,
    },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("ran out of candidates with {have} of {target} words")]
    InsufficientCandidates { have: usize, target: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write final wordlist: {0}")]
    Artifact(String),
}

impl GenerationError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenerationError::Io {
            path: path.into(),
            source,
        }
    }
}
