use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::filter::FilterConfig;

pub const DEFAULT_TARGET_SIZE: usize = 65_536;
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Named filter presets. Each one is a configuration, not a separate code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProfile {
    Strict,
    #[default]
    Standard,
    Lenient,
}

impl GenerationProfile {
    pub fn name(self) -> &'static str {
        match self {
            GenerationProfile::Strict => "strict",
            GenerationProfile::Standard => "standard",
            GenerationProfile::Lenient => "lenient",
        }
    }

    pub fn filter_config(self) -> FilterConfig {
        match self {
            GenerationProfile::Strict => FilterConfig {
                min_length: 3,
                max_length: 10,
                reject_technical: true,
                strict_patterns: true,
                score_threshold: Some(0.80),
                ..FilterConfig::default()
            },
            GenerationProfile::Standard => FilterConfig {
                min_length: 3,
                max_length: 12,
                reject_technical: true,
                strict_patterns: false,
                score_threshold: Some(0.70),
                ..FilterConfig::default()
            },
            GenerationProfile::Lenient => FilterConfig {
                min_length: 3,
                max_length: 12,
                reject_technical: false,
                strict_patterns: false,
                score_threshold: Some(0.60),
                ..FilterConfig::default()
            },
        }
    }

    pub fn rank_within_batch(self) -> bool {
        matches!(self, GenerationProfile::Strict)
    }
}

impl fmt::Display for GenerationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a generation run needs besides its inputs.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub target_size: usize,
    pub batch_size: usize,
    pub profile: GenerationProfile,
    pub filter: FilterConfig,
    pub rank_within_batch: bool,
    pub relaxed_threshold: Option<f64>,
    pub keep_checkpoint: bool,
    pub state_file: PathBuf,
}

impl GenerationConfig {
    pub fn new(profile: GenerationProfile, state_file: impl Into<PathBuf>) -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            profile,
            filter: profile.filter_config(),
            rank_within_batch: profile.rank_within_batch(),
            relaxed_threshold: None,
            keep_checkpoint: false,
            state_file: state_file.into(),
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.target_size == 0 {
            return Err(GenerationError::Config("target size must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(GenerationError::Config("batch size must be positive".into()));
        }
        if self.filter.min_length > self.filter.max_length {
            return Err(GenerationError::Config(format!(
                "minimum length {} exceeds maximum length {}",
                self.filter.min_length, self.filter.max_length
            )));
        }
        if let Some(relaxed) = self.relaxed_threshold {
            if !(0.0..=1.0).contains(&relaxed) {
                return Err(GenerationError::Config(format!(
                    "relaxed threshold {relaxed} is outside 0.0..=1.0"
                )));
            }
            if let Some(threshold) = self.filter.score_threshold
                && relaxed >= threshold
            {
                return Err(GenerationError::Config(format!(
                    "relaxed threshold {relaxed} must be below the profile threshold {threshold}"
                )));
            }
        }
        Ok(())
    }
}

/// `<data dir>/wordlist-forge`, used for the checkpoint when no state file is
/// given on the command line.
pub fn default_state_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("wordlist-forge"))
}
