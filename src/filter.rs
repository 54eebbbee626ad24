use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rules::{PATTERNS, Pattern, is_consonant, is_vowel};
use crate::scorer::{Score, WordScorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    TooShort,
    TooLong,
    NonAlphabetic,
    ProperNoun,
    Abbreviation,
    ForeignWord,
    ArchaicWord,
    TechnicalTerm,
    NoVowels,
    NoConsonants,
    ConsonantRun,
    VowelRun,
    TripleLetter,
    UnusualPattern,
    LowScore,
    HomophoneConflict,
    Duplicate,
}

impl RejectionReason {
    pub fn label(self) -> &'static str {
        match self {
            RejectionReason::TooShort => "too short",
            RejectionReason::TooLong => "too long",
            RejectionReason::NonAlphabetic => "non-alphabetic",
            RejectionReason::ProperNoun => "proper noun",
            RejectionReason::Abbreviation => "abbreviation",
            RejectionReason::ForeignWord => "foreign word",
            RejectionReason::ArchaicWord => "archaic word",
            RejectionReason::TechnicalTerm => "technical term",
            RejectionReason::NoVowels => "no vowels",
            RejectionReason::NoConsonants => "no consonants",
            RejectionReason::ConsonantRun => "too many consecutive consonants",
            RejectionReason::VowelRun => "too many consecutive vowels",
            RejectionReason::TripleLetter => "triple letter",
            RejectionReason::UnusualPattern => "unusual letter pattern",
            RejectionReason::LowScore => "low quality score",
            RejectionReason::HomophoneConflict => "homophone of an accepted word",
            RejectionReason::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectionReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            Verdict::Accept => None,
            Verdict::Reject(reason) => Some(*reason),
        }
    }
}

/// Knobs for the ordered filter checks. Profiles in `config` build these.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub reject_technical: bool,
    pub strict_patterns: bool,
    pub score_threshold: Option<f64>,
    pub triple_letter_exceptions: HashSet<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 12,
            reject_technical: true,
            strict_patterns: false,
            score_threshold: Some(0.7),
            triple_letter_exceptions: HashSet::new(),
        }
    }
}

/// Ordered, short-circuiting word checks; the first failure wins.
pub struct WordFilter {
    config: FilterConfig,
    scorer: Arc<WordScorer>,
}

impl WordFilter {
    pub fn new(config: FilterConfig, scorer: Arc<WordScorer>) -> Self {
        Self { config, scorer }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn scorer(&self) -> &WordScorer {
        &self.scorer
    }

    /// Same filter with a different score threshold, sharing the scorer cache.
    pub fn with_threshold(&self, threshold: Option<f64>) -> Self {
        let mut config = self.config.clone();
        config.score_threshold = threshold;
        Self::new(config, Arc::clone(&self.scorer))
    }

    pub fn validate(&self, word: &str) -> Verdict {
        self.validate_with_score(word).0
    }

    /// The verdict, plus the score when the threshold check computed one.
    pub fn validate_with_score(&self, word: &str) -> (Verdict, Option<Arc<Score>>) {
        if let Err(reason) = self.structural_check(word) {
            return (Verdict::Reject(reason), None);
        }
        let Some(threshold) = self.config.score_threshold else {
            return (Verdict::Accept, None);
        };
        // Structural checks guarantee lowercase ascii, so scoring cannot fail.
        match self.scorer.score(word) {
            Ok(score) if score.total_score < threshold => {
                (Verdict::Reject(RejectionReason::LowScore), Some(score))
            }
            Ok(score) => (Verdict::Accept, Some(score)),
            Err(_) => (Verdict::Reject(RejectionReason::NonAlphabetic), None),
        }
    }

    fn structural_check(&self, word: &str) -> Result<(), RejectionReason> {
        let rules = self.scorer.rules();
        let len = word.chars().count();
        if len < self.config.min_length {
            return Err(RejectionReason::TooShort);
        }
        if len > self.config.max_length {
            return Err(RejectionReason::TooLong);
        }
        if !word.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(RejectionReason::NonAlphabetic);
        }
        if rules.is_proper_noun(word) {
            return Err(RejectionReason::ProperNoun);
        }
        if rules.is_abbreviation(word) {
            return Err(RejectionReason::Abbreviation);
        }
        if rules.is_foreign(word) {
            return Err(RejectionReason::ForeignWord);
        }
        if rules.is_archaic(word) {
            return Err(RejectionReason::ArchaicWord);
        }
        if self.config.reject_technical && rules.is_technical(word) {
            return Err(RejectionReason::TechnicalTerm);
        }
        if !word.chars().any(is_vowel) {
            return Err(RejectionReason::NoVowels);
        }
        if !word.chars().any(is_consonant) {
            return Err(RejectionReason::NoConsonants);
        }
        if longest_run(word, is_consonant) >= 5 {
            return Err(RejectionReason::ConsonantRun);
        }
        if longest_run(word, is_vowel) >= 4 {
            return Err(RejectionReason::VowelRun);
        }
        if has_triple_letter(word) && !self.config.triple_letter_exceptions.contains(word) {
            return Err(RejectionReason::TripleLetter);
        }
        if self.has_unusual_pattern(word) {
            return Err(RejectionReason::UnusualPattern);
        }
        Ok(())
    }

    fn has_unusual_pattern(&self, word: &str) -> bool {
        let patterns = &*PATTERNS;
        if patterns.bad_starts.iter().any(|start| word.starts_with(start))
            || patterns.bad_ends.iter().any(|end| word.ends_with(end))
        {
            return true;
        }
        let strict: &[Pattern] = if self.config.strict_patterns {
            &patterns.unusual_strict
        } else {
            &[]
        };
        patterns
            .unusual
            .iter()
            .chain(strict)
            .any(|pattern| pattern.regex.is_match(word))
    }
}

fn longest_run(word: &str, class: fn(char) -> bool) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in word.chars() {
        if class(c) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn has_triple_letter(word: &str) -> bool {
    word.as_bytes()
        .windows(3)
        .any(|w| w[0] == w[1] && w[1] == w[2])
}

/// Cheap shape check used when loading candidates: lowercase ascii letters
/// only, length within bounds. Everything else is left to the full filter.
pub fn is_well_formed(word: &str, min_length: usize, max_length: usize) -> bool {
    (min_length..=max_length).contains(&word.len()) && word.chars().all(|c| c.is_ascii_lowercase())
}
