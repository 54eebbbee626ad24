use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::error::WordError;
use crate::rules::{PATTERNS, RuleSet};

const LENGTH_WEIGHT: f64 = 0.3;
const PHONETIC_WEIGHT: f64 = 0.5;
const PATTERN_WEIGHT: f64 = 0.2;

const DIFFICULT_PENALTY: f64 = 0.7;
const SILENT_PENALTY: f64 = 0.8;
const PATTERN_PENALTY: f64 = 0.9;
const GOOD_PATTERN_BONUS: f64 = 0.1;
const CATEGORY_BONUS: f64 = 1.2;

/// Score breakdown for a single word. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub word: String,
    pub length_score: f64,
    pub phonetic_score: f64,
    pub pattern_score: f64,
    pub total_score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    Poor,
    Acceptable,
    Good,
    VeryGood,
    Excellent,
}

impl Tier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Tier::Excellent
        } else if score >= 0.8 {
            Tier::VeryGood
        } else if score >= 0.7 {
            Tier::Good
        } else if score >= 0.6 {
            Tier::Acceptable
        } else {
            Tier::Poor
        }
    }

    pub const ALL: [Tier; 5] = [
        Tier::Excellent,
        Tier::VeryGood,
        Tier::Good,
        Tier::Acceptable,
        Tier::Poor,
    ];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Excellent => "excellent",
            Tier::VeryGood => "very good",
            Tier::Good => "good",
            Tier::Acceptable => "acceptable",
            Tier::Poor => "poor",
        };
        f.write_str(label)
    }
}

/// Scores words for readability and speakability.
///
/// Results are memoized per instance. The cache sits behind a mutex so one
/// scorer can be shared across the rayon workers validating a batch.
pub struct WordScorer {
    rules: Arc<RuleSet>,
    cache: Mutex<HashMap<String, Arc<Score>>>,
}

impl Default for WordScorer {
    fn default() -> Self {
        Self::new(RuleSet::standard())
    }
}

impl WordScorer {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn score(&self, word: &str) -> Result<Arc<Score>, WordError> {
        check_input(word)?;
        if let Some(cached) = self.lock_cache().get(word) {
            return Ok(Arc::clone(cached));
        }
        let score = Arc::new(compute_score(word));
        // Another worker may have raced us here; keep whichever landed first.
        let mut cache = self.lock_cache();
        let entry = cache.entry(word.to_string()).or_insert(score);
        Ok(Arc::clone(entry))
    }

    pub fn is_good_word(&self, word: &str, threshold: f64) -> Result<bool, WordError> {
        Ok(self.score(word)?.total_score >= threshold)
    }

    /// Total score with the semantic category bonus applied, capped at 1.0.
    pub fn rank_score(&self, word: &str) -> Result<f64, WordError> {
        let total = self.score(word)?.total_score;
        if self.rules.category_of(word).is_some() {
            Ok((total * CATEGORY_BONUS).min(1.0))
        } else {
            Ok(total)
        }
    }

    pub fn tier(&self, word: &str) -> Result<Tier, WordError> {
        self.rank_score(word).map(Tier::from_score)
    }

    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Score>>> {
        // A poisoned cache still holds valid, immutable scores.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn check_input(word: &str) -> Result<(), WordError> {
    if word.is_empty() {
        return Err(WordError::InvalidInput {
            word: word.to_string(),
            reason: "empty word",
        });
    }
    if !word.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(WordError::InvalidInput {
            word: word.to_string(),
            reason: "expected lowercase ascii letters",
        });
    }
    Ok(())
}

fn compute_score(word: &str) -> Score {
    let patterns = &*PATTERNS;
    let mut reasons = Vec::new();

    let length = word.len();
    let length_score = match length {
        4..=7 => 1.0,
        3 | 8 => 0.8,
        2..=10 => 0.5,
        _ => {
            reasons.push(format!("Length {length} is not ideal"));
            0.2
        }
    };

    let mut phonetic_score: f64 = 1.0;
    for pattern in &patterns.difficult {
        if pattern.regex.is_match(word) {
            phonetic_score *= DIFFICULT_PENALTY;
            reasons.push(format!("Contains difficult pattern: {}", pattern.label));
        }
    }
    let good_matches = patterns
        .good
        .iter()
        .filter(|pattern| pattern.regex.is_match(word))
        .count();
    if good_matches > 0 {
        phonetic_score =
            (phonetic_score * (1.0 + GOOD_PATTERN_BONUS * good_matches as f64)).min(1.0);
    }
    for pattern in &patterns.silent {
        if pattern.regex.is_match(word) {
            phonetic_score *= SILENT_PENALTY;
            reasons.push(format!("Contains {}", pattern.label));
        }
    }

    let mut pattern_score = 1.0;
    if has_double_letter(word) {
        pattern_score *= PATTERN_PENALTY;
        reasons.push("Contains double letters".to_string());
    }
    if let Some((a, b)) = patterns
        .confusable_endings
        .iter()
        .find(|(a, b)| word.ends_with(a) || word.ends_with(b))
    {
        pattern_score *= PATTERN_PENALTY;
        reasons.push(format!("Has confusable ending: {a}/{b}"));
    }

    let total_score = LENGTH_WEIGHT * length_score
        + PHONETIC_WEIGHT * phonetic_score
        + PATTERN_WEIGHT * pattern_score;

    Score {
        word: word.to_string(),
        length_score,
        phonetic_score,
        pattern_score,
        total_score,
        reasons,
    }
}

pub fn has_double_letter(word: &str) -> bool {
    word.as_bytes().windows(2).any(|pair| pair[0] == pair[1])
}

/// Vowel groups (counting `y`), less a trailing silent `e`; at least 1.
pub fn syllables(word: &str) -> usize {
    let mut groups = 0;
    let mut in_group = false;
    for c in word.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !in_group {
            groups += 1;
        }
        in_group = vowel;
    }
    if word.ends_with('e') && groups > 1 {
        groups -= 1;
    }
    groups.max(1)
}
