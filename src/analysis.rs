use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::rules::is_vowel;
use crate::scorer::{Tier, WordScorer, has_double_letter, syllables};

/// Read-only statistics over a finished wordlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordlistStats {
    pub total: usize,
    pub unique: usize,
    pub average_length: f64,
    pub length_distribution: BTreeMap<usize, usize>,
    pub starts_with_vowel: usize,
    pub ends_with_vowel: usize,
    pub contains_double: usize,
    pub tier_distribution: BTreeMap<Tier, usize>,
    pub syllable_distribution: BTreeMap<usize, usize>,
    pub most_common_letters: Vec<(char, usize)>,
    /// Words the scorer refused (not lowercase ascii); left out of the tiers.
    pub unscorable: usize,
}

impl WordlistStats {
    pub fn from_words(words: &[String], scorer: &WordScorer) -> Self {
        let mut stats = WordlistStats {
            total: words.len(),
            unique: words.iter().collect::<BTreeSet<_>>().len(),
            average_length: 0.0,
            length_distribution: BTreeMap::new(),
            starts_with_vowel: 0,
            ends_with_vowel: 0,
            contains_double: 0,
            tier_distribution: BTreeMap::new(),
            syllable_distribution: BTreeMap::new(),
            most_common_letters: Vec::new(),
            unscorable: 0,
        };
        if words.is_empty() {
            return stats;
        }

        let mut letters: HashMap<char, usize> = HashMap::new();
        let mut total_length = 0;
        for word in words {
            let len = word.chars().count();
            total_length += len;
            *stats.length_distribution.entry(len).or_insert(0) += 1;
            if word.chars().next().is_some_and(is_vowel) {
                stats.starts_with_vowel += 1;
            }
            if word.chars().last().is_some_and(is_vowel) {
                stats.ends_with_vowel += 1;
            }
            if has_double_letter(word) {
                stats.contains_double += 1;
            }
            *stats.syllable_distribution.entry(syllables(word)).or_insert(0) += 1;
            for c in word.chars() {
                *letters.entry(c).or_insert(0) += 1;
            }
            match scorer.tier(word) {
                Ok(tier) => *stats.tier_distribution.entry(tier).or_insert(0) += 1,
                Err(_) => stats.unscorable += 1,
            }
        }
        stats.average_length = total_length as f64 / words.len() as f64;

        let mut letters: Vec<(char, usize)> = letters.into_iter().collect();
        letters.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        letters.truncate(10);
        stats.most_common_letters = letters;
        stats
    }

    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub common: usize,
    pub only_in_first: usize,
    pub only_in_second: usize,
}

pub fn compare(first: &[String], second: &[String]) -> Overlap {
    let a: BTreeSet<&String> = first.iter().collect();
    let b: BTreeSet<&String> = second.iter().collect();
    Overlap {
        common: a.intersection(&b).count(),
        only_in_first: a.difference(&b).count(),
        only_in_second: b.difference(&a).count(),
    }
}

/// Words compared pairwise when measuring distinctiveness.
pub const DISTINCTIVENESS_SAMPLE: usize = 200;

const TOP_ROW: &str = "qwertyuiop";
const MIDDLE_ROW: &str = "asdfghjkl";
const BOTTOM_ROW: &str = "zxcvbnm";
const LEFT_HAND: &str = "qwertasdfgzxcvb";
const RIGHT_HAND: &str = "yuiophjklnm";

const COMMON_PREFIXES: [&str; 8] = ["un", "re", "in", "dis", "pre", "over", "under", "out"];
const COMMON_SUFFIXES: [&str; 8] = ["ing", "ed", "er", "est", "ly", "tion", "ment", "ness"];
const COMMON_BIGRAMS: [&str; 20] = [
    "th", "he", "in", "er", "an", "re", "ed", "on", "es", "st", "en", "at", "to", "nt", "ha",
    "nd", "ou", "ea", "ng", "as",
];

/// Share of words (in percent) following familiar English shapes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PatternProfile {
    pub cvc: f64,
    pub cvcv: f64,
    pub common_prefix: f64,
    pub common_suffix: f64,
    pub simple_plural: f64,
}

/// Share of words (in percent) that are comfortable on a QWERTY keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TypingProfile {
    pub single_row: f64,
    pub alternating_hands: f64,
    pub repeated_letters: f64,
    pub common_bigrams: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadabilityReport {
    /// Mean total score over the scorable words.
    pub average_score: f64,
    /// Percent of sampled pairs that are not confusable.
    pub distinctiveness: f64,
    pub patterns: PatternProfile,
    pub typing: TypingProfile,
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

/// Up to `size` words taken at even strides, so repeated runs agree.
pub fn stride_sample(words: &[String], size: usize) -> Vec<&String> {
    if words.len() <= size {
        return words.iter().collect();
    }
    (0..size).map(|k| &words[k * words.len() / size]).collect()
}

/// Near-equal length and at least 60% of `first`'s positions matching.
fn confusable(first: &str, second: &str) -> bool {
    let (a, b) = (first.chars().count(), second.chars().count());
    if a.abs_diff(b) > 1 {
        return false;
    }
    let same = first.chars().zip(second.chars()).filter(|(x, y)| x == y).count();
    same as f64 >= a as f64 * 0.6
}

/// 1.0 minus the fraction of confusable pairs within a stride sample.
pub fn phonetic_distinctiveness(words: &[String], sample_size: usize) -> f64 {
    let sample = stride_sample(words, sample_size);
    let total_pairs = sample.len() * sample.len().saturating_sub(1) / 2;
    if total_pairs == 0 {
        return 1.0;
    }
    let similar: usize = (0..sample.len())
        .into_par_iter()
        .map(|i| {
            sample[i + 1..]
                .iter()
                .filter(|other| confusable(sample[i], other))
                .count()
        })
        .sum();
    1.0 - similar as f64 / total_pairs as f64
}

pub fn common_patterns(words: &[String]) -> PatternProfile {
    let mut counts = [0usize; 5];
    for word in words {
        let letters: Vec<char> = word.chars().collect();
        let len = letters.len();
        if len == 3 && !is_vowel(letters[0]) && is_vowel(letters[1]) && !is_vowel(letters[2]) {
            counts[0] += 1;
        }
        if len == 4
            && letters
                .iter()
                .enumerate()
                .all(|(i, &c)| is_vowel(c) == (i % 2 == 1))
        {
            counts[1] += 1;
        }
        if COMMON_PREFIXES
            .iter()
            .any(|prefix| word.starts_with(prefix) && len > prefix.len() + 2)
        {
            counts[2] += 1;
        }
        if COMMON_SUFFIXES
            .iter()
            .any(|suffix| word.ends_with(suffix) && len > suffix.len() + 2)
        {
            counts[3] += 1;
        }
        if word.ends_with('s') && !word.ends_with("ss") {
            counts[4] += 1;
        }
    }
    let total = words.len();
    PatternProfile {
        cvc: share(counts[0], total),
        cvcv: share(counts[1], total),
        common_prefix: share(counts[2], total),
        common_suffix: share(counts[3], total),
        simple_plural: share(counts[4], total),
    }
}

fn same_hand(a: char, b: char) -> bool {
    (LEFT_HAND.contains(a) && LEFT_HAND.contains(b))
        || (RIGHT_HAND.contains(a) && RIGHT_HAND.contains(b))
}

pub fn typing_ease(words: &[String]) -> TypingProfile {
    let mut counts = [0usize; 4];
    for word in words {
        let word = word.to_lowercase();
        let letters: Vec<char> = word.chars().collect();
        if [TOP_ROW, MIDDLE_ROW, BOTTOM_ROW]
            .iter()
            .any(|row| letters.iter().all(|&c| row.contains(c)))
        {
            counts[0] += 1;
        }
        if letters.len() >= 3 && letters.windows(2).all(|pair| !same_hand(pair[0], pair[1])) {
            counts[1] += 1;
        }
        if letters.windows(2).any(|pair| pair[0] == pair[1]) {
            counts[2] += 1;
        }
        if COMMON_BIGRAMS.iter().any(|bigram| word.contains(bigram)) {
            counts[3] += 1;
        }
    }
    let total = words.len();
    TypingProfile {
        single_row: share(counts[0], total),
        alternating_hands: share(counts[1], total),
        repeated_letters: share(counts[2], total),
        common_bigrams: share(counts[3], total),
    }
}

pub fn evaluate_readability(
    words: &[String],
    scorer: &WordScorer,
    sample_size: usize,
) -> ReadabilityReport {
    let scores: Vec<f64> = words
        .iter()
        .filter_map(|word| scorer.score(word).ok())
        .map(|score| score.total_score)
        .collect();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    ReadabilityReport {
        average_score,
        distinctiveness: 100.0 * phonetic_distinctiveness(words, sample_size),
        patterns: common_patterns(words),
        typing: typing_ease(words),
    }
}

#[derive(Deserialize)]
struct WordlistDocument {
    #[serde(default)]
    words: Vec<String>,
}

/// Reads a `.json` artifact (its `words` array) or a plain newline list.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, GenerationError> {
    let data = fs::read_to_string(path).map_err(|e| GenerationError::io(path, e))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let document: WordlistDocument = serde_json::from_str(&data).map_err(|e| {
            GenerationError::Artifact(format!("{} is not a wordlist document: {e}", path.display()))
        })?;
        Ok(document.words)
    } else {
        Ok(data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
