use std::collections::BTreeSet;
use std::sync::Arc;

use crate::filter::RejectionReason;
use crate::rules::RuleSet;

/// Insertion-time guard: a word may not join a set that already holds it or
/// one of its homophones. Only the generator's merge step calls this.
#[derive(Clone)]
pub struct HomophoneGuard {
    rules: Arc<RuleSet>,
}

impl HomophoneGuard {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn admissible(&self, word: &str, existing: &BTreeSet<String>) -> bool {
        !self
            .rules
            .homophones_of(word)
            .any(|other| existing.contains(other))
    }

    pub fn check(&self, word: &str, existing: &BTreeSet<String>) -> Result<(), RejectionReason> {
        if existing.contains(word) {
            Err(RejectionReason::Duplicate)
        } else if !self.admissible(word, existing) {
            Err(RejectionReason::HomophoneConflict)
        } else {
            Ok(())
        }
    }

    /// Pairs of homophones that are both present in `words`.
    pub fn conflicts<'a>(&'a self, words: &'a BTreeSet<String>) -> Vec<(&'a str, &'a str)> {
        words
            .iter()
            .flat_map(|word| {
                self.rules
                    .homophones_of(word)
                    .filter(move |other| word.as_str() < *other && words.contains(*other))
                    .map(move |other| (word.as_str(), other))
            })
            .collect()
    }
}

impl Default for HomophoneGuard {
    fn default() -> Self {
        Self::new(RuleSet::standard())
    }
}
