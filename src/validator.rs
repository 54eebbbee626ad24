use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::filter::{RejectionReason, Verdict, WordFilter};

/// Outcome of validating one batch. `accepted` is in merge order: input
/// order, or descending rank when the validator ranks within a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<(String, RejectionReason)>,
}

impl BatchReport {
    pub fn reason_counts(&self) -> BTreeMap<RejectionReason, usize> {
        let mut counts = BTreeMap::new();
        for (_, reason) in &self.rejected {
            *counts.entry(*reason).or_insert(0) += 1;
        }
        counts
    }

    /// Words rejected for their score alone, in input order.
    pub fn low_scoring(&self) -> impl Iterator<Item = &str> {
        self.rejected
            .iter()
            .filter(|(_, reason)| *reason == RejectionReason::LowScore)
            .map(|(word, _)| word.as_str())
    }
}

/// Decides which words of a batch are acceptable. The generator only sees
/// this seam, so an external reviewer can stand in for the heuristics.
pub trait BatchValidator: Send + Sync {
    fn validate_batch(&self, words: &[String]) -> BatchReport;
}

/// The default validator: filter plus scorer, evaluated in parallel.
pub struct HeuristicValidator {
    filter: WordFilter,
    rank_within_batch: bool,
}

impl HeuristicValidator {
    pub fn new(filter: WordFilter, rank_within_batch: bool) -> Self {
        Self {
            filter,
            rank_within_batch,
        }
    }

    pub fn filter(&self) -> &WordFilter {
        &self.filter
    }

    /// Same validator judged against a different score threshold.
    pub fn with_threshold(&self, threshold: f64) -> Self {
        Self::new(self.filter.with_threshold(Some(threshold)), self.rank_within_batch)
    }

    fn judge(&self, word: &str) -> (Verdict, f64) {
        let (verdict, _) = self.filter.validate_with_score(word);
        let rank = if self.rank_within_batch && verdict.is_accept() {
            self.filter.scorer().rank_score(word).unwrap_or(0.0)
        } else {
            0.0
        };
        (verdict, rank)
    }
}

impl BatchValidator for HeuristicValidator {
    fn validate_batch(&self, words: &[String]) -> BatchReport {
        // par_iter keeps input order on collect
        let judged: Vec<(Verdict, f64)> = words.par_iter().map(|word| self.judge(word)).collect();

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for (word, (verdict, rank)) in words.iter().zip(judged) {
            match verdict {
                Verdict::Accept => accepted.push((word.clone(), rank)),
                Verdict::Reject(reason) => rejected.push((word.clone(), reason)),
            }
        }
        if self.rank_within_batch {
            accepted.sort_by(|a, b| b.1.total_cmp(&a.1));
        }

        BatchReport {
            accepted: accepted.into_iter().map(|(word, _)| word).collect(),
            rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterConfig;
    use crate::scorer::WordScorer;
    use std::sync::Arc;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn validator(rank: bool) -> HeuristicValidator {
        let filter = WordFilter::new(FilterConfig::default(), Arc::new(WordScorer::default()));
        HeuristicValidator::new(filter, rank)
    }

    #[test]
    fn test_batch_preserves_input_order() {
        let report = validator(false).validate_batch(&words(&[
            "mountain", "zxqv", "knight", "banana", "london", "happy",
        ]));
        assert_eq!(report.accepted, words(&["mountain", "knight", "banana", "happy"]));
        assert_eq!(
            report.rejected,
            vec![
                ("zxqv".to_string(), RejectionReason::NoVowels),
                ("london".to_string(), RejectionReason::ProperNoun),
            ]
        );
    }

    #[test]
    fn test_rank_within_batch_is_stable() {
        // Category bonus caps mountain, cat and banana at 1.0, so they keep
        // input order ahead of the uncategorised knight (0.78)
        let report = validator(true).validate_batch(&words(&["knight", "mountain", "cat", "banana"]));
        assert_eq!(report.accepted, words(&["mountain", "cat", "banana", "knight"]));
    }

    #[test]
    fn test_reason_counts_and_low_scoring() {
        let report = validator(false).validate_batch(&words(&["strength", "aab", "zxqv", "bzzt"]));
        let counts = report.reason_counts();
        assert_eq!(counts.get(&RejectionReason::LowScore), Some(&1));
        assert_eq!(counts.get(&RejectionReason::NoVowels), Some(&2));
        assert_eq!(report.low_scoring().collect::<Vec<_>>(), vec!["strength"]);
    }

    #[test]
    fn test_empty_batch() {
        let report = validator(false).validate_batch(&[]);
        assert!(report.accepted.is_empty());
        assert!(report.rejected.is_empty());
    }
}
