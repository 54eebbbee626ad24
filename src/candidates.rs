use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::GenerationError;
use crate::filter::is_well_formed;

/// Trimmed, lowercased foundation word, or `None` for a blank line.
fn normalize_foundation_line(line: &str) -> Option<String> {
    let word = line.trim();
    (!word.is_empty()).then(|| word.to_lowercase())
}

/// Corpus lines may carry a trailing frequency column (`word<TAB>count` or
/// `word count`); only the word is kept.
fn normalize_corpus_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut fields = line.split_whitespace();
    let word = match (fields.next(), fields.next(), fields.next()) {
        (Some(word), Some(count), None) if count.parse::<f64>().is_ok() => word,
        _ => line,
    };
    Some(word.to_lowercase())
}

fn dedup_in_order(words: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, GenerationError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| GenerationError::io(path, e))?;
    let reader = BufReader::new(file);
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line.map_err(|e| GenerationError::io(path, e))?);
    }
    Ok(lines)
}

pub fn load_foundation_from_str(data: &str) -> Vec<String> {
    dedup_in_order(data.lines().filter_map(normalize_foundation_line))
}

pub fn load_foundation_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, GenerationError> {
    let lines = read_lines(path)?;
    Ok(dedup_in_order(
        lines.iter().filter_map(|line| normalize_foundation_line(line)),
    ))
}

pub fn load_corpus_from_str(data: &str) -> Vec<String> {
    dedup_in_order(data.lines().filter_map(normalize_corpus_line))
}

pub fn load_corpus_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, GenerationError> {
    let lines = read_lines(path)?;
    Ok(dedup_in_order(
        lines.iter().filter_map(|line| normalize_corpus_line(line)),
    ))
}

/// Builds the ordered candidate pool: corpus order is kept, duplicates and
/// already-accepted words are dropped, as are words that fail the shape check.
pub struct CandidateSource {
    min_length: usize,
    max_length: usize,
}

impl CandidateSource {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
        }
    }

    pub fn pool<I>(&self, corpus: I, exclude: &BTreeSet<String>) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        corpus
            .into_iter()
            .map(|word| word.trim().to_lowercase())
            .filter(|word| is_well_formed(word, self.min_length, self.max_length))
            .filter(|word| !exclude.contains(word))
            .filter(|word| seen.insert(word.clone()))
            .collect()
    }
}
