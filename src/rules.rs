use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;

const PROPER_NOUNS: &str = include_str!("resources/proper_nouns.txt");
const ABBREVIATIONS: &str = include_str!("resources/abbreviations.txt");
const FOREIGN_WORDS: &str = include_str!("resources/foreign_words.txt");
const ARCHAIC_WORDS: &str = include_str!("resources/archaic_words.txt");
const TECHNICAL_TERMS: &str = include_str!("resources/technical_terms.txt");
const HOMOPHONES: &str = include_str!("resources/homophones.txt");
const CATEGORIES: &str = include_str!("resources/categories.txt");

pub const VOWELS: &str = "aeiou";
pub const CONSONANTS: &str = "bcdfghjklmnpqrstvwxyz";

pub fn is_vowel(c: char) -> bool {
    VOWELS.contains(c)
}

pub fn is_consonant(c: char) -> bool {
    CONSONANTS.contains(c)
}

/// A compiled regex paired with the label used in score reasons.
pub struct Pattern {
    pub regex: Regex,
    pub label: &'static str,
}

/// The regex tables shared by the scorer and the filter.
pub struct PatternTables {
    pub difficult: Vec<Pattern>,
    pub good: Vec<Pattern>,
    pub silent: Vec<Pattern>,
    pub unusual: Vec<Pattern>,
    pub unusual_strict: Vec<Pattern>,
    pub confusable_endings: [(&'static str, &'static str); 4],
    pub bad_starts: [&'static str; 14],
    pub bad_ends: [&'static str; 8],
}

pub static PATTERNS: LazyLock<PatternTables> = LazyLock::new(|| PatternTables {
    // `regex` has no lookahead, so "q not followed by u" is spelled out.
    difficult: compile(&[
        ("[xz]{2,}", "xz cluster"),
        ("[bcdfghjklmnpqrstvwxyz]{4,}", "consonant cluster"),
        ("^[bcdfghjklmnpqrstvwxyz]{3,}", "consonant start"),
        ("[bcdfghjklmnpqrstvwxyz]{3,}$", "consonant end"),
        ("q([^u]|$)", "q without u"),
        ("[aeiou]{4,}", "vowel cluster"),
    ]),
    good: compile(&[
        ("^[bcdfghjklmnpqrstvwxyz][aeiou]", "consonant-vowel start"),
        ("[aeiou][bcdfghjklmnpqrstvwxyz]$", "vowel-consonant end"),
        ("[aeiou][bcdfghjklmnpqrstvwxyz][aeiou]", "vowel-consonant-vowel"),
    ]),
    silent: compile(&[
        ("mb$", "silent b"),
        ("^kn", "silent k"),
        ("^wr", "silent w"),
        ("^ps", "silent p"),
        ("^gn", "silent g"),
    ]),
    unusual: compile(&[
        ("^[aeiou]{2,}[bcdfghjklmnpqrstvwxyz]$", "vowels then one consonant"),
        ("^[xz][^aeiou]", "x or z before a consonant"),
    ]),
    unusual_strict: compile(&[
        ("^[bcdfghjklmnpqrstvwxyz][aeiou]{2,}$", "consonant then vowels"),
        ("^[aeiou][bcdfghjklmnpqrstvwxyz]{2,}$", "vowel then consonants"),
    ]),
    confusable_endings: [
        ("tion", "sion"),
        ("able", "ible"),
        ("ant", "ent"),
        ("ance", "ence"),
    ],
    bad_starts: [
        "aa", "ii", "uu", "yy", "qq", "xx", "zz", "xz", "qx", "zx", "kk", "jj", "vv", "ww",
    ],
    bad_ends: ["qx", "xz", "zx", "qq", "kk", "jj", "vv", "ww"],
});

fn compile(table: &[(&str, &'static str)]) -> Vec<Pattern> {
    table
        .iter()
        .map(|&(source, label)| Pattern {
            regex: Regex::new(source).expect("pattern table entries are valid regexes"),
            label,
        })
        .collect()
}

/// Word-level lookup data: rejection sets, semantic categories and homophone
/// groups. The default set is parsed once from the embedded resources.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    proper_nouns: HashSet<String>,
    abbreviations: HashSet<String>,
    foreign_words: HashSet<String>,
    archaic_words: HashSet<String>,
    technical_terms: HashSet<String>,
    categories: BTreeMap<String, HashSet<String>>,
    homophone_groups: Vec<Vec<String>>,
    homophone_index: HashMap<String, BTreeSet<String>>,
}

static DEFAULT_RULES: LazyLock<Arc<RuleSet>> = LazyLock::new(|| {
    let rules = RuleSet::empty()
        .with_proper_nouns(parse_word_list(PROPER_NOUNS))
        .with_abbreviations(parse_word_list(ABBREVIATIONS))
        .with_foreign_words(parse_word_list(FOREIGN_WORDS))
        .with_archaic_words(parse_word_list(ARCHAIC_WORDS))
        .with_technical_terms(parse_word_list(TECHNICAL_TERMS))
        .with_homophone_groups(parse_groups(HOMOPHONES))
        .with_categories(parse_categories(CATEGORIES));
    Arc::new(rules)
});

impl RuleSet {
    /// The built-in rule set, shared.
    pub fn standard() -> Arc<RuleSet> {
        Arc::clone(&DEFAULT_RULES)
    }

    /// A rule set with no entries, for building custom rules in tests.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_proper_nouns<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proper_nouns.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn with_abbreviations<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.abbreviations.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn with_foreign_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foreign_words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn with_archaic_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.archaic_words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn with_technical_terms<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.technical_terms.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn with_category<I, S>(mut self, name: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .entry(name.to_string())
            .or_default()
            .extend(words.into_iter().map(Into::into));
        self
    }

    fn with_categories(self, categories: Vec<(String, Vec<String>)>) -> Self {
        categories
            .into_iter()
            .fold(self, |rules, (name, words)| rules.with_category(&name, words))
    }

    /// Adds a homophone group. A word listed in several groups conflicts with
    /// the members of all of them.
    pub fn with_homophone_group<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group: Vec<String> = words.into_iter().map(Into::into).collect();
        if group.len() < 2 {
            return self;
        }
        for word in &group {
            let others = self.homophone_index.entry(word.clone()).or_default();
            others.extend(group.iter().filter(|other| *other != word).cloned());
        }
        self.homophone_groups.push(group);
        self
    }

    fn with_homophone_groups(self, groups: Vec<Vec<String>>) -> Self {
        groups
            .into_iter()
            .fold(self, |rules, group| rules.with_homophone_group(group))
    }

    pub fn is_proper_noun(&self, word: &str) -> bool {
        self.proper_nouns.contains(word)
    }

    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.abbreviations.contains(word)
    }

    pub fn is_foreign(&self, word: &str) -> bool {
        self.foreign_words.contains(word)
    }

    pub fn is_archaic(&self, word: &str) -> bool {
        self.archaic_words.contains(word)
    }

    pub fn is_technical(&self, word: &str) -> bool {
        self.technical_terms.contains(word)
    }

    /// Name of the first category (alphabetically) containing `word`.
    pub fn category_of(&self, word: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, words)| words.contains(word))
            .map(|(name, _)| name.as_str())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Every other member of each homophone group `word` belongs to, sorted.
    pub fn homophones_of<'a>(&'a self, word: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.homophone_index
            .get(word)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn homophone_group_count(&self) -> usize {
        self.homophone_groups.len()
    }
}

fn data_lines(data: &str) -> impl Iterator<Item = &str> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// One lowercase word per line; blank lines and `#` comments are skipped.
pub fn parse_word_list(data: &str) -> Vec<String> {
    data_lines(data).map(str::to_lowercase).collect()
}

fn parse_groups(data: &str) -> Vec<Vec<String>> {
    data_lines(data)
        .map(|line| line.split_whitespace().map(str::to_lowercase).collect())
        .collect()
}

fn parse_categories(data: &str) -> Vec<(String, Vec<String>)> {
    data_lines(data)
        .filter_map(|line| {
            let (name, words) = line.split_once(':')?;
            let words = words.split_whitespace().map(str::to_lowercase).collect();
            Some((name.trim().to_string(), words))
        })
        .collect()
}
