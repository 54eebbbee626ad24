use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::{Args, Parser, Subcommand};
use log::info;

use crate::analysis::{
    DISTINCTIVENESS_SAMPLE, ReadabilityReport, WordlistStats, compare, evaluate_readability,
    load_wordlist,
};
use crate::candidates::{load_corpus_from_file, load_foundation_from_file};
use crate::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_TARGET_SIZE, GenerationConfig, GenerationProfile, default_state_dir,
};
use crate::error::GenerationError;
use crate::filter::{Verdict, WordFilter};
use crate::generator::{BatchGenerator, RunOutcome, StartMode};
use crate::scorer::{Score, Tier, WordScorer};

const STATE_FILE_NAME: &str = "generation_state.json";

/// Mnemonic wordlist generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build (or resume building) a wordlist from a foundation list and a corpus
    Generate(GenerateArgs),
    /// Show the score breakdown for words
    Score {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Run words through the filter
    Check {
        #[arg(long, value_enum, default_value_t = GenerationProfile::Standard)]
        profile: GenerationProfile,
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Print statistics for a finished wordlist
    Analyze { file: PathBuf },
    /// Compare two or more wordlists
    Compare {
        #[arg(num_args = 2.., required = true)]
        files: Vec<PathBuf>,
    },
    /// Rate the readability of one or more wordlists
    Evaluate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Words compared pairwise for distinctiveness
        #[arg(long, default_value_t = DISTINCTIVENESS_SAMPLE)]
        sample: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Newline-delimited foundation wordlist, always included
    #[arg(long)]
    pub foundation: PathBuf,

    /// Frequency-ranked candidate corpus, most frequent first
    #[arg(long)]
    pub corpus: PathBuf,

    /// Directory for the finished wordlist files
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Checkpoint file (defaults to the user data directory)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = GenerationProfile::Standard)]
    pub profile: GenerationProfile,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_TARGET_SIZE)]
    pub target: usize,

    /// Re-examine low-scoring words at this threshold once the corpus runs out
    #[arg(long)]
    pub relax_threshold: Option<f64>,

    /// Ignore any checkpoint (it is moved aside to <name>.bak)
    #[arg(long)]
    pub fresh: bool,

    /// Stop after this many batches; rerun to resume
    #[arg(long)]
    pub max_batches: Option<usize>,

    /// Keep the checkpoint after a successful run
    #[arg(long)]
    pub keep_checkpoint: bool,
}

impl GenerateArgs {
    pub fn state_file(&self) -> PathBuf {
        if let Some(path) = &self.state_file {
            return path.clone();
        }
        default_state_dir()
            .unwrap_or_else(|| self.output_dir.clone())
            .join(STATE_FILE_NAME)
    }

    pub fn to_config(&self) -> GenerationConfig {
        let mut config = GenerationConfig::new(self.profile, self.state_file());
        config.target_size = self.target;
        config.batch_size = self.batch_size;
        config.relaxed_threshold = self.relax_threshold;
        config.keep_checkpoint = self.keep_checkpoint;
        config
    }

    pub fn start_mode(&self) -> StartMode {
        if self.fresh {
            StartMode::Fresh
        } else {
            StartMode::Resume
        }
    }
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Exit status for a failed command: 2 when the corpus ran dry, 1 otherwise.
pub fn exit_code(error: &GenerationError) -> u8 {
    match error {
        GenerationError::InsufficientCandidates { .. } => 2,
        _ => 1,
    }
}

pub fn run_command(command: &Command, stop: &AtomicBool) -> Result<(), GenerationError> {
    match command {
        Command::Generate(args) => run_generate(args, stop),
        Command::Score { words } => {
            run_score(words);
            Ok(())
        }
        Command::Check { profile, words } => {
            run_check(*profile, words);
            Ok(())
        }
        Command::Analyze { file } => run_analyze(file),
        Command::Compare { files } => run_compare(files),
        Command::Evaluate { files, sample } => run_evaluate(files, *sample),
    }
}

pub fn run_generate(args: &GenerateArgs, stop: &AtomicBool) -> Result<(), GenerationError> {
    let foundation = load_foundation_from_file(&args.foundation)?;
    let corpus = load_corpus_from_file(&args.corpus)?;
    info!(
        "Loaded {} foundation words and {} corpus entries",
        foundation.len(),
        corpus.len()
    );

    let generator = BatchGenerator::new(args.to_config());
    match generator.generate(args.start_mode(), &foundation, corpus, stop, args.max_batches)? {
        RunOutcome::Complete(wordlist) => {
            let (text_path, json_path) = generator.complete(&wordlist, &args.output_dir)?;
            display_complete(wordlist.words.len(), &text_path, &json_path);
        }
        RunOutcome::Paused {
            batches_processed,
            accumulated,
            target_size,
        } => display_paused(batches_processed, accumulated, target_size, generator.store().path()),
    }
    Ok(())
}

fn normalize_arg(word: &str) -> String {
    word.trim().to_lowercase()
}

pub fn run_score(words: &[String]) {
    let scorer = WordScorer::default();
    for word in words.iter().map(|w| normalize_arg(w)) {
        match (scorer.score(&word), scorer.tier(&word)) {
            (Ok(score), Ok(tier)) => display_score(&score, tier),
            (Err(e), _) | (_, Err(e)) => println!("{word}: {e}"),
        }
    }
}

pub fn run_check(profile: GenerationProfile, words: &[String]) {
    let filter = WordFilter::new(profile.filter_config(), Arc::new(WordScorer::default()));
    for word in words.iter().map(|w| normalize_arg(w)) {
        display_verdict(&word, filter.validate(&word));
    }
}

pub fn run_analyze(file: &Path) -> Result<(), GenerationError> {
    let words = load_wordlist(file)?;
    let stats = WordlistStats::from_words(&words, &WordScorer::default());
    display_stats(&file.display().to_string(), &stats);
    Ok(())
}

pub fn run_compare(files: &[PathBuf]) -> Result<(), GenerationError> {
    let scorer = WordScorer::default();
    let mut lists = Vec::new();
    for file in files {
        let words = load_wordlist(file)?;
        let name = file_label(file);
        let stats = WordlistStats::from_words(&words, &scorer);
        lists.push((name, words, stats));
    }

    println!("{:<30} {:>10} {:>10} {:>12}", "Wordlist", "Words", "Unique", "Avg Length");
    println!("{}", "-".repeat(65));
    for (name, _, stats) in &lists {
        println!(
            "{:<30} {:>10} {:>10} {:>12.2}",
            name, stats.total, stats.unique, stats.average_length
        );
    }

    for (i, (first_name, first, _)) in lists.iter().enumerate() {
        for (second_name, second, _) in &lists[i + 1..] {
            let overlap = compare(first, second);
            println!("\n{first_name} vs {second_name}:");
            println!("  Common words: {}", overlap.common);
            println!("  Only in {first_name}: {}", overlap.only_in_first);
            println!("  Only in {second_name}: {}", overlap.only_in_second);
        }
    }
    Ok(())
}

pub fn run_evaluate(files: &[PathBuf], sample: usize) -> Result<(), GenerationError> {
    let scorer = WordScorer::default();
    let mut reports = Vec::new();
    for file in files {
        let words = load_wordlist(file)?;
        info!("Evaluating {} ({} words)", file.display(), words.len());
        reports.push((file_label(file), evaluate_readability(&words, &scorer, sample)));
    }
    display_readability(&reports);
    Ok(())
}

fn file_label(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

pub fn display_readability(reports: &[(String, ReadabilityReport)]) {
    println!("{:<30} {:>10} {:>12}", "Wordlist", "Avg Score", "Distinct %");
    println!("{}", "-".repeat(54));
    for (name, report) in reports {
        println!(
            "{:<30} {:>10.3} {:>12.1}",
            name, report.average_score, report.distinctiveness
        );
    }

    print_header("Pattern (% words)", reports);
    print_row("CVC", reports, |r| r.patterns.cvc);
    print_row("CVCV", reports, |r| r.patterns.cvcv);
    print_row("Common prefix", reports, |r| r.patterns.common_prefix);
    print_row("Common suffix", reports, |r| r.patterns.common_suffix);
    print_row("Simple plural", reports, |r| r.patterns.simple_plural);

    print_header("Typing (% words)", reports);
    print_row("Single row", reports, |r| r.typing.single_row);
    print_row("Alternating hands", reports, |r| r.typing.alternating_hands);
    print_row("Repeated letters", reports, |r| r.typing.repeated_letters);
    print_row("Common bigrams", reports, |r| r.typing.common_bigrams);
}

fn print_header(title: &str, reports: &[(String, ReadabilityReport)]) {
    print!("\n{title:<20}");
    for (name, _) in reports {
        print!("{name:>15.15}");
    }
    println!();
    println!("{}", "-".repeat(20 + 15 * reports.len()));
}

fn print_row<F>(label: &str, reports: &[(String, ReadabilityReport)], value: F)
where
    F: Fn(&ReadabilityReport) -> f64,
{
    print!("{label:<20}");
    for (_, report) in reports {
        print!("{:>14.1}%", value(report));
    }
    println!();
}

pub fn display_score(score: &Score, tier: Tier) {
    println!(
        "{}: {:.3} ({tier}) [length {:.2}, phonetic {:.3}, pattern {:.2}]",
        score.word, score.total_score, score.length_score, score.phonetic_score, score.pattern_score
    );
    for reason in &score.reasons {
        println!("  - {reason}");
    }
}

pub fn display_verdict(word: &str, verdict: Verdict) {
    match verdict {
        Verdict::Accept => println!("{word}: accepted"),
        Verdict::Reject(reason) => println!("{word}: rejected ({reason})"),
    }
}

pub fn display_stats(name: &str, stats: &WordlistStats) {
    println!("{name}");
    println!("  Words: {} ({} unique)", stats.total, stats.unique);
    println!("  Average length: {:.2}", stats.average_length);
    println!("  Length distribution:");
    for (length, count) in &stats.length_distribution {
        println!("    {length:>2}: {count}");
    }
    println!(
        "  Starts with vowel: {} ({:.1}%)",
        stats.starts_with_vowel,
        stats.percent(stats.starts_with_vowel)
    );
    println!(
        "  Ends with vowel: {} ({:.1}%)",
        stats.ends_with_vowel,
        stats.percent(stats.ends_with_vowel)
    );
    println!(
        "  Double letters: {} ({:.1}%)",
        stats.contains_double,
        stats.percent(stats.contains_double)
    );
    println!("  Quality tiers:");
    for tier in Tier::ALL {
        let count = stats.tier_distribution.get(&tier).copied().unwrap_or(0);
        println!("    {:<11} {count} ({:.1}%)", tier.to_string(), stats.percent(count));
    }
    println!("  Syllables:");
    for (syllables, count) in &stats.syllable_distribution {
        println!("    {syllables}: {count}");
    }
    let letters: Vec<String> = stats
        .most_common_letters
        .iter()
        .map(|(letter, count)| format!("{letter}={count}"))
        .collect();
    println!("  Most common letters: {}", letters.join(" "));
    if stats.unscorable > 0 {
        println!("  Unscorable words: {}", stats.unscorable);
    }
}

pub fn display_complete(word_count: usize, text_path: &Path, json_path: &Path) {
    println!("Generated {word_count} words.");
    println!("  {}", text_path.display());
    println!("  {}", json_path.display());
}

pub fn display_paused(batches: usize, accumulated: usize, target: usize, state_file: &Path) {
    println!(
        "Paused after {batches} batches with {accumulated}/{target} words. Progress saved to {}; rerun to resume.",
        state_file.display()
    );
}
