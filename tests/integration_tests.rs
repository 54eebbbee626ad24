// Integration tests for the wordlist-forge library
// These tests drive whole generation runs against temporary checkpoint files

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tempfile::tempdir;
use wordlist_forge::*;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn config(state_file: &Path, target: usize, batch: usize) -> GenerationConfig {
    let mut config = GenerationConfig::new(GenerationProfile::Standard, state_file);
    config.target_size = target;
    config.batch_size = batch;
    config
}

fn corpus() -> Vec<String> {
    words(&[
        "banana", "strength", "london", "lemon", "melon", "zxqv", "paper", "tiger", "aab",
        "garden", "window", "silver", "break", "brake", "rabbit", "button", "pencil", "table",
        "candle", "bottle",
    ])
}

fn expect_complete(outcome: RunOutcome) -> FinalWordlist {
    match outcome {
        RunOutcome::Complete(list) => list,
        RunOutcome::Paused { .. } => panic!("expected the run to complete"),
    }
}

#[test]
fn test_small_scenario() {
    // Foundation plus a five-word pool; "the" is below the minimum length,
    // "zxqv" has no vowels and "aab" has an unusual start
    let dir = tempdir().unwrap();
    let mut config = config(&dir.path().join("state.json"), 4, 2);
    config.filter.min_length = 4;
    let generator = BatchGenerator::new(config);

    let outcome = generator
        .generate(
            StartMode::Resume,
            &words(&["apple", "river"]),
            words(&["the", "zxqv", "happy", "aab", "mountain"]),
            &AtomicBool::new(false),
            None,
        )
        .unwrap();
    let list = expect_complete(outcome);
    assert_eq!(list.words, words(&["apple", "happy", "mountain", "river"]));
}

#[test]
fn test_exact_target_with_foundation_kept() {
    let dir = tempdir().unwrap();
    let generator = BatchGenerator::new(config(&dir.path().join("state.json"), 10, 3));
    let foundation = words(&["apple", "river"]);

    let list = expect_complete(
        generator
            .generate(StartMode::Resume, &foundation, corpus(), &AtomicBool::new(false), None)
            .unwrap(),
    );

    assert_eq!(list.words.len(), 10);
    let unique: BTreeSet<&String> = list.words.iter().collect();
    assert_eq!(unique.len(), 10);
    for word in &foundation {
        assert!(list.words.contains(word), "foundation word {word} missing");
    }
    let mut sorted = list.words.clone();
    sorted.sort();
    assert_eq!(sorted, list.words);
    for rejected in ["strength", "london", "zxqv", "aab"] {
        assert!(!list.words.iter().any(|w| w == rejected));
    }
    // Checkpoint is cleaned up once the artifact is on disk
    assert!(generator.store().exists());
    generator.complete(&list, &dir.path().join("out")).unwrap();
    assert!(!generator.store().exists());
}

#[test]
fn test_accepted_words_pass_the_filter() {
    let dir = tempdir().unwrap();
    let config = config(&dir.path().join("state.json"), 10, 4);
    let filter = WordFilter::new(config.filter.clone(), Arc::new(WordScorer::default()));
    let generator = BatchGenerator::new(config);
    let foundation = words(&["apple", "river"]);

    let list = expect_complete(
        generator
            .generate(StartMode::Resume, &foundation, corpus(), &AtomicBool::new(false), None)
            .unwrap(),
    );
    for word in list.words.iter().filter(|w| !foundation.contains(*w)) {
        assert_eq!(filter.validate(word), Verdict::Accept, "{word} should pass");
    }
}

#[test]
fn test_homophone_invariant() {
    let dir = tempdir().unwrap();
    let generator = BatchGenerator::new(config(&dir.path().join("state.json"), 10, 5));
    // Both spellings land in the first batch; the later repeats are deduplicated
    let mut pool = words(&["break", "brake"]);
    pool.extend(corpus());
    let list = expect_complete(
        generator
            .generate(
                StartMode::Resume,
                &words(&["apple", "river"]),
                pool,
                &AtomicBool::new(false),
                None,
            )
            .unwrap(),
    );
    let accepted: BTreeSet<String> = list.words.into_iter().collect();
    assert!(HomophoneGuard::default().conflicts(&accepted).is_empty());
    assert!(accepted.contains("break"));
    assert!(!accepted.contains("brake"));
}

#[test]
fn test_resume_matches_uninterrupted_run() {
    let foundation = words(&["apple", "river"]);

    let straight_dir = tempdir().unwrap();
    let straight = BatchGenerator::new(config(&straight_dir.path().join("state.json"), 12, 3));
    let expected = expect_complete(
        straight
            .generate(StartMode::Resume, &foundation, corpus(), &AtomicBool::new(false), None)
            .unwrap(),
    );

    let resumed_dir = tempdir().unwrap();
    let state_file = resumed_dir.path().join("state.json");
    let first = BatchGenerator::new(config(&state_file, 12, 3));
    let paused = first
        .generate(StartMode::Resume, &foundation, corpus(), &AtomicBool::new(false), Some(2))
        .unwrap();
    assert!(matches!(paused, RunOutcome::Paused { batches_processed: 2, .. }));
    assert!(state_file.exists());

    // A new process: nothing carried over but the checkpoint
    let second = BatchGenerator::new(config(&state_file, 12, 3));
    let resumed = expect_complete(
        second
            .generate(StartMode::Resume, &foundation, corpus(), &AtomicBool::new(false), None)
            .unwrap(),
    );

    assert_eq!(resumed.words, expected.words);
    assert_eq!(
        resumed.metadata.batches_processed,
        expected.metadata.batches_processed
    );
}

#[test]
fn test_accumulator_grows_monotonically() {
    let dir = tempdir().unwrap();
    let generator = BatchGenerator::new(config(&dir.path().join("state.json"), 12, 2));
    let mut state = generator
        .start(StartMode::Resume, &words(&["apple", "river"]), corpus())
        .unwrap();

    let mut previous = state.accumulated_words.clone();
    while !state.is_complete() && !state.remaining_candidates.is_empty() {
        generator.step(&mut state, false).unwrap();
        assert!(state.accumulated_words.is_superset(&previous));
        assert!(state.accumulated_words.len() <= 12);
        previous = state.accumulated_words.clone();

        // The checkpoint always mirrors the last completed batch
        let saved = generator.store().load().unwrap().unwrap();
        assert_eq!(saved.accumulated_words, state.accumulated_words);
        assert_eq!(saved.batches_processed, state.batches_processed);
    }
    assert!(state.is_complete());
}

#[test]
fn test_insufficient_candidates_keeps_checkpoint() {
    let dir = tempdir().unwrap();
    let generator = BatchGenerator::new(config(&dir.path().join("state.json"), 5, 2));
    let result = generator.generate(
        StartMode::Resume,
        &words(&["apple", "river"]),
        words(&["strength", "zxqv", "london", "banana"]),
        &AtomicBool::new(false),
        None,
    );
    assert!(matches!(
        result,
        Err(GenerationError::InsufficientCandidates { have: 3, target: 5 })
    ));
    assert!(generator.store().exists());
}

#[test]
fn test_relaxation_only_when_configured() {
    let foundation = words(&["apple", "river"]);
    let pool = words(&["banana", "strength"]);

    let dir = tempdir().unwrap();
    let strict = BatchGenerator::new(config(&dir.path().join("state.json"), 4, 2));
    let result = strict.generate(
        StartMode::Resume,
        &foundation,
        pool.clone(),
        &AtomicBool::new(false),
        None,
    );
    assert!(matches!(
        result,
        Err(GenerationError::InsufficientCandidates { have: 3, target: 4 })
    ));

    let dir = tempdir().unwrap();
    let mut relaxed_config = config(&dir.path().join("state.json"), 4, 2);
    relaxed_config.relaxed_threshold = Some(0.6);
    let relaxed = BatchGenerator::new(relaxed_config);
    let list = expect_complete(
        relaxed
            .generate(StartMode::Resume, &foundation, pool, &AtomicBool::new(false), None)
            .unwrap(),
    );
    assert_eq!(list.words, words(&["apple", "banana", "river", "strength"]));
}

#[test]
fn test_corrupt_checkpoint_then_fresh() {
    let dir = tempdir().unwrap();
    let state_file = dir.path().join("state.json");
    fs::write(&state_file, "not json at all").unwrap();
    let generator = BatchGenerator::new(config(&state_file, 10, 3));
    let foundation = words(&["apple", "river"]);

    let result = generator.generate(
        StartMode::Resume,
        &foundation,
        corpus(),
        &AtomicBool::new(false),
        None,
    );
    assert!(matches!(
        result,
        Err(GenerationError::Checkpoint(CheckpointError::Corrupt { .. }))
    ));
    // The corrupt file is left alone until the caller asks for a fresh start
    assert_eq!(fs::read_to_string(&state_file).unwrap(), "not json at all");

    let list = expect_complete(
        generator
            .generate(StartMode::Fresh, &foundation, corpus(), &AtomicBool::new(false), None)
            .unwrap(),
    );
    assert_eq!(list.words.len(), 10);
    assert!(dir.path().join("state.json.bak").exists());
}

#[test]
fn test_resume_rejects_changed_configuration() {
    let dir = tempdir().unwrap();
    let state_file = dir.path().join("state.json");
    let foundation = words(&["apple", "river"]);

    let first = BatchGenerator::new(config(&state_file, 10, 3));
    first
        .generate(StartMode::Resume, &foundation, corpus(), &AtomicBool::new(false), Some(1))
        .unwrap();

    let second = BatchGenerator::new(config(&state_file, 10, 4));
    let result = second.generate(
        StartMode::Resume,
        &foundation,
        corpus(),
        &AtomicBool::new(false),
        None,
    );
    assert!(matches!(
        result,
        Err(GenerationError::Checkpoint(CheckpointError::Mismatch {
            field: "batch_size",
            ..
        }))
    ));
}

#[test]
fn test_artifact_round_trip_through_analysis() {
    let dir = tempdir().unwrap();
    let generator = BatchGenerator::new(config(&dir.path().join("state.json"), 10, 3));
    let list = expect_complete(
        generator
            .generate(
                StartMode::Resume,
                &words(&["apple", "river"]),
                corpus(),
                &AtomicBool::new(false),
                None,
            )
            .unwrap(),
    );

    let out_dir = dir.path().join("out");
    let (text_path, json_path) = list.write_to(&out_dir).unwrap();
    assert_eq!(load_wordlist(&text_path).unwrap(), list.words);
    assert_eq!(load_wordlist(&json_path).unwrap(), list.words);

    let stats = WordlistStats::from_words(&list.words, &WordScorer::default());
    assert_eq!(stats.total, 10);
    assert_eq!(stats.unique, 10);
    assert_eq!(compare(&list.words, &list.words).common, 10);
}

#[test]
fn test_strength_scores_below_banana() {
    let scorer = WordScorer::default();
    let strength = scorer.score("strength").unwrap();
    let banana = scorer.score("banana").unwrap();
    assert!(strength.phonetic_score < banana.phonetic_score);
    assert!(strength.total_score < banana.total_score);
}

#[test]
fn test_loaders_feed_the_generator() {
    let dir = tempdir().unwrap();
    let foundation_path = dir.path().join("foundation.txt");
    let corpus_path = dir.path().join("corpus.txt");
    fs::write(&foundation_path, "Apple\nriver\n\n").unwrap();
    fs::write(&corpus_path, "banana\t900\nhappy\t800\nmountain\t700\n").unwrap();

    let foundation = load_foundation_from_file(&foundation_path).unwrap();
    let corpus = load_corpus_from_file(&corpus_path).unwrap();
    let generator = BatchGenerator::new(config(&dir.path().join("state.json"), 5, 2));
    let list = expect_complete(
        generator
            .generate(StartMode::Resume, &foundation, corpus, &AtomicBool::new(false), None)
            .unwrap(),
    );
    assert_eq!(list.words, words(&["apple", "banana", "happy", "mountain", "river"]));
}

#[test]
fn test_generate_command_keeps_checkpoint_when_output_is_unwritable() {
    let dir = tempdir().unwrap();
    let foundation_path = dir.path().join("foundation.txt");
    let corpus_path = dir.path().join("corpus.txt");
    let output_dir = dir.path().join("out");
    fs::write(&foundation_path, "apple\nriver\n").unwrap();
    fs::write(&corpus_path, "banana\nhappy\nmountain\n").unwrap();
    fs::write(&output_dir, "a regular file, not a directory").unwrap();

    let args = cli::GenerateArgs {
        foundation: foundation_path,
        corpus: corpus_path,
        output_dir: output_dir.clone(),
        state_file: Some(dir.path().join("state.json")),
        profile: GenerationProfile::Standard,
        batch_size: 2,
        target: 4,
        relax_threshold: None,
        fresh: false,
        max_batches: None,
        keep_checkpoint: false,
    };
    let stop = AtomicBool::new(false);

    assert!(cli::run_generate(&args, &stop).is_err());
    assert!(dir.path().join("state.json").exists());

    // Once the output location is usable the rerun finishes from the checkpoint
    fs::remove_file(&output_dir).unwrap();
    cli::run_generate(&args, &stop).unwrap();
    assert!(!dir.path().join("state.json").exists());
    assert_eq!(
        load_wordlist(&output_dir.join("wordlist_4.txt")).unwrap(),
        words(&["apple", "banana", "happy", "river"])
    );
}

#[test]
fn test_interrupt_flag_pauses_generate_command() {
    let dir = tempdir().unwrap();
    let foundation_path = dir.path().join("foundation.txt");
    let corpus_path = dir.path().join("corpus.txt");
    fs::write(&foundation_path, "apple\nriver\n").unwrap();
    fs::write(&corpus_path, "banana\nhappy\nmountain\n").unwrap();

    let args = cli::GenerateArgs {
        foundation: foundation_path,
        corpus: corpus_path,
        output_dir: dir.path().join("out"),
        state_file: Some(dir.path().join("state.json")),
        profile: GenerationProfile::Standard,
        batch_size: 1,
        target: 4,
        relax_threshold: None,
        fresh: false,
        max_batches: None,
        keep_checkpoint: false,
    };

    // An interrupt that lands before the first batch leaves a resumable checkpoint
    let interrupted = AtomicBool::new(true);
    cli::run_generate(&args, &interrupted).unwrap();
    assert!(dir.path().join("state.json").exists());
    assert!(!dir.path().join("out").exists());

    cli::run_generate(&args, &AtomicBool::new(false)).unwrap();
    assert!(dir.path().join("out").join("wordlist_4.txt").exists());
}
