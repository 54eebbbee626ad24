use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use log::{debug, info, warn};

use crate::artifact::FinalWordlist;
use crate::candidates::CandidateSource;
use crate::checkpoint::{CheckpointStore, GenerationState};
use crate::config::GenerationConfig;
use crate::debug_log;
use crate::error::GenerationError;
use crate::filter::{RejectionReason, WordFilter};
use crate::homophones::HomophoneGuard;
use crate::rules::RuleSet;
use crate::scorer::WordScorer;
use crate::validator::{BatchValidator, HeuristicValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Continue from the checkpoint if one exists, else start fresh.
    Resume,
    /// Move any checkpoint aside and start over.
    Fresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub batch_number: usize,
    pub examined: usize,
    pub merged: usize,
    pub rejected_by_reason: BTreeMap<RejectionReason, usize>,
    pub total_words: usize,
    pub target_size: usize,
    pub relaxed: bool,
}

impl BatchSummary {
    pub fn rejected(&self) -> usize {
        self.rejected_by_reason.values().sum()
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Complete(FinalWordlist),
    /// Stopped between batches; the checkpoint holds the last completed batch.
    Paused {
        batches_processed: usize,
        accumulated: usize,
        target_size: usize,
    },
}

/// Drives the resumable batch loop: take a batch from the pool front,
/// validate it, merge through the homophone guard, checkpoint, repeat.
pub struct BatchGenerator {
    config: GenerationConfig,
    validator: Box<dyn BatchValidator>,
    relaxed_validator: Option<Box<dyn BatchValidator>>,
    guard: HomophoneGuard,
    store: CheckpointStore,
}

impl BatchGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self::with_rules(config, RuleSet::standard())
    }

    pub fn with_rules(config: GenerationConfig, rules: Arc<RuleSet>) -> Self {
        let scorer = Arc::new(WordScorer::new(Arc::clone(&rules)));
        let filter = WordFilter::new(config.filter.clone(), scorer);
        let validator = HeuristicValidator::new(filter, config.rank_within_batch);
        let relaxed_validator = config
            .relaxed_threshold
            .map(|threshold| Box::new(validator.with_threshold(threshold)) as Box<dyn BatchValidator>);
        Self {
            store: CheckpointStore::new(&config.state_file),
            guard: HomophoneGuard::new(rules),
            validator: Box::new(validator),
            relaxed_validator,
            config,
        }
    }

    /// Plugs in an external validator. No relaxation pass is available.
    pub fn with_validator(
        config: GenerationConfig,
        validator: Box<dyn BatchValidator>,
        guard: HomophoneGuard,
    ) -> Self {
        Self {
            store: CheckpointStore::new(&config.state_file),
            guard,
            validator,
            relaxed_validator: None,
            config,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Loads the checkpoint or builds and persists a fresh state.
    pub fn start(
        &self,
        mode: StartMode,
        foundation: &[String],
        corpus: Vec<String>,
    ) -> Result<GenerationState, GenerationError> {
        self.config.validate()?;
        let target = self.config.target_size;

        match mode {
            StartMode::Resume => {
                if let Some(state) = self.store.load()? {
                    state.ensure_matches(&self.config)?;
                    info!(
                        "Resuming from {}: {}/{} words after {} batches ({} candidates left)",
                        self.store.path().display(),
                        state.accumulated_words.len(),
                        target,
                        state.batches_processed,
                        state.remaining_candidates.len()
                    );
                    return Ok(state);
                }
            }
            StartMode::Fresh => {
                self.store.move_aside()?;
            }
        }

        let foundation: BTreeSet<String> = foundation.iter().cloned().collect();
        if let Some(bad) = foundation
            .iter()
            .find(|word| word.is_empty() || !word.chars().all(|c| c.is_ascii_lowercase()))
        {
            return Err(GenerationError::Config(format!(
                "foundation word {bad:?} is not lowercase ascii"
            )));
        }
        if foundation.len() > target {
            return Err(GenerationError::Config(format!(
                "foundation has {} words, more than the target of {target}",
                foundation.len()
            )));
        }

        for (first, second) in self.foundation_conflicts(&foundation) {
            warn!("Foundation holds homophones {first:?} and {second:?}; both are kept");
        }

        let source = CandidateSource::new(self.config.filter.min_length, self.config.filter.max_length);
        let pool = source.pool(corpus, &foundation);
        let available = foundation.len() + pool.len();
        if available < target {
            return Err(GenerationError::InsufficientCandidates {
                have: available,
                target,
            });
        }

        let state = GenerationState::fresh(foundation, pool, &self.config, Utc::now());
        info!(
            "Starting fresh: {} foundation words, {} candidates, ~{} batches of {}",
            state.foundation_words.len(),
            state.remaining_candidates.len(),
            state.estimated_total_batches,
            state.batch_size
        );
        self.store.save(&state)?;
        Ok(state)
    }

    /// Homophone pairs inside the foundation set. Foundation words are kept
    /// regardless, so these survive into the finished list.
    pub fn foundation_conflicts(&self, foundation: &BTreeSet<String>) -> Vec<(String, String)> {
        self.guard
            .conflicts(foundation)
            .into_iter()
            .map(|(first, second)| (first.to_string(), second.to_string()))
            .collect()
    }

    /// Runs batches until the target is met, the candidates run out, `stop`
    /// is raised or `max_batches` batches have completed in this call.
    pub fn run(
        &self,
        state: &mut GenerationState,
        stop: &AtomicBool,
        max_batches: Option<usize>,
    ) -> Result<RunOutcome, GenerationError> {
        let mut completed = 0;
        let mut announced_relaxation = false;

        loop {
            if state.is_complete() {
                return self.finish(state);
            }

            let relaxed = if !state.remaining_candidates.is_empty() {
                false
            } else if self.relaxed_validator.is_some() && !state.deferred_candidates.is_empty() {
                true
            } else {
                warn!(
                    "Candidates exhausted at {}/{} words; checkpoint kept at {}",
                    state.accumulated_words.len(),
                    state.target_size,
                    self.store.path().display()
                );
                return Err(GenerationError::InsufficientCandidates {
                    have: state.accumulated_words.len(),
                    target: state.target_size,
                });
            };

            if stop.load(Ordering::SeqCst) || max_batches.is_some_and(|limit| completed >= limit) {
                info!(
                    "Paused after batch {} at {}/{} words",
                    state.batches_processed,
                    state.accumulated_words.len(),
                    state.target_size
                );
                return Ok(RunOutcome::Paused {
                    batches_processed: state.batches_processed,
                    accumulated: state.accumulated_words.len(),
                    target_size: state.target_size,
                });
            }

            if relaxed && !announced_relaxation {
                info!(
                    "Candidate pool exhausted at {}/{} words; re-examining {} deferred words at threshold {:.2}",
                    state.accumulated_words.len(),
                    state.target_size,
                    state.deferred_candidates.len(),
                    self.config.relaxed_threshold.unwrap_or_default()
                );
                announced_relaxation = true;
            }

            let summary = self.step(state, relaxed)?;
            log_summary(&summary, state.estimated_total_batches);
            completed += 1;
        }
    }

    /// `start` followed by `run`.
    pub fn generate(
        &self,
        mode: StartMode,
        foundation: &[String],
        corpus: Vec<String>,
        stop: &AtomicBool,
        max_batches: Option<usize>,
    ) -> Result<RunOutcome, GenerationError> {
        let mut state = self.start(mode, foundation, corpus)?;
        self.run(&mut state, stop, max_batches)
    }

    /// Processes one batch and persists the result.
    pub fn step(
        &self,
        state: &mut GenerationState,
        relaxed: bool,
    ) -> Result<BatchSummary, GenerationError> {
        let (validator, source_len) = match (relaxed, &self.relaxed_validator) {
            (true, Some(validator)) => (&**validator, state.deferred_candidates.len()),
            (true, None) => {
                return Err(GenerationError::Config(
                    "relaxation pass requested without a relaxed threshold".into(),
                ));
            }
            (false, _) => (&*self.validator, state.remaining_candidates.len()),
        };
        let take = state.batch_size.min(source_len);
        let batch: Vec<String> = if relaxed {
            state.deferred_candidates.drain(..take).collect()
        } else {
            state.remaining_candidates.drain(..take).collect()
        };

        let report = validator.validate_batch(&batch);
        let mut rejected_by_reason = report.reason_counts();
        let mut merged = 0;
        for word in &report.accepted {
            if state.accumulated_words.len() >= state.target_size {
                break;
            }
            match self.guard.check(word, &state.accumulated_words) {
                Ok(()) => {
                    state.accumulated_words.insert(word.clone());
                    merged += 1;
                }
                Err(reason) => {
                    debug_log!("Rejected {word:?} at merge: {reason}");
                    *rejected_by_reason.entry(reason).or_insert(0) += 1;
                }
            }
        }
        if !relaxed {
            state
                .deferred_candidates
                .extend(report.low_scoring().map(str::to_string));
        }

        state.batches_processed += 1;
        state.saved_at = Utc::now().max(state.started_at);
        self.store.save(state)?;

        Ok(BatchSummary {
            batch_number: state.batches_processed,
            examined: batch.len(),
            merged,
            rejected_by_reason,
            total_words: state.accumulated_words.len(),
            target_size: state.target_size,
            relaxed,
        })
    }

    fn finish(&self, state: &GenerationState) -> Result<RunOutcome, GenerationError> {
        let wordlist = FinalWordlist::from_state(state, Utc::now());
        info!(
            "Target reached: {} words after {} batches",
            wordlist.words.len(),
            state.batches_processed
        );
        Ok(RunOutcome::Complete(wordlist))
    }

    /// Writes the finished wordlist into `dir`, then drops the checkpoint
    /// unless `keep_checkpoint` is set. A failed write leaves the checkpoint
    /// in place so the run can be retried.
    pub fn complete(
        &self,
        wordlist: &FinalWordlist,
        dir: &Path,
    ) -> Result<(PathBuf, PathBuf), GenerationError> {
        let paths = wordlist.write_to(dir)?;
        if self.config.keep_checkpoint {
            debug!("Keeping checkpoint at {}", self.store.path().display());
        } else {
            self.store.remove()?;
        }
        Ok(paths)
    }
}

fn log_summary(summary: &BatchSummary, estimated_total: usize) {
    let progress = 100.0 * summary.total_words as f64 / summary.target_size.max(1) as f64;
    info!(
        "Batch {}/~{}{}: {} examined, {} accepted, {} rejected, {}/{} words ({progress:.1}%)",
        summary.batch_number,
        estimated_total,
        if summary.relaxed { " (relaxed)" } else { "" },
        summary.examined,
        summary.merged,
        summary.rejected(),
        summary.total_words,
        summary.target_size
    );
    if !summary.rejected_by_reason.is_empty() {
        let breakdown: Vec<String> = summary
            .rejected_by_reason
            .iter()
            .map(|(reason, count)| format!("{reason}: {count}"))
            .collect();
        debug!("Batch {} rejections: {}", summary.batch_number, breakdown.join(", "));
    }
}
