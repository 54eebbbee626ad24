// Library interface for wordlist-forge
// The binary and the integration tests both go through these modules

pub mod analysis;
pub mod artifact;
pub mod candidates;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod generator;
pub mod homophones;
pub mod logging;
pub mod rules;
pub mod scorer;
pub mod validator;

// Re-export the types most callers need
pub use analysis::{
    Overlap, PatternProfile, ReadabilityReport, TypingProfile, WordlistStats, compare,
    evaluate_readability, load_wordlist,
};
pub use artifact::{FinalWordlist, WordlistMetadata};
pub use candidates::{
    CandidateSource, load_corpus_from_file, load_corpus_from_str, load_foundation_from_file,
    load_foundation_from_str,
};
pub use checkpoint::{CheckpointStore, GenerationState};
pub use config::{GenerationConfig, GenerationProfile};
pub use error::{CheckpointError, GenerationError, WordError};
pub use filter::{FilterConfig, RejectionReason, Verdict, WordFilter};
pub use generator::{BatchGenerator, BatchSummary, RunOutcome, StartMode};
pub use homophones::HomophoneGuard;
pub use rules::RuleSet;
pub use scorer::{Score, Tier, WordScorer};
pub use validator::{BatchReport, BatchValidator, HeuristicValidator};
