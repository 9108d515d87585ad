//! Suggestion engine.
//!
//! Input text is tokenized, each distinct token is romanized, and one batched
//! query runs three matching stages against the lexicon:
//!
//! | Stage | Match | Priority | Score |
//! |-------|-------|----------|-------|
//! | `exact_bangla` | `words.value = token` | 1 | 1.0 |
//! | `exact_romanized` | `lower(romanized_words.value) = lower(romanized)` | 2 | 1.0 |
//! | `trigram_romanized` | nearest romanized forms, similarity above the floor | 3 | similarity |
//!
//! Candidates are ranked per token by priority, then score, then suggestion,
//! and at most `max_per_token` are kept.

pub mod candidate;
pub mod check;
pub mod engine;
pub mod query;
pub mod ranking;

pub use candidate::{Candidate, MatchType};
pub use check::Misspelling;
pub use engine::{SuggestionConfig, SuggestionEngine};
pub use query::{MatchOptions, TokenQuery};
