//! # bntk
//!
//! A fuzzy bilingual lexical suggestion engine for Bangla and romanized
//! (Latin-script) Bangla.
//!
//! ## Features
//!
//! - Persisted lexicon of Bangla words and their romanized forms
//! - Trigram similarity with a nearest-neighbour index
//! - Idempotent bootstrap from CSV corpora with schema-conflict recovery
//! - Batched, three-stage suggestion query with deterministic ranking
//! - Pluggable storage backends, tokenizers and transliterators

pub mod analysis;
pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod storage;
pub mod suggest;

pub mod prelude {
    pub use crate::api::{Lexicon, LexiconSession, LexiconStats};
    pub use crate::bootstrap::{BootstrapProgress, BootstrapReport, ProgressSink};
    pub use crate::config::BntkConfig;
    pub use crate::error::{BntkError, Result};
    pub use crate::suggest::{Candidate, MatchType, Misspelling};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
