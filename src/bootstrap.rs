//! Bootstrap pipeline.
//!
//! Brings a lexicon store from any state to a seeded, queryable one:
//!
//! 1. enable the `"trigram"` extension,
//! 2. apply the canonical schema, dropping and recreating both tables when an
//!    incompatible schema is found (bounded by `schema_retries`),
//! 3. count each table and load its corpus only when it is empty,
//! 4. report progress and a per-table outcome.
//!
//! Running bootstrap against an already seeded store changes nothing.

pub mod corpus;
pub mod pipeline;
pub mod progress;

pub use corpus::{CorpusConfig, CorpusSource, FileCorpusSource, MemoryCorpusSource};
pub use pipeline::{BootstrapConfig, BootstrapReport, Bootstrapper, TableOutcome};
pub use progress::{BootstrapProgress, ProgressSink};
