//! Error types for the bntk library.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! the [`BntkError`] enum. The variants mirror the failure classes of the
//! lexicon lifecycle: extension enablement, schema application, corpus
//! fetching, bulk copy, and query execution.
//!
//! # Examples
//!
//! ```
//! use bntk::error::{BntkError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(BntkError::invalid_argument("empty token"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for bntk operations.
#[derive(Error, Debug)]
pub enum BntkError {
    /// I/O errors (file operations, corpus reads, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The trigram similarity capability is missing or could not be enabled.
    #[error("Extension unavailable: {0}")]
    ExtensionUnavailable(String),

    /// A pre-existing, incompatible schema was found.
    #[error("Schema conflict: {0}")]
    SchemaConflict(String),

    /// Other catalog errors (unknown table, dependent objects, ...)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Primary key, foreign key or NOT NULL violations.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A seed corpus could not be retrieved.
    #[error("Corpus fetch error: {0}")]
    CorpusFetch(String),

    /// Malformed bulk copy input.
    #[error("Copy error: {0}")]
    Copy(String),

    /// Query execution errors
    #[error("Query error: {0}")]
    Query(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Tokenization and transliteration errors
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with BntkError.
pub type Result<T> = std::result::Result<T, BntkError>;

impl BntkError {
    /// Create a new extension-unavailable error.
    pub fn extension_unavailable<S: Into<String>>(msg: S) -> Self {
        BntkError::ExtensionUnavailable(msg.into())
    }

    /// Create a new schema conflict error.
    pub fn schema_conflict<S: Into<String>>(msg: S) -> Self {
        BntkError::SchemaConflict(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        BntkError::Schema(msg.into())
    }

    /// Create a new constraint violation error.
    pub fn constraint<S: Into<String>>(msg: S) -> Self {
        BntkError::Constraint(msg.into())
    }

    /// Create a new corpus fetch error.
    pub fn corpus_fetch<S: Into<String>>(msg: S) -> Self {
        BntkError::CorpusFetch(msg.into())
    }

    /// Create a new copy error.
    pub fn copy<S: Into<String>>(msg: S) -> Self {
        BntkError::Copy(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        BntkError::Query(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        BntkError::Storage(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        BntkError::Analysis(msg.into())
    }

    /// Create a new config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        BntkError::Config(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        BntkError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        BntkError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        BntkError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        BntkError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Whether this error is a schema conflict that drop-and-recreate can heal.
    pub fn is_schema_conflict(&self) -> bool {
        matches!(self, BntkError::SchemaConflict(_))
    }
}

impl From<bincode::Error> for BntkError {
    fn from(err: bincode::Error) -> Self {
        BntkError::serialization(err.to_string())
    }
}

impl From<csv::Error> for BntkError {
    fn from(err: csv::Error) -> Self {
        BntkError::copy(err.to_string())
    }
}
