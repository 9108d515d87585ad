//! Lexicon store: a small persisted relational store for the word lexicon.
//!
//! Two tables hold the data:
//!
//! - `words(id, value)`: canonical Bangla-script forms. `id` defaults to the
//!   next value of `words_id_seq`. Values are not unique.
//! - `romanized_words(word_id, value)`: at most one romanized form per word.
//!   `word_id` references `words(id)` with delete-restrict and update-cascade.
//!
//! Secondary indexes cover the exact value, the lower-cased value, the
//! character length of `words.value`, and the lower-cased value plus trigrams
//! of `romanized_words.value`. Trigram operations are only available once the
//! `"trigram"` extension is enabled.
//!
//! # Example
//!
//! ```
//! use bntk::lexicon::{LexiconStore, TRIGRAM_EXTENSION, WORDS_TABLE};
//!
//! # tokio_test::block_on(async {
//! let store = LexiconStore::memory().await?;
//! store.enable_extension(TRIGRAM_EXTENSION).await?;
//! store.apply_schema().await?;
//!
//! let id = store.insert_word("আমি").await?;
//! store.insert_romanized(id, "ami").await?;
//!
//! assert!(store.exists("আমি").await);
//! assert_eq!(store.count(WORDS_TABLE).await?, 1);
//! # Ok::<(), bntk::error::BntkError>(())
//! # }).unwrap();
//! ```

pub mod copy;
pub mod database;
pub mod persist;
pub mod schema;
pub mod store;
pub mod table;
pub mod trigram;

pub use copy::CopyFailure;
pub use database::{Database, SimilarWordsOptions};
pub use schema::{Catalog, ColumnDef, ColumnType, ReferentialAction, TableDef, canonical_schema};
pub use store::{LexiconStore, StoreOptions, StoreStats};
pub use table::{RomanizedWord, Word};

/// Canonical words table.
pub const WORDS_TABLE: &str = "words";

/// Romanized forms table.
pub const ROMANIZED_WORDS_TABLE: &str = "romanized_words";

/// Sequence backing `words.id`.
pub const WORDS_ID_SEQUENCE: &str = "words_id_seq";

/// Name of the trigram similarity extension.
pub const TRIGRAM_EXTENSION: &str = "trigram";
