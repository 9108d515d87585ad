//! Transliteration adapters.
//!
//! The suggestion engine derives the romanized form of every input token
//! through a [`Transliterator`]. Producing a romanization for arbitrary Bangla
//! text is the job of an external transliteration library; the adapters here
//! cover the cases the engine needs without one:
//!
//! - [`PassthroughTransliterator`] treats Latin-script tokens as already
//!   romanized (lower-cased) and returns any other token unchanged.
//! - [`TableTransliterator`] looks whole words up in per-mode tables and falls
//!   back to passthrough behaviour.
//!
//! # Examples
//!
//! ```
//! use bntk::analysis::transliterator::{RenderMode, TableTransliterator, Transliterator};
//!
//! let transliterator = TableTransliterator::new().with_entry(RenderMode::Phonetic, "তোমার", "tomar");
//! assert_eq!(transliterator.transliterate("তোমার", RenderMode::Phonetic).unwrap(), "tomar");
//! assert_eq!(transliterator.transliterate("Ami", RenderMode::Phonetic).unwrap(), "ami");
//! ```

use std::fmt;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenType;
use crate::error::{BntkError, Result};

/// Named rendering mode for romanization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Informal phonetic spelling as typed on a Latin keyboard ("tomar").
    #[default]
    Phonetic,
    /// ISO 15919 style rendering with diacritics ("tōmāra").
    Iso15919,
}

impl RenderMode {
    /// The configuration name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Phonetic => "phonetic",
            RenderMode::Iso15919 => "iso15919",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RenderMode {
    type Err = BntkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "phonetic" => Ok(RenderMode::Phonetic),
            "iso15919" => Ok(RenderMode::Iso15919),
            other => Err(BntkError::analysis(format!("unknown render mode: {other}"))),
        }
    }
}

/// Trait for transliterators that render a token in Latin script.
///
/// Implementations must be pure: the same `(text, mode)` always yields the
/// same output.
pub trait Transliterator: Send + Sync {
    /// Render `text` in Latin script under `mode`.
    fn transliterate(&self, text: &str, mode: RenderMode) -> Result<String>;

    /// Get the name of this transliterator (for debugging and configuration).
    fn name(&self) -> &'static str;
}

fn passthrough(text: &str) -> String {
    match TokenType::detect(text) {
        TokenType::Latin | TokenType::Num => text.to_lowercase(),
        _ => text.to_string(),
    }
}

/// A transliterator for input that is already romanized.
#[derive(Clone, Debug, Default)]
pub struct PassthroughTransliterator;

impl PassthroughTransliterator {
    /// Create a new passthrough transliterator.
    pub fn new() -> Self {
        PassthroughTransliterator
    }
}

impl Transliterator for PassthroughTransliterator {
    fn transliterate(&self, text: &str, _mode: RenderMode) -> Result<String> {
        Ok(passthrough(text))
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// A whole-word lookup transliterator with one table per render mode.
#[derive(Clone, Debug, Default)]
pub struct TableTransliterator {
    tables: AHashMap<RenderMode, AHashMap<String, String>>,
}

impl TableTransliterator {
    /// Create an empty table transliterator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single mapping.
    pub fn with_entry<S: Into<String>, T: Into<String>>(
        mut self,
        mode: RenderMode,
        word: S,
        romanized: T,
    ) -> Self {
        self.insert(mode, word, romanized);
        self
    }

    /// Add or replace a single mapping.
    pub fn insert<S: Into<String>, T: Into<String>>(
        &mut self,
        mode: RenderMode,
        word: S,
        romanized: T,
    ) {
        self.tables
            .entry(mode)
            .or_default()
            .insert(word.into(), romanized.into());
    }

    /// Number of mappings for `mode`.
    pub fn len(&self, mode: RenderMode) -> usize {
        self.tables.get(&mode).map_or(0, |table| table.len())
    }

    /// Load `word,romanized` rows (with a header row) for `mode` from a CSV file.
    pub fn load_csv<P: AsRef<Path>>(&mut self, mode: RenderMode, path: P) -> Result<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path.as_ref())?;

        let mut loaded = 0;
        for record in reader.records() {
            let record = record?;
            match (record.get(0), record.get(1)) {
                (Some(word), Some(romanized)) if !word.is_empty() => {
                    self.insert(mode, word, romanized);
                    loaded += 1;
                }
                _ => {
                    return Err(BntkError::analysis(format!(
                        "malformed transliteration row at line {}",
                        record.position().map_or(0, |p| p.line())
                    )));
                }
            }
        }
        Ok(loaded)
    }
}

impl Transliterator for TableTransliterator {
    fn transliterate(&self, text: &str, mode: RenderMode) -> Result<String> {
        Ok(self
            .tables
            .get(&mode)
            .and_then(|table| table.get(text))
            .cloned()
            .unwrap_or_else(|| passthrough(text)))
    }

    fn name(&self) -> &'static str {
        "table"
    }
}
