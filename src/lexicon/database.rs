//! The in-memory relational database behind [`LexiconStore`].
//!
//! [`Database`] is synchronous and owns the catalog plus both tables. It
//! enforces primary key, foreign key and referential-action semantics and
//! tracks which persisted files each mutation dirtied.
//!
//! [`LexiconStore`]: crate::lexicon::LexiconStore

use std::collections::BTreeSet;

use crate::error::{BntkError, Result};
use crate::lexicon::copy::{Row, Value};
use crate::lexicon::schema::{Catalog, TableDef};
use crate::lexicon::table::{
    RomanizedSnapshot, RomanizedTable, RomanizedWord, Word, WordSnapshot, WordTable, char_length,
};
use crate::lexicon::trigram::{self, Neighbor};
use crate::lexicon::{ROMANIZED_WORDS_TABLE, TRIGRAM_EXTENSION, WORDS_TABLE};

/// Extensions this build can enable.
pub const AVAILABLE_EXTENSIONS: &[&str] = &[TRIGRAM_EXTENSION];

/// A persisted artifact that needs rewriting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dirty {
    Catalog,
    Table(String),
    Dropped(String),
}

/// Options for the length-windowed similar-words lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarWordsOptions {
    /// Fraction of the input length allowed as length difference.
    pub length_tolerance: f64,
    /// Strict lower bound on similarity.
    pub min_similarity: f64,
    pub limit: usize,
}

impl Default for SimilarWordsOptions {
    fn default() -> Self {
        SimilarWordsOptions {
            length_tolerance: 0.3,
            min_similarity: 0.3,
            limit: 5,
        }
    }
}

/// Catalog plus table data.
#[derive(Debug, Default)]
pub struct Database {
    catalog: Catalog,
    /// Set when persisted state could not be decoded.
    unreadable: Option<String>,
    words: WordTable,
    romanized: RomanizedTable,
    dirty: BTreeSet<Dirty>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a database from loaded parts.
    pub fn from_parts(
        catalog: Catalog,
        words: Option<WordSnapshot>,
        romanized: Option<RomanizedSnapshot>,
    ) -> Self {
        Database {
            catalog,
            unreadable: None,
            words: words.map(WordTable::from_snapshot).unwrap_or_default(),
            romanized: romanized
                .map(RomanizedTable::from_snapshot)
                .unwrap_or_default(),
            dirty: BTreeSet::new(),
        }
    }

    /// A database whose persisted state could not be decoded. Applying the
    /// schema reports a conflict until the tables are dropped.
    pub fn unreadable<S: Into<String>>(reason: S) -> Self {
        Database {
            unreadable: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn words(&self) -> &WordTable {
        &self.words
    }

    pub fn romanized(&self) -> &RomanizedTable {
        &self.romanized
    }

    /// Take the set of artifacts dirtied since the last call.
    pub fn take_dirty(&mut self) -> BTreeSet<Dirty> {
        std::mem::take(&mut self.dirty)
    }

    /// Put back artifacts whose flush did not complete.
    pub fn restore_dirty(&mut self, dirty: BTreeSet<Dirty>) {
        self.dirty.extend(dirty);
    }

    fn mark_table(&mut self, table: &str) {
        self.dirty.insert(Dirty::Table(table.to_string()));
    }

    // ---- extensions -------------------------------------------------------

    /// Enable an extension. Idempotent.
    pub fn enable_extension(&mut self, name: &str) -> Result<()> {
        if !AVAILABLE_EXTENSIONS.contains(&name) {
            return Err(BntkError::extension_unavailable(format!(
                "extension \"{name}\" is not available"
            )));
        }
        if self.catalog.extensions.insert(name.to_string()) {
            self.dirty.insert(Dirty::Catalog);
        }
        Ok(())
    }

    pub fn extension_enabled(&self, name: &str) -> bool {
        self.catalog.extensions.contains(name)
    }

    fn require_trigram(&self) -> Result<()> {
        if self.extension_enabled(TRIGRAM_EXTENSION) {
            Ok(())
        } else {
            Err(BntkError::extension_unavailable(format!(
                "extension \"{TRIGRAM_EXTENSION}\" is not enabled"
            )))
        }
    }

    // ---- DDL --------------------------------------------------------------

    /// Apply the canonical schema. Returns the created table names.
    pub fn apply_schema(&mut self) -> Result<Vec<String>> {
        if let Some(reason) = &self.unreadable {
            return Err(BntkError::schema_conflict(format!(
                "persisted lexicon is unreadable: {reason}"
            )));
        }

        let created = self.catalog.apply_canonical()?;
        if !created.is_empty() {
            self.dirty.insert(Dirty::Catalog);
            for name in &created {
                self.mark_table(name);
            }
        }
        Ok(created)
    }

    pub fn create_table(&mut self, definition: TableDef) -> Result<()> {
        let name = definition.name.clone();
        self.catalog.create_table(definition)?;
        self.dirty.insert(Dirty::Catalog);
        if self.catalog.is_canonical(&name) {
            self.mark_table(&name);
        }
        Ok(())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.catalog.has_table(name)
    }

    /// Drop a table and its rows.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.catalog.drop_table(name)?;
        self.discard_rows(name);
        Ok(())
    }

    /// Drop a table if it exists. Returns whether anything was dropped.
    ///
    /// On an unreadable database this discards the persisted state of the
    /// named table and clears the unreadable flag. Enabled extensions stay.
    pub fn drop_table_if_exists(&mut self, name: &str) -> Result<bool> {
        if self.unreadable.take().is_some() {
            let extensions = std::mem::take(&mut self.catalog.extensions);
            self.catalog = Catalog {
                extensions,
                ..Catalog::default()
            };
            self.discard_rows(name);
            return Ok(true);
        }
        if !self.catalog.has_table(name) {
            return Ok(false);
        }
        self.drop_table(name)?;
        Ok(true)
    }

    fn discard_rows(&mut self, name: &str) {
        match name {
            WORDS_TABLE => self.words = WordTable::new(),
            ROMANIZED_WORDS_TABLE => self.romanized = RomanizedTable::new(),
            _ => {}
        }
        self.dirty.insert(Dirty::Catalog);
        self.dirty.insert(Dirty::Dropped(name.to_string()));
    }

    /// Fail unless `name` exists with its canonical definition.
    fn require_canonical(&self, name: &str) -> Result<()> {
        if !self.catalog.has_table(name) {
            return Err(BntkError::schema(format!(
                "relation \"{name}\" does not exist"
            )));
        }
        if !self.catalog.is_canonical(name) {
            return Err(BntkError::schema(format!(
                "relation \"{name}\" has an incompatible definition"
            )));
        }
        Ok(())
    }

    // ---- DML --------------------------------------------------------------

    /// Insert a word with a sequence-assigned id.
    pub fn insert_word(&mut self, value: &str) -> Result<i32> {
        self.require_canonical(WORDS_TABLE)?;
        loop {
            let id = self
                .words
                .next_id()
                .ok_or_else(|| BntkError::constraint("words_id_seq reached its maximum value"))?;
            if !self.words.contains(id) {
                self.words.insert_row(id, value.to_string());
                self.mark_table(WORDS_TABLE);
                return Ok(id);
            }
        }
    }

    /// Insert a word with an explicit id.
    pub fn insert_word_with_id(&mut self, id: i32, value: &str) -> Result<()> {
        self.require_canonical(WORDS_TABLE)?;
        self.check_word_row(id)?;
        self.words.insert_row(id, value.to_string());
        self.mark_table(WORDS_TABLE);
        Ok(())
    }

    /// Insert the romanized form of an existing word.
    pub fn insert_romanized(&mut self, word_id: i32, value: &str) -> Result<()> {
        self.require_canonical(ROMANIZED_WORDS_TABLE)?;
        self.check_romanized_row(word_id)?;
        self.romanized.insert_row(word_id, value.to_string());
        self.mark_table(ROMANIZED_WORDS_TABLE);
        Ok(())
    }

    fn check_word_row(&self, id: i32) -> Result<()> {
        if self.words.contains(id) {
            return Err(BntkError::constraint(format!(
                "duplicate key value violates unique constraint \"words_pkey\": (id)=({id})"
            )));
        }
        Ok(())
    }

    fn check_romanized_row(&self, word_id: i32) -> Result<()> {
        if self.romanized.contains(word_id) {
            return Err(BntkError::constraint(format!(
                "duplicate key value violates unique constraint \"romanized_words_pkey\": (word_id)=({word_id})"
            )));
        }
        if !self.words.contains(word_id) {
            return Err(BntkError::constraint(format!(
                "insert on \"romanized_words\" violates foreign key constraint \"romanized_words_word_id_fkey\": (word_id)=({word_id}) is not present in \"words\""
            )));
        }
        Ok(())
    }

    /// Delete a word. Restricted while a romanized form references it.
    pub fn delete_word(&mut self, id: i32) -> Result<bool> {
        self.require_canonical(WORDS_TABLE)?;
        if self.romanized.contains(id) {
            return Err(BntkError::constraint(format!(
                "delete on \"words\" violates foreign key constraint \"romanized_words_word_id_fkey\": (id)=({id}) is still referenced from \"romanized_words\""
            )));
        }
        let removed = self.words.remove_row(id).is_some();
        if removed {
            self.mark_table(WORDS_TABLE);
        }
        Ok(removed)
    }

    /// Renumber a word; its romanized form follows.
    pub fn update_word_id(&mut self, old_id: i32, new_id: i32) -> Result<()> {
        self.require_canonical(WORDS_TABLE)?;
        if !self.words.contains(old_id) {
            return Err(BntkError::constraint(format!(
                "word {old_id} does not exist"
            )));
        }
        if old_id == new_id {
            return Ok(());
        }
        self.check_word_row(new_id)?;

        if let Some(value) = self.words.remove_row(old_id) {
            self.words.insert_row(new_id, value);
        }
        if let Some(value) = self.romanized.remove_row(old_id) {
            self.romanized.insert_row(new_id, value);
            self.mark_table(ROMANIZED_WORDS_TABLE);
        }
        self.mark_table(WORDS_TABLE);
        Ok(())
    }

    /// Validate and insert one decoded batch. The batch is applied in full or
    /// not at all.
    pub fn apply_copy_batch(&mut self, table: &str, batch: Vec<Row>) -> Result<usize> {
        self.require_canonical(table)?;
        let count = batch.len();

        match table {
            WORDS_TABLE => {
                let rows = batch
                    .into_iter()
                    .map(|row| decode_pair(table, row))
                    .collect::<Result<Vec<_>>>()?;
                let mut seen = BTreeSet::new();
                for (id, _) in &rows {
                    self.check_word_row(*id)?;
                    if !seen.insert(*id) {
                        return Err(BntkError::constraint(format!(
                            "duplicate key value violates unique constraint \"words_pkey\": (id)=({id})"
                        )));
                    }
                }
                for (id, value) in rows {
                    self.words.insert_row(id, value);
                }
            }
            ROMANIZED_WORDS_TABLE => {
                let rows = batch
                    .into_iter()
                    .map(|row| decode_pair(table, row))
                    .collect::<Result<Vec<_>>>()?;
                let mut seen = BTreeSet::new();
                for (word_id, _) in &rows {
                    self.check_romanized_row(*word_id)?;
                    if !seen.insert(*word_id) {
                        return Err(BntkError::constraint(format!(
                            "duplicate key value violates unique constraint \"romanized_words_pkey\": (word_id)=({word_id})"
                        )));
                    }
                }
                for (word_id, value) in rows {
                    self.romanized.insert_row(word_id, value);
                }
            }
            other => {
                return Err(BntkError::schema(format!(
                    "relation \"{other}\" does not support copy"
                )));
            }
        }

        if count > 0 {
            self.mark_table(table);
        }
        Ok(count)
    }

    // ---- queries ----------------------------------------------------------

    /// Row count of a table.
    pub fn count(&self, table: &str) -> Result<usize> {
        self.require_canonical(table)?;
        Ok(match table {
            WORDS_TABLE => self.words.len(),
            _ => self.romanized.len(),
        })
    }

    /// Words whose value equals `value` (case-sensitive).
    pub fn find_exact(&self, value: &str) -> Vec<Word> {
        self.words
            .ids_by_value(value)
            .map(|id| Word {
                id,
                value: value.to_string(),
            })
            .collect()
    }

    /// Case-insensitive existence check through the lower-cased index.
    pub fn exists(&self, word: &str) -> bool {
        self.words.contains_lower(&word.to_lowercase())
    }

    /// Words whose character length lies in `[min, max]`, by id.
    pub fn find_by_length(&self, min: usize, max: usize) -> Vec<Word> {
        self.words
            .ids_by_length(min, max)
            .into_iter()
            .filter_map(|id| {
                self.words.get(id).map(|value| Word {
                    id,
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Romanized rows whose lower-cased value equals `lower(value)`.
    pub fn find_romanized_exact(&self, value: &str) -> Vec<RomanizedWord> {
        self.romanized
            .ids_by_lower(&value.to_lowercase())
            .filter_map(|word_id| {
                self.romanized.get(word_id).map(|v| RomanizedWord {
                    word_id,
                    value: v.to_string(),
                })
            })
            .collect()
    }

    /// The word a romanized row belongs to.
    pub fn word_value(&self, id: i32) -> Option<&str> {
        self.words.get(id)
    }

    pub fn similarity(&self, a: &str, b: &str) -> Result<f64> {
        self.require_trigram()?;
        Ok(trigram::similarity(a, b))
    }

    pub fn distance(&self, a: &str, b: &str) -> Result<f64> {
        self.require_trigram()?;
        Ok(trigram::distance(a, b))
    }

    pub fn is_similar(&self, a: &str, b: &str, threshold: f64) -> Result<bool> {
        self.require_trigram()?;
        Ok(trigram::is_similar(a, b, threshold))
    }

    /// The `k` romanized rows nearest to `query` by trigram distance.
    pub fn nearest_romanized(&self, query: &str, k: usize) -> Result<Vec<(RomanizedWord, f64)>> {
        self.require_trigram()?;
        Ok(self
            .romanized
            .nearest(query, k)
            .into_iter()
            .filter_map(|Neighbor { key, similarity }| {
                self.romanized.get(key).map(|value| {
                    (
                        RomanizedWord {
                            word_id: key,
                            value: value.to_string(),
                        },
                        similarity,
                    )
                })
            })
            .collect())
    }

    /// Words of similar length and spelling to `word`.
    ///
    /// The length window is `ceil(len * tolerance)` around the input's
    /// character length (lower bound at least 1). The lower-cased input itself
    /// is excluded. Results are ordered by similarity, then length, then value.
    pub fn similar_words(&self, word: &str, options: &SimilarWordsOptions) -> Result<Vec<String>> {
        self.require_trigram()?;
        self.require_canonical(WORDS_TABLE)?;

        let lowered = word.to_lowercase();
        let query = trigram::trigrams(&lowered);
        let length = char_length(word);
        let window = (length as f64 * options.length_tolerance).ceil() as usize;
        let min = length.saturating_sub(window).max(1);
        let max = length + window;

        let mut hits: Vec<(f64, usize, String)> = self
            .find_by_length(min, max)
            .into_iter()
            .filter(|w| w.value != lowered)
            .filter_map(|w| {
                let sim = trigram::set_similarity(&trigram::trigrams(&w.value), &query);
                (sim > options.min_similarity).then(|| (sim, char_length(&w.value), w.value))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        hits.truncate(options.limit);
        Ok(hits.into_iter().map(|(_, _, value)| value).collect())
    }
}

fn decode_pair(table: &str, row: Row) -> Result<(i32, String)> {
    let mut values = row.into_iter();
    match (values.next(), values.next(), values.next()) {
        (Some(Value::Int4(key)), Some(Value::Text(value)), None) => Ok((key, value)),
        _ => Err(BntkError::copy(format!(
            "{table}: row does not match (int4, text)"
        ))),
    }
}
