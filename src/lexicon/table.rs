//! In-memory table storage with secondary indexes.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::lexicon::trigram::{Neighbor, TrigramIndex};

/// A canonical Bangla-script word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: i32,
    pub value: String,
}

/// The romanized form of a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomanizedWord {
    pub word_id: i32,
    pub value: String,
}

/// Character length, as used by the length index.
pub fn char_length(value: &str) -> usize {
    value.chars().count()
}

fn index_insert(index: &mut AHashMap<String, BTreeSet<i32>>, key: String, id: i32) {
    index.entry(key).or_default().insert(id);
}

fn index_remove(index: &mut AHashMap<String, BTreeSet<i32>>, key: &str, id: i32) {
    if let Some(ids) = index.get_mut(key) {
        ids.remove(&id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

/// The `words` table.
///
/// Rows are keyed by id. Secondary indexes cover exact value, lower-cased
/// value, and character length.
#[derive(Debug, Clone, Default)]
pub struct WordTable {
    rows: BTreeMap<i32, String>,
    by_value: AHashMap<String, BTreeSet<i32>>,
    by_lower: AHashMap<String, BTreeSet<i32>>,
    by_length: BTreeMap<usize, BTreeSet<i32>>,
    last_issued: i64,
}

/// Serialized form of a [`WordTable`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordSnapshot {
    pub last_issued: i64,
    pub rows: Vec<Word>,
}

impl WordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table and its indexes from a snapshot.
    pub fn from_snapshot(snapshot: WordSnapshot) -> Self {
        let mut table = WordTable::new();
        for word in snapshot.rows {
            table.insert_row(word.id, word.value);
        }
        table.last_issued = table.last_issued.max(snapshot.last_issued);
        table
    }

    pub fn snapshot(&self) -> WordSnapshot {
        WordSnapshot {
            last_issued: self.last_issued,
            rows: self.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn get(&self, id: i32) -> Option<&str> {
        self.rows.get(&id).map(String::as_str)
    }

    /// Rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = Word> + '_ {
        self.rows.iter().map(|(id, value)| Word {
            id: *id,
            value: value.clone(),
        })
    }

    /// Next value of the id sequence.
    pub fn next_id(&mut self) -> Option<i32> {
        let next = self.last_issued + 1;
        let id = i32::try_from(next).ok()?;
        self.last_issued = next;
        Some(id)
    }

    /// Last value handed out by (or advanced past through) the sequence.
    pub fn last_issued(&self) -> i64 {
        self.last_issued
    }

    /// Insert a row. The caller has checked the primary key.
    pub fn insert_row(&mut self, id: i32, value: String) {
        index_insert(&mut self.by_value, value.clone(), id);
        index_insert(&mut self.by_lower, value.to_lowercase(), id);
        self.by_length
            .entry(char_length(&value))
            .or_default()
            .insert(id);
        self.rows.insert(id, value);
        self.last_issued = self.last_issued.max(i64::from(id));
    }

    /// Remove a row, returning its value.
    pub fn remove_row(&mut self, id: i32) -> Option<String> {
        let value = self.rows.remove(&id)?;
        index_remove(&mut self.by_value, &value, id);
        index_remove(&mut self.by_lower, &value.to_lowercase(), id);
        let length = char_length(&value);
        if let Some(ids) = self.by_length.get_mut(&length) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_length.remove(&length);
            }
        }
        Some(value)
    }

    /// Ids whose value equals `value` exactly.
    pub fn ids_by_value(&self, value: &str) -> impl Iterator<Item = i32> + '_ {
        self.by_value.get(value).into_iter().flatten().copied()
    }

    /// Whether any row equals `lowered` after lower-casing.
    pub fn contains_lower(&self, lowered: &str) -> bool {
        self.by_lower.contains_key(lowered)
    }

    /// Rows whose character length is within `[min, max]`.
    pub fn ids_by_length(&self, min: usize, max: usize) -> Vec<i32> {
        if min > max {
            return Vec::new();
        }
        self.by_length
            .range(min..=max)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }
}

/// The `romanized_words` table, keyed by `word_id`.
#[derive(Debug, Clone, Default)]
pub struct RomanizedTable {
    rows: BTreeMap<i32, String>,
    by_lower: AHashMap<String, BTreeSet<i32>>,
    trigrams: TrigramIndex,
}

/// Serialized form of a [`RomanizedTable`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RomanizedSnapshot {
    pub rows: Vec<RomanizedWord>,
}

impl RomanizedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: RomanizedSnapshot) -> Self {
        let mut table = RomanizedTable::new();
        for row in snapshot.rows {
            table.insert_row(row.word_id, row.value);
        }
        table
    }

    pub fn snapshot(&self) -> RomanizedSnapshot {
        RomanizedSnapshot {
            rows: self.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, word_id: i32) -> bool {
        self.rows.contains_key(&word_id)
    }

    pub fn get(&self, word_id: i32) -> Option<&str> {
        self.rows.get(&word_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = RomanizedWord> + '_ {
        self.rows.iter().map(|(word_id, value)| RomanizedWord {
            word_id: *word_id,
            value: value.clone(),
        })
    }

    pub fn insert_row(&mut self, word_id: i32, value: String) {
        index_insert(&mut self.by_lower, value.to_lowercase(), word_id);
        self.trigrams.insert(word_id, &value);
        self.rows.insert(word_id, value);
    }

    pub fn remove_row(&mut self, word_id: i32) -> Option<String> {
        let value = self.rows.remove(&word_id)?;
        index_remove(&mut self.by_lower, &value.to_lowercase(), word_id);
        self.trigrams.remove(word_id);
        Some(value)
    }

    /// Word ids whose lower-cased value equals `lowered`.
    pub fn ids_by_lower(&self, lowered: &str) -> impl Iterator<Item = i32> + '_ {
        self.by_lower.get(lowered).into_iter().flatten().copied()
    }

    /// Nearest entries by trigram distance.
    pub fn nearest(&self, query: &str, k: usize) -> Vec<Neighbor> {
        self.trigrams.nearest(query, k)
    }

    pub fn trigram_index(&self) -> &TrigramIndex {
        &self.trigrams
    }
}
