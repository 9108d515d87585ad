//! Trigram similarity facility.
//!
//! A string is lower-cased, split into words on non-word characters, and each
//! word is padded with two leading spaces and one trailing space. The distinct
//! 3-character windows of the padded words form the trigram set. Two strings
//! are compared by the size of the intersection of their trigram sets over the
//! size of the union.
//!
//! [`TrigramIndex`] is an inverted index from trigram to postings, used to
//! answer nearest-neighbour queries without scanning every entry.

use std::cmp::Ordering;

use ahash::AHashMap;

use crate::analysis::is_word_char;

/// Default similarity threshold for [`is_similar`].
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// A single trigram.
pub type Trigram = [char; 3];

/// Extract the sorted, de-duplicated trigram set of `text`.
pub fn trigrams(text: &str) -> Vec<Trigram> {
    let lowered = text.to_lowercase();
    let mut result = Vec::new();

    for word in lowered.split(|c: char| !is_word_char(c)) {
        if word.is_empty() {
            continue;
        }

        let mut padded = Vec::with_capacity(word.chars().count() + 3);
        padded.push(' ');
        padded.push(' ');
        padded.extend(word.chars());
        padded.push(' ');

        for window in padded.windows(3) {
            result.push([window[0], window[1], window[2]]);
        }
    }

    result.sort_unstable();
    result.dedup();
    result
}

/// Count the trigrams shared by two sorted sets.
fn shared_count(a: &[Trigram], b: &[Trigram]) -> usize {
    let (mut i, mut j, mut shared) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared
}

fn ratio(shared: usize, len_a: usize, len_b: usize) -> f64 {
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }
    shared as f64 / (len_a + len_b - shared) as f64
}

/// Similarity of two pre-computed trigram sets.
pub fn set_similarity(a: &[Trigram], b: &[Trigram]) -> f64 {
    ratio(shared_count(a, b), a.len(), b.len())
}

/// Trigram similarity in `[0, 1]`; 0 when either string has no trigrams.
pub fn similarity(a: &str, b: &str) -> f64 {
    set_similarity(&trigrams(a), &trigrams(b))
}

/// `1 - similarity(a, b)`.
pub fn distance(a: &str, b: &str) -> f64 {
    1.0 - similarity(a, b)
}

/// Threshold predicate: `similarity(a, b) >= threshold`.
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    similarity(a, b) >= threshold
}

/// A nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub key: i32,
    pub similarity: f64,
}

impl Neighbor {
    pub fn distance(&self) -> f64 {
        1.0 - self.similarity
    }
}

#[derive(Debug, Clone)]
struct IndexedEntry {
    lowered: String,
    trigrams: Vec<Trigram>,
}

/// Inverted trigram index keyed by row key.
#[derive(Debug, Clone, Default)]
pub struct TrigramIndex {
    postings: AHashMap<Trigram, Vec<i32>>,
    entries: AHashMap<i32, IndexedEntry>,
}

impl TrigramIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct trigrams.
    pub fn trigram_count(&self) -> usize {
        self.postings.len()
    }

    /// Index `text` under `key`, replacing any previous entry for the key.
    pub fn insert(&mut self, key: i32, text: &str) {
        self.remove(key);

        let entry = IndexedEntry {
            lowered: text.to_lowercase(),
            trigrams: trigrams(text),
        };
        for trigram in &entry.trigrams {
            self.postings.entry(*trigram).or_default().push(key);
        }
        self.entries.insert(key, entry);
    }

    /// Remove the entry for `key`. Returns whether one was present.
    pub fn remove(&mut self, key: i32) -> bool {
        let Some(entry) = self.entries.remove(&key) else {
            return false;
        };
        for trigram in &entry.trigrams {
            if let Some(keys) = self.postings.get_mut(trigram) {
                keys.retain(|k| *k != key);
                if keys.is_empty() {
                    self.postings.remove(trigram);
                }
            }
        }
        true
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.postings.clear();
        self.entries.clear();
    }

    /// The `k` entries closest to `query` by trigram distance.
    ///
    /// Ties are broken by the lower-cased indexed text, then by key. Entries
    /// sharing no trigram with the query are at distance 1 and never returned.
    pub fn nearest(&self, query: &str, k: usize) -> Vec<Neighbor> {
        let query_trigrams = trigrams(query);
        if query_trigrams.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut shared: AHashMap<i32, usize> = AHashMap::new();
        for trigram in &query_trigrams {
            if let Some(keys) = self.postings.get(trigram) {
                for key in keys {
                    *shared.entry(*key).or_insert(0) += 1;
                }
            }
        }

        let mut hits: Vec<(Neighbor, &str)> = shared
            .into_iter()
            .filter_map(|(key, count)| {
                let entry = self.entries.get(&key)?;
                let similarity = ratio(count, query_trigrams.len(), entry.trigrams.len());
                Some((Neighbor { key, similarity }, entry.lowered.as_str()))
            })
            .collect();

        hits.sort_by(|(a, a_text), (b, b_text)| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a_text.cmp(b_text))
                .then_with(|| a.key.cmp(&b.key))
        });
        hits.truncate(k);
        hits.into_iter().map(|(neighbor, _)| neighbor).collect()
    }
}
