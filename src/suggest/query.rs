//! The batched three-stage suggestion query.
//!
//! All distinct tokens of one request are matched in a single pass over the
//! database, under one read-lock acquisition held by the caller:
//!
//! 1. exact Bangla match on `words.value` (case-sensitive),
//! 2. exact romanized match on `lower(romanized_words.value)`,
//! 3. nearest romanized entries by trigram distance, kept above a similarity
//!    floor.
//!
//! A later stage never repeats an `(original, suggestion)` pair produced by an
//! earlier one, and the trigram stage never suggests the token itself.

use ahash::{AHashMap, AHashSet};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lexicon::Database;
use crate::suggest::candidate::{Candidate, MatchType};
use crate::suggest::ranking;

/// One distinct input token and its romanized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenQuery {
    pub original: String,
    pub romanized: String,
}

impl TokenQuery {
    pub fn new<S: Into<String>, T: Into<String>>(original: S, romanized: T) -> Self {
        TokenQuery {
            original: original.into(),
            romanized: romanized.into(),
        }
    }
}

/// Matching and ranking tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Maximum candidates kept per original token.
    pub max_per_token: usize,
    /// Neighbours fetched from the trigram index per token.
    pub nearest_neighbors: usize,
    /// Trigram candidates must score strictly above this.
    pub min_similarity: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            max_per_token: 5,
            nearest_neighbors: 15,
            min_similarity: 0.3,
        }
    }
}

/// Stage output keyed by `(original, suggestion)`; duplicates keep the
/// highest score.
#[derive(Default)]
struct StageOutput {
    scores: AHashMap<(String, String), f64>,
}

impl StageOutput {
    fn add(&mut self, original: &str, suggestion: &str, score: f64) {
        let entry = self
            .scores
            .entry((original.to_string(), suggestion.to_string()))
            .or_insert(score);
        if score > *entry {
            *entry = score;
        }
    }

    fn into_candidates(self, match_type: MatchType) -> impl Iterator<Item = Candidate> {
        self.scores
            .into_iter()
            .map(move |((original, suggestion), score)| {
                Candidate::new(original, suggestion, match_type, score)
            })
    }
}

fn exact_bangla(db: &Database, tokens: &[TokenQuery]) -> StageOutput {
    let mut output = StageOutput::default();
    for token in tokens {
        if db.words().ids_by_value(&token.original).next().is_some() {
            output.add(&token.original, &token.original, 1.0);
        }
    }
    output
}

fn exact_romanized(db: &Database, tokens: &[TokenQuery], seen: &AHashSet<(String, String)>) -> StageOutput {
    let mut output = StageOutput::default();
    for token in tokens {
        for romanized in db.find_romanized_exact(&token.romanized) {
            let Some(word) = db.word_value(romanized.word_id) else {
                continue;
            };
            if !seen.contains(&(token.original.clone(), word.to_string())) {
                output.add(&token.original, word, 1.0);
            }
        }
    }
    output
}

fn trigram_romanized(
    db: &Database,
    tokens: &[TokenQuery],
    seen: &AHashSet<(String, String)>,
    options: &MatchOptions,
) -> Result<StageOutput> {
    let mut output = StageOutput::default();
    for token in tokens {
        let neighbors = db.nearest_romanized(&token.romanized.to_lowercase(), options.nearest_neighbors)?;
        for (romanized, similarity) in neighbors {
            if similarity <= options.min_similarity {
                continue;
            }
            let Some(word) = db.word_value(romanized.word_id) else {
                continue;
            };
            if word == token.original || seen.contains(&(token.original.clone(), word.to_string())) {
                continue;
            }
            output.add(&token.original, word, similarity);
        }
    }
    Ok(output)
}

/// Run all three stages for `tokens` and rank the union.
///
/// `tokens` must be distinct by `original`; results are grouped in the order
/// of `tokens`.
pub fn execute(db: &Database, tokens: &[TokenQuery], options: &MatchOptions) -> Result<Vec<Candidate>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let stage1 = exact_bangla(db, tokens);
    let mut seen: AHashSet<(String, String)> = stage1.scores.keys().cloned().collect();

    let stage2 = exact_romanized(db, tokens, &seen);
    seen.extend(stage2.scores.keys().cloned());

    let stage3 = trigram_romanized(db, tokens, &seen, options)?;

    debug!(
        "Batched query over {} tokens: {} exact bangla, {} exact romanized, {} trigram",
        tokens.len(),
        stage1.scores.len(),
        stage2.scores.len(),
        stage3.scores.len()
    );

    let candidates: Vec<Candidate> = stage1
        .into_candidates(MatchType::ExactBangla)
        .chain(stage2.into_candidates(MatchType::ExactRomanized))
        .chain(stage3.into_candidates(MatchType::TrigramRomanized))
        .collect();

    let originals: Vec<String> = tokens.iter().map(|t| t.original.clone()).collect();
    Ok(ranking::rank(candidates, &originals, options.max_per_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BntkError;
    use crate::lexicon::TRIGRAM_EXTENSION;

    fn lexicon() -> Database {
        let mut db = Database::new();
        db.enable_extension(TRIGRAM_EXTENSION).unwrap();
        db.apply_schema().unwrap();
        for (id, word, romanized) in [(1, "আমি", "ami"), (2, "আমার", "amar"), (3, "তোমার", "tomar")] {
            db.insert_word_with_id(id, word).unwrap();
            db.insert_romanized(id, romanized).unwrap();
        }
        db
    }

    #[test]
    fn test_exact_romanized_match() {
        let db = lexicon();
        let tokens = vec![TokenQuery::new("tomar", "tomar")];

        let result = execute(&db, &tokens, &MatchOptions::default()).unwrap();
        assert_eq!(result[0].suggestion, "তোমার");
        assert_eq!(result[0].match_type, MatchType::ExactRomanized);
        assert_eq!(result[0].score, 1.0);
        assert_eq!(result[0].rank, 1);
        // "amar" is below the similarity floor
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_exact_bangla_suppresses_later_stages() {
        let db = lexicon();
        let tokens = vec![TokenQuery::new("আমি", "ami")];

        let result = execute(&db, &tokens, &MatchOptions::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].match_type, MatchType::ExactBangla);
        assert_eq!(result[0].suggestion, "আমি");
    }

    #[test]
    fn test_trigram_stage() {
        let db = lexicon();
        let tokens = vec![TokenQuery::new("tomr", "tomr")];

        let result = execute(&db, &tokens, &MatchOptions::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].suggestion, "তোমার");
        assert_eq!(result[0].match_type, MatchType::TrigramRomanized);
        assert!((result[0].score - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_and_empty() {
        let db = lexicon();
        assert!(execute(&db, &[], &MatchOptions::default()).unwrap().is_empty());

        let tokens = vec![TokenQuery::new("xyz", "xyz")];
        assert!(execute(&db, &tokens, &MatchOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_requires_extension() {
        let mut db = Database::new();
        db.apply_schema().unwrap();
        let tokens = vec![TokenQuery::new("ami", "ami")];
        assert!(matches!(
            execute(&db, &tokens, &MatchOptions::default()),
            Err(BntkError::ExtensionUnavailable(_))
        ));
    }
}
