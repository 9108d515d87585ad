//! Grouping of candidates into per-word spelling reports.

use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::suggest::candidate::{Candidate, MatchType};

/// Suggestions for one distinct word of the checked text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misspelling {
    pub word: String,
    /// Byte offset of the word's first occurrence in the text.
    pub index: usize,
    /// Suggestions in rank order.
    pub suggestions: Vec<String>,
}

/// Group ranked candidates by original, in first-occurrence order.
///
/// `tokens` are the distinct tokens of the text, each carrying the offset of
/// its first occurrence. Tokens without candidates produce no entry, and
/// neither do tokens found verbatim in the lexicon.
pub fn group(candidates: &[Candidate], tokens: &[Token]) -> Vec<Misspelling> {
    tokens
        .iter()
        .filter_map(|token| {
            let own: Vec<&Candidate> = candidates
                .iter()
                .filter(|c| c.original == token.text)
                .collect();
            if own.iter().any(|c| c.match_type == MatchType::ExactBangla) {
                return None;
            }
            let suggestions: Vec<String> = own.iter().map(|c| c.suggestion.clone()).collect();
            (!suggestions.is_empty()).then(|| Misspelling {
                word: token.text.clone(),
                index: token.start_offset,
                suggestions,
            })
        })
        .collect()
}
