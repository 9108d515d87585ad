//! Suggestion candidates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which matching stage produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// The token is a canonical word, case-sensitively.
    ExactBangla,
    /// The token's romanization equals a stored romanized form, ignoring case.
    ExactRomanized,
    /// A stored romanized form is trigram-similar to the token's romanization.
    TrigramRomanized,
}

impl MatchType {
    /// Ranking priority; lower ranks first.
    pub fn priority(self) -> u8 {
        match self {
            MatchType::ExactBangla => 1,
            MatchType::ExactRomanized => 2,
            MatchType::TrigramRomanized => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::ExactBangla => "exact_bangla",
            MatchType::ExactRomanized => "exact_romanized",
            MatchType::TrigramRomanized => "trigram_romanized",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored correction proposal for one input token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The input token.
    pub original: String,
    /// The proposed canonical word.
    pub suggestion: String,
    pub match_type: MatchType,
    /// Always `match_type.priority()`.
    pub priority: u8,
    /// 1.0 for exact matches, the trigram similarity otherwise.
    pub score: f64,
    /// 1-based rank within the original token's result set.
    pub rank: usize,
}

impl Candidate {
    /// An unranked candidate.
    pub fn new<S: Into<String>, T: Into<String>>(
        original: S,
        suggestion: T,
        match_type: MatchType,
        score: f64,
    ) -> Self {
        Candidate {
            original: original.into(),
            suggestion: suggestion.into(),
            match_type,
            priority: match_type.priority(),
            score,
            rank: 0,
        }
    }

    /// Whether the candidate came from an exact stage.
    pub fn is_exact(&self) -> bool {
        self.match_type != MatchType::TrigramRomanized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_matches_type() {
        let candidate = Candidate::new("tomar", "তোমার", MatchType::ExactRomanized, 1.0);
        assert_eq!(candidate.priority, 2);
        assert!(candidate.is_exact());
        assert_eq!(MatchType::TrigramRomanized.priority(), 3);
    }

    #[test]
    fn test_serializes_snake_case() {
        let mut candidate = Candidate::new("tomr", "তোমার", MatchType::TrigramRomanized, 0.375);
        candidate.rank = 1;

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["match_type"], "trigram_romanized");
        assert_eq!(json["rank"], 1);
        assert_eq!(MatchType::ExactBangla.to_string(), "exact_bangla");
    }
}
