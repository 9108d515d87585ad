//! Whitespace tokenizer implementation.

use crate::analysis::is_word_char;
use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on whitespace and trims leading and trailing
/// punctuation from each piece.
#[derive(Clone, Debug, Default)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    /// Create a new whitespace tokenizer.
    pub fn new() -> Self {
        WhitespaceTokenizer
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut offset = 0;

        for piece in text.split_whitespace() {
            // split_whitespace yields slices of `text`, so the search always succeeds
            let start = offset + text[offset..].find(piece).unwrap_or(0);
            offset = start + piece.len();

            let trimmed = piece.trim_matches(|c: char| !is_word_char(c));
            if trimmed.is_empty() {
                continue;
            }
            let lead = piece.len() - piece.trim_start_matches(|c: char| !is_word_char(c)).len();
            let token_start = start + lead;

            tokens.push(Token::with_offsets(
                trimmed,
                tokens.len(),
                token_start,
                token_start + trimmed.len(),
            ));
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_tokenizer() {
        let tokenizer = WhitespaceTokenizer::new();
        let tokens: Vec<Token> = tokenizer.tokenize("  ami,  (tomar)\tবাড়ি। ").unwrap().collect();

        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["ami", "tomar", "বাড়ি"]);
        assert_eq!(tokens[1].start_offset, 9);
        assert_eq!(tokens[1].end_offset, 14);
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_punctuation_only_pieces_are_dropped() {
        let tokenizer = WhitespaceTokenizer::new();
        assert_eq!(tokenizer.tokenize("-- ... ।").unwrap().count(), 0);
    }
}
