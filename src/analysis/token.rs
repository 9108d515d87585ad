//! Token types produced by the tokenizers.
//!
//! # Examples
//!
//! ```
//! use bntk::analysis::token::{Token, TokenType};
//!
//! let token = Token::with_offsets("আমি", 0, 0, 9);
//! assert_eq!(token.text, "আমি");
//! assert_eq!(token.token_type, TokenType::Bangla);
//! ```

use serde::{Deserialize, Serialize};

use crate::analysis::is_bengali;

/// A token represents a single word of the input text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the original text
    pub start_offset: usize,

    /// The byte offset where this token ends in the original text
    pub end_offset: usize,

    /// Script classification of the token
    pub token_type: TokenType,
}

/// Script classification of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Bangla-script text
    Bangla,
    /// Latin-script text (romanized input)
    Latin,
    /// Numeric values (ASCII or Bengali digits)
    Num,
    /// Both Bangla and Latin letters in one token
    Mixed,
    /// Other/unknown token types
    Other,
}

impl TokenType {
    /// Classify a word by the scripts it contains.
    pub fn detect(word: &str) -> TokenType {
        if word.is_empty() {
            return TokenType::Other;
        }

        if word.chars().all(|c| c.is_numeric()) {
            return TokenType::Num;
        }

        let has_bangla = word.chars().any(|c| is_bengali(c) && !c.is_numeric());
        let has_latin = word.chars().any(|c| c.is_ascii_alphabetic());

        match (has_bangla, has_latin) {
            (true, true) => TokenType::Mixed,
            (true, false) => TokenType::Bangla,
            (false, true) => TokenType::Latin,
            (false, false) => TokenType::Other,
        }
    }
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Self::with_offsets(text, position, 0, end_offset)
    }

    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        let text = text.into();
        let token_type = TokenType::detect(&text);
        Token {
            text,
            position,
            start_offset,
            end_offset,
            token_type,
        }
    }

    /// Get the length of the token text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Type alias for a stream of tokens.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_detection() {
        assert_eq!(TokenType::detect("তোমার"), TokenType::Bangla);
        assert_eq!(TokenType::detect("tomar"), TokenType::Latin);
        assert_eq!(TokenType::detect("২০২৪"), TokenType::Num);
        assert_eq!(TokenType::detect("2024"), TokenType::Num);
        assert_eq!(TokenType::detect("amiআমি"), TokenType::Mixed);
        assert_eq!(TokenType::detect(""), TokenType::Other);
    }

    #[test]
    fn test_token_new() {
        let token = Token::new("ami", 3);
        assert_eq!(token.position, 3);
        assert_eq!(token.end_offset, 3);
        assert_eq!(token.len(), 3);
        assert!(!token.is_empty());
        assert_eq!(token.token_type, TokenType::Latin);
    }
}
