//! Unicode word tokenizer implementation.
//!
//! Splits text using Unicode word boundary rules (UAX #29) and drops the
//! non-word segments (punctuation, whitespace, the danda).
//!
//! # Examples
//!
//! ```
//! use bntk::analysis::tokenizer::Tokenizer;
//! use bntk::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("আমি, tomar বাড়ি।").unwrap().collect();
//!
//! assert_eq!(tokens[0].text, "আমি");
//! assert_eq!(tokens[1].text, "tomar");
//! assert_eq!(tokens[2].text, "বাড়ি");
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::is_word_char;
use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
///
/// Bengali vowel signs and the virama are `Extend` characters under UAX #29,
/// so conjuncts and matras stay inside their word.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bound_indices()
            .filter(|(_, word)| word.chars().any(is_word_char))
            .enumerate()
            .map(|(position, (start_offset, word))| {
                Token::with_offsets(word, position, start_offset, start_offset + word.len())
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}
