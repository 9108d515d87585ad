//! Tokenizer implementations for text analysis.
//!
//! # Available Tokenizers
//!
//! - [`unicode_word::UnicodeWordTokenizer`] - Uses Unicode word boundaries (default)
//! - [`whitespace::WhitespaceTokenizer`] - Splits on whitespace, trims punctuation
//!
//! # Examples
//!
//! ```
//! use bntk::analysis::tokenizer::Tokenizer;
//! use bntk::analysis::tokenizer::whitespace::WhitespaceTokenizer;
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("ami tomar").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenStream;
use crate::error::Result;

pub mod unicode_word;
pub mod whitespace;

pub use unicode_word::UnicodeWordTokenizer;
pub use whitespace::WhitespaceTokenizer;

/// Trait for tokenizers that convert text into tokens.
///
/// Implementations must be pure and must only yield non-empty tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Tokenizer selection for configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    #[default]
    UnicodeWord,
    Whitespace,
}

impl TokenizerKind {
    /// Build the configured tokenizer.
    pub fn build(self) -> Box<dyn Tokenizer> {
        match self {
            TokenizerKind::UnicodeWord => Box::new(UnicodeWordTokenizer::new()),
            TokenizerKind::Whitespace => Box::new(WhitespaceTokenizer::new()),
        }
    }
}
