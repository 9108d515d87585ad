//! Text analysis adapters for bntk.
//!
//! The suggestion engine consumes text through two contracts:
//!
//! - [`tokenizer::Tokenizer`] splits free text into an ordered sequence of
//!   non-empty word tokens.
//! - [`transliterator::Transliterator`] renders a token in Latin script under
//!   a named [`transliterator::RenderMode`].
//!
//! Both are pure functions of their input. The implementations shipped here
//! are reference adapters: a UAX #29 word segmenter, a whitespace splitter, and
//! table-driven / passthrough transliterators. A full Bangla romanization
//! algorithm is an external collaborator.

pub mod token;
pub mod tokenizer;
pub mod transliterator;

/// Whether `c` belongs to the Bengali Unicode block (U+0980..=U+09FF).
pub fn is_bengali(c: char) -> bool {
    matches!(c, '\u{0980}'..='\u{09FF}')
}

/// Whether `c` is part of a word: alphanumerics plus every Bengali code point,
/// so vowel signs and the virama stay attached to their consonants.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_bengali(c)
}
