//! Suggestion engine: tokenization, romanization, batched query, ranking.

use std::sync::Arc;

use ahash::AHashSet;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::analysis::tokenizer::{Tokenizer, TokenizerKind};
use crate::analysis::transliterator::{PassthroughTransliterator, RenderMode, Transliterator};
use crate::error::Result;
use crate::lexicon::{LexiconStore, SimilarWordsOptions};
use crate::suggest::candidate::Candidate;
use crate::suggest::check::{self, Misspelling};
use crate::suggest::query::{MatchOptions, TokenQuery};

/// Configuration for the suggestion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// Maximum candidates returned per distinct token.
    #[serde(default = "default_max_per_token")]
    pub max_per_token: usize,

    /// Neighbours fetched from the trigram index per token.
    #[serde(default = "default_nearest_neighbors")]
    pub nearest_neighbors: usize,

    /// Trigram candidates must score strictly above this.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    /// Romanization mode applied to input tokens.
    #[serde(default)]
    pub render_mode: RenderMode,

    /// Tokenizer used to split input text.
    #[serde(default)]
    pub tokenizer: TokenizerKind,
}

fn default_max_per_token() -> usize {
    5
}

fn default_nearest_neighbors() -> usize {
    15
}

fn default_min_similarity() -> f64 {
    0.3
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        SuggestionConfig {
            max_per_token: default_max_per_token(),
            nearest_neighbors: default_nearest_neighbors(),
            min_similarity: default_min_similarity(),
            render_mode: RenderMode::default(),
            tokenizer: TokenizerKind::default(),
        }
    }
}

impl SuggestionConfig {
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            max_per_token: self.max_per_token,
            nearest_neighbors: self.nearest_neighbors,
            min_similarity: self.min_similarity,
        }
    }
}

/// Turns free text into ranked suggestions against a [`LexiconStore`].
pub struct SuggestionEngine {
    store: Arc<LexiconStore>,
    tokenizer: Box<dyn Tokenizer>,
    transliterator: Arc<dyn Transliterator>,
    config: SuggestionConfig,
}

impl std::fmt::Debug for SuggestionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionEngine")
            .field("tokenizer", &self.tokenizer.name())
            .field("transliterator", &self.transliterator.name())
            .field("config", &self.config)
            .finish()
    }
}

impl SuggestionEngine {
    /// Create an engine with the configured tokenizer and a passthrough
    /// transliterator.
    pub fn new(store: Arc<LexiconStore>, config: SuggestionConfig) -> Self {
        SuggestionEngine {
            store,
            tokenizer: config.tokenizer.build(),
            transliterator: Arc::new(PassthroughTransliterator::new()),
            config,
        }
    }

    pub fn with_transliterator(mut self, transliterator: Arc<dyn Transliterator>) -> Self {
        self.transliterator = transliterator;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<LexiconStore> {
        &self.store
    }

    /// Distinct tokens of `text` in first-occurrence order.
    pub fn distinct_tokens(&self, text: &str) -> Result<Vec<Token>> {
        let mut seen = AHashSet::new();
        Ok(self
            .tokenizer
            .tokenize(text)?
            .filter(|token| !token.is_empty() && seen.insert(token.text.clone()))
            .collect())
    }

    fn token_queries(&self, tokens: &[Token]) -> Result<Vec<TokenQuery>> {
        tokens
            .iter()
            .map(|token| {
                let romanized = self
                    .transliterator
                    .transliterate(&token.text, self.config.render_mode)?;
                Ok(TokenQuery::new(token.text.clone(), romanized))
            })
            .collect()
    }

    async fn run(&self, tokens: &[Token]) -> Result<Vec<Candidate>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let queries = self.token_queries(tokens)?;
        debug!("Suggesting for {} distinct tokens", queries.len());
        self.store
            .query_batch(&queries, &self.config.match_options())
            .await
    }

    /// Ranked suggestions for every distinct token of `text`, grouped by
    /// token in first-occurrence order.
    ///
    /// Failures are logged and yield an empty result.
    pub async fn suggest(&self, text: &str) -> Vec<Candidate> {
        let result = match self.distinct_tokens(text) {
            Ok(tokens) => self.run(&tokens).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            error!("Suggestion query failed: {e}");
            Vec::new()
        })
    }

    /// Per-word spelling report for `text`.
    pub async fn check(&self, text: &str) -> Vec<Misspelling> {
        let tokens = match self.distinct_tokens(text) {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Spell check failed: {e}");
                return Vec::new();
            }
        };
        match self.run(&tokens).await {
            Ok(candidates) => check::group(&candidates, &tokens),
            Err(e) => {
                error!("Spell check failed: {e}");
                Vec::new()
            }
        }
    }

    /// Case-insensitive existence check.
    pub async fn exists(&self, word: &str) -> bool {
        self.store.exists(word).await
    }

    /// Words of similar length and spelling to `word`.
    pub async fn similar(&self, word: &str) -> Vec<String> {
        let options = SimilarWordsOptions {
            min_similarity: self.config.min_similarity,
            limit: self.config.max_per_token,
            ..SimilarWordsOptions::default()
        };
        self.store
            .similar_words(word, &options)
            .await
            .unwrap_or_else(|e| {
                error!("Similar-words lookup failed: {e}");
                Vec::new()
            })
    }
}
