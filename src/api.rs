//! Consumer API.
//!
//! [`Lexicon`] bundles an opened store, its suggestion engine and the corpus
//! source used to seed it. [`LexiconSession`] initializes one lexicon lazily
//! and shares it with every caller of the process.
//!
//! ```
//! use bntk::api::Lexicon;
//! use bntk::bootstrap::MemoryCorpusSource;
//! use bntk::config::BntkConfig;
//! use std::sync::Arc;
//!
//! tokio_test::block_on(async {
//!     let source = MemoryCorpusSource::new()
//!         .with_file("words.csv", "id,value\n1,তোমার\n")
//!         .with_file("romanized_words.csv", "word_id,value\n1,tomar\n");
//!     let lexicon = Lexicon::open(BntkConfig::default())
//!         .await
//!         .unwrap()
//!         .with_corpus_source(Arc::new(source));
//!     lexicon.bootstrap(None).await.unwrap();
//!
//!     let suggestions = lexicon.suggest("tomar").await;
//!     assert_eq!(suggestions[0].suggestion, "তোমার");
//! });
//! ```

use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::bootstrap::{BootstrapReport, Bootstrapper, CorpusSource, ProgressSink};
use crate::config::BntkConfig;
use crate::error::Result;
use crate::lexicon::LexiconStore;
use crate::storage::StorageFactory;
use crate::suggest::{Candidate, Misspelling, SuggestionEngine};

pub use crate::lexicon::StoreStats as LexiconStats;

/// An opened lexicon.
pub struct Lexicon {
    store: Arc<LexiconStore>,
    engine: SuggestionEngine,
    source: Arc<dyn CorpusSource>,
    config: BntkConfig,
    bootstrap_lock: tokio::sync::Mutex<()>,
    last_report: Mutex<Option<BootstrapReport>>,
}

impl std::fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexicon")
            .field("engine", &self.engine)
            .field("source", &self.source)
            .finish()
    }
}

impl Lexicon {
    /// Open the configured storage and build the engine. Does not bootstrap.
    pub async fn open(config: BntkConfig) -> Result<Self> {
        config.validate()?;

        let storage = StorageFactory::create(config.storage.clone())?;
        let store = Arc::new(LexiconStore::open(storage, config.store_options()).await?);

        let mut engine = SuggestionEngine::new(Arc::clone(&store), config.suggestion.clone());
        if let Some(transliterator) = config.transliteration.load()? {
            engine = engine.with_transliterator(Arc::new(transliterator));
        }

        Ok(Lexicon {
            store,
            engine,
            source: Arc::new(config.corpus.file_source()),
            config,
            bootstrap_lock: tokio::sync::Mutex::new(()),
            last_report: Mutex::new(None),
        })
    }

    /// Replace the corpus source (defaults to the configured directory).
    pub fn with_corpus_source(mut self, source: Arc<dyn CorpusSource>) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &BntkConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<LexiconStore> {
        &self.store
    }

    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    /// Enable the extension, apply the schema and seed empty tables.
    ///
    /// Concurrent calls on the same lexicon are serialized.
    pub async fn bootstrap(&self, progress: Option<ProgressSink>) -> Result<BootstrapReport> {
        let _guard = self.bootstrap_lock.lock().await;
        let report = Bootstrapper::new(&self.store, self.source.as_ref())
            .with_corpus(self.config.corpus.clone())
            .with_config(self.config.bootstrap.clone())
            .with_progress(progress)
            .run()
            .await?;
        *self.last_report.lock() = Some(report.clone());
        Ok(report)
    }

    /// Report of the most recent successful bootstrap.
    pub fn last_bootstrap(&self) -> Option<BootstrapReport> {
        self.last_report.lock().clone()
    }

    pub async fn exists(&self, word: &str) -> bool {
        self.engine.exists(word).await
    }

    pub async fn suggest(&self, text: &str) -> Vec<Candidate> {
        self.engine.suggest(text).await
    }

    pub async fn similar(&self, word: &str) -> Vec<String> {
        self.engine.similar(word).await
    }

    pub async fn check(&self, text: &str) -> Vec<Misspelling> {
        self.engine.check(text).await
    }

    pub async fn stats(&self) -> LexiconStats {
        self.store.stats().await
    }
}

/// Process-wide lazily bootstrapped lexicon.
///
/// The first [`get_or_init`](LexiconSession::get_or_init) opens and
/// bootstraps the lexicon; concurrent callers wait for it and all receive
/// the same instance. A fatal bootstrap error leaves the session empty so a
/// later call can retry.
pub struct LexiconSession {
    config: BntkConfig,
    source: Option<Arc<dyn CorpusSource>>,
    lexicon: OnceCell<Arc<Lexicon>>,
}

impl LexiconSession {
    pub fn new(config: BntkConfig) -> Self {
        LexiconSession {
            config,
            source: None,
            lexicon: OnceCell::new(),
        }
    }

    pub fn with_corpus_source(mut self, source: Arc<dyn CorpusSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// The shared lexicon, initializing it on first use.
    pub async fn get_or_init(&self, progress: Option<ProgressSink>) -> Result<Arc<Lexicon>> {
        self.lexicon
            .get_or_try_init(|| async {
                let mut lexicon = Lexicon::open(self.config.clone()).await?;
                if let Some(source) = &self.source {
                    lexicon = lexicon.with_corpus_source(Arc::clone(source));
                }
                let report = lexicon.bootstrap(progress).await?;
                info!(
                    "Lexicon session ready ({} schema recoveries)",
                    report.schema_recoveries
                );
                Ok(Arc::new(lexicon))
            })
            .await
            .cloned()
    }

    /// The shared lexicon if it has been initialized.
    pub fn get(&self) -> Option<Arc<Lexicon>> {
        self.lexicon.get().cloned()
    }
}
