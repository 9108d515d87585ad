//! The bootstrap pipeline: extension, schema with bounded recovery, and
//! idempotent seeding.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::bootstrap::corpus::{CorpusConfig, CorpusSource};
use crate::bootstrap::progress::{BootstrapProgress, ProgressSink, emit};
use crate::error::{BntkError, Result};
use crate::lexicon::{LexiconStore, ROMANIZED_WORDS_TABLE, TRIGRAM_EXTENSION, WORDS_TABLE};

/// Bootstrap tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// How many drop-and-recreate recoveries a schema conflict may trigger.
    #[serde(default = "default_schema_retries")]
    pub schema_retries: usize,

    /// Rows per committed bulk copy batch, applied to the store it is
    /// opened with.
    #[serde(default = "default_copy_batch_size")]
    pub copy_batch_size: usize,
}

fn default_schema_retries() -> usize {
    1
}

fn default_copy_batch_size() -> usize {
    1000
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            schema_retries: default_schema_retries(),
            copy_batch_size: default_copy_batch_size(),
        }
    }
}

/// What bootstrap did with one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    /// The table already had rows; nothing was loaded.
    AlreadySeeded { rows: usize },
    /// The corpus was loaded in full.
    Loaded { rows: usize },
    /// The corpus could not be fetched; the table stays empty.
    FetchFailed { reason: String },
    /// The copy stopped part-way; `committed` rows remain.
    LoadFailed { committed: usize, reason: String },
}

impl TableOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TableOutcome::FetchFailed { .. } | TableOutcome::LoadFailed { .. }
        )
    }
}

/// Summary of one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    /// Drop-and-recreate recoveries performed.
    pub schema_recoveries: usize,
    pub words: TableOutcome,
    pub romanized_words: TableOutcome,
}

impl BootstrapReport {
    /// Whether any table failed to seed.
    pub fn is_degraded(&self) -> bool {
        self.words.is_failure() || self.romanized_words.is_failure()
    }
}

/// Runs bootstrap against a store.
pub struct Bootstrapper<'a> {
    store: &'a LexiconStore,
    source: &'a dyn CorpusSource,
    corpus: CorpusConfig,
    config: BootstrapConfig,
    progress: Option<ProgressSink>,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(store: &'a LexiconStore, source: &'a dyn CorpusSource) -> Self {
        Bootstrapper {
            store,
            source,
            corpus: CorpusConfig::default(),
            config: BootstrapConfig::default(),
            progress: None,
        }
    }

    pub fn with_corpus(mut self, corpus: CorpusConfig) -> Self {
        self.corpus = corpus;
        self
    }

    pub fn with_config(mut self, config: BootstrapConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress(mut self, progress: Option<ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Apply the schema, dropping both tables and retrying on conflict up to
    /// `schema_retries` times. Returns the number of recoveries.
    async fn apply_schema(&self) -> Result<usize> {
        let mut recoveries = 0;
        loop {
            match self.store.apply_schema().await {
                Ok(_) => return Ok(recoveries),
                Err(e) if e.is_schema_conflict() && recoveries < self.config.schema_retries => {
                    warn!("{e}; dropping lexicon tables and retrying");
                    self.store.drop_table_if_exists(ROMANIZED_WORDS_TABLE).await?;
                    self.store.drop_table_if_exists(WORDS_TABLE).await?;
                    recoveries += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn seed(&self, table: &str, file: &str, existing: usize) -> TableOutcome {
        if existing > 0 {
            info!("{table} already holds {existing} rows; skipping seed");
            return TableOutcome::AlreadySeeded { rows: existing };
        }

        let location = self.source.locate(file);
        let bytes = match self.source.fetch(file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not fetch {location}: {e}; {table} stays empty");
                return TableOutcome::FetchFailed {
                    reason: e.to_string(),
                };
            }
        };
        emit(
            self.progress.as_ref(),
            BootstrapProgress::Fetched {
                table: table.to_string(),
                bytes: bytes.len(),
            },
        );

        match self.store.copy_from(table, bytes).await {
            Ok(rows) => {
                info!("Seeded {table} with {rows} rows from {location}");
                emit(
                    self.progress.as_ref(),
                    BootstrapProgress::Loaded {
                        table: table.to_string(),
                        rows,
                    },
                );
                TableOutcome::Loaded { rows }
            }
            Err(failure) => {
                if failure.committed > 0 {
                    warn!(
                        "Seeding {table} failed after {} committed rows; the table is partially seeded and will not be reloaded: {}",
                        failure.committed, failure.error
                    );
                } else {
                    warn!("Seeding {table} failed: {}", failure.error);
                }
                TableOutcome::LoadFailed {
                    committed: failure.committed,
                    reason: failure.error.to_string(),
                }
            }
        }
    }

    /// Run the pipeline.
    ///
    /// Extension and schema failures are fatal. Fetch and load failures are
    /// recorded per table in the report.
    pub async fn run(&self) -> Result<BootstrapReport> {
        self.store.enable_extension(TRIGRAM_EXTENSION).await?;
        let schema_recoveries = self.apply_schema().await?;
        if !self.store.extension_enabled(TRIGRAM_EXTENSION).await {
            return Err(BntkError::extension_unavailable(format!(
                "extension \"{TRIGRAM_EXTENSION}\" is not enabled after schema setup"
            )));
        }

        let words_count = self.store.count(WORDS_TABLE).await?;
        let romanized_count = self.store.count(ROMANIZED_WORDS_TABLE).await?;
        emit(
            self.progress.as_ref(),
            BootstrapProgress::Checked {
                words: words_count,
                romanized_words: romanized_count,
            },
        );

        let words = self
            .seed(WORDS_TABLE, &self.corpus.words_file, words_count)
            .await;
        let romanized_words = self
            .seed(
                ROMANIZED_WORDS_TABLE,
                &self.corpus.romanized_words_file,
                romanized_count,
            )
            .await;

        emit(self.progress.as_ref(), BootstrapProgress::Completed);

        let report = BootstrapReport {
            schema_recoveries,
            words,
            romanized_words,
        };
        if report.is_degraded() {
            warn!("Bootstrap completed in degraded mode");
        } else {
            info!("Bootstrap completed");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::corpus::MemoryCorpusSource;
    use crate::lexicon::{ColumnDef, ColumnType, TableDef};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn corpus() -> MemoryCorpusSource {
        MemoryCorpusSource::new()
            .with_file("words.csv", "id,value\n1,আমি\n2,আমার\n3,তোমার\n")
            .with_file("romanized_words.csv", "word_id,value\n1,ami\n2,amar\n")
    }

    #[tokio::test]
    async fn test_seeds_empty_store_once() {
        let store = LexiconStore::memory().await.unwrap();
        let source = corpus();

        let report = Bootstrapper::new(&store, &source).run().await.unwrap();
        assert_eq!(report.words, TableOutcome::Loaded { rows: 3 });
        assert_eq!(report.romanized_words, TableOutcome::Loaded { rows: 2 });
        assert_eq!(report.schema_recoveries, 0);
        assert!(!report.is_degraded());

        let report = Bootstrapper::new(&store, &source).run().await.unwrap();
        assert_eq!(report.words, TableOutcome::AlreadySeeded { rows: 3 });
        assert_eq!(report.romanized_words, TableOutcome::AlreadySeeded { rows: 2 });
        assert_eq!(store.count(WORDS_TABLE).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_progress_order() {
        let store = LexiconStore::memory().await.unwrap();
        let source = corpus();
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&events);
        let sink: ProgressSink =
            Arc::new(move |event: &BootstrapProgress| recorder.lock().push(event.clone()));

        Bootstrapper::new(&store, &source)
            .with_progress(Some(sink))
            .run()
            .await
            .unwrap();

        let steps: Vec<u8> = events.lock().iter().map(|e| e.ordinal()).collect();
        assert_eq!(steps, vec![0, 1, 2, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_degraded() {
        let store = LexiconStore::memory().await.unwrap();
        let source = MemoryCorpusSource::new().with_file("words.csv", "id,value\n1,আমি\n");

        let report = Bootstrapper::new(&store, &source).run().await.unwrap();
        assert_eq!(report.words, TableOutcome::Loaded { rows: 1 });
        assert!(matches!(report.romanized_words, TableOutcome::FetchFailed { .. }));
        assert!(report.is_degraded());
    }

    #[tokio::test]
    async fn test_partial_load_is_reported() {
        let store = LexiconStore::open(
            Arc::new(crate::storage::memory::MemoryStorage::new_default()),
            crate::lexicon::StoreOptions {
                copy_batch_size: 1,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let source = MemoryCorpusSource::new()
            .with_file("words.csv", "id,value\n1,আমি\n1,আবার\n")
            .with_file("romanized_words.csv", "word_id,value\n1,ami\n");

        let report = Bootstrapper::new(&store, &source).run().await.unwrap();
        assert!(matches!(
            report.words,
            TableOutcome::LoadFailed { committed: 1, .. }
        ));
        assert!(report.is_degraded());
        assert_eq!(report.romanized_words, TableOutcome::Loaded { rows: 1 });
    }

    #[tokio::test]
    async fn test_schema_conflict_recovers_once() {
        let store = LexiconStore::memory().await.unwrap();
        store
            .create_table(
                TableDef::new(
                    WORDS_TABLE,
                    vec![
                        ColumnDef::required("id", ColumnType::Int4),
                        ColumnDef::required("word", ColumnType::Text),
                    ],
                )
                .with_primary_key(&["id"]),
            )
            .await
            .unwrap();

        let report = Bootstrapper::new(&store, &corpus()).run().await.unwrap();
        assert_eq!(report.schema_recoveries, 1);
        assert_eq!(report.words, TableOutcome::Loaded { rows: 3 });
        assert!(store.stats().await.schema_ready);
    }

    #[tokio::test]
    async fn test_unreadable_catalog_keeps_trigram() {
        let storage = Arc::new(crate::storage::memory::MemoryStorage::new_default());
        let catalog = crate::lexicon::persist::CATALOG_FILE;
        crate::storage::write_atomic(storage.as_ref(), catalog, b"{ not a catalog").unwrap();
        let store = LexiconStore::open(storage, Default::default()).await.unwrap();

        let report = Bootstrapper::new(&store, &corpus()).run().await.unwrap();
        assert_eq!(report.schema_recoveries, 1);
        assert!(store.extension_enabled(TRIGRAM_EXTENSION).await);
        let hits = store.nearest_romanized("amr", 1).await.unwrap();
        assert_eq!(hits[0].0.value, "amar");
    }

    #[tokio::test]
    async fn test_schema_conflict_exhausts_retries() {
        let store = LexiconStore::memory().await.unwrap();
        store
            .create_table(TableDef::new(
                WORDS_TABLE,
                vec![ColumnDef::required("id", ColumnType::Int4)],
            ))
            .await
            .unwrap();

        let config = BootstrapConfig {
            schema_retries: 0,
            ..BootstrapConfig::default()
        };
        let err = Bootstrapper::new(&store, &corpus())
            .with_config(config)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, BntkError::SchemaConflict(_)));
    }
}
