//! Async, persisted lexicon store.

use std::io::Cursor;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{BntkError, Result};
use crate::lexicon::copy::{CopyFailure, CopyFormat, CopyReader};
use crate::lexicon::database::{Database, SimilarWordsOptions};
use crate::lexicon::persist;
use crate::lexicon::schema::TableDef;
use crate::lexicon::table::{RomanizedWord, Word};
use crate::lexicon::trigram::DEFAULT_SIMILARITY_THRESHOLD;
use crate::lexicon::{ROMANIZED_WORDS_TABLE, TRIGRAM_EXTENSION, WORDS_TABLE};
use crate::storage::Storage;
use crate::storage::memory::MemoryStorage;
use crate::suggest::{Candidate, MatchOptions, TokenQuery, query};

/// Tunables of the store itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Rows per committed bulk copy batch.
    #[serde(default = "default_copy_batch_size")]
    pub copy_batch_size: usize,

    /// Threshold used by [`LexiconStore::is_similar`].
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_copy_batch_size() -> usize {
    1000
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            copy_batch_size: default_copy_batch_size(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Row counts and extension state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub words: usize,
    pub romanized_words: usize,
    pub trigram_enabled: bool,
    pub schema_ready: bool,
}

/// The lexicon store.
///
/// Readers share a [`RwLock`] over the in-memory [`Database`]; every
/// committing write holds the write lock until its changes are flushed to
/// storage, so the persisted state never runs ahead of or behind the order
/// of writes.
#[derive(Debug)]
pub struct LexiconStore {
    db: RwLock<Database>,
    storage: Arc<dyn Storage>,
    options: StoreOptions,
}

impl LexiconStore {
    /// Open the store persisted in `storage`, rebuilding in-memory indexes.
    pub async fn open(storage: Arc<dyn Storage>, options: StoreOptions) -> Result<Self> {
        let loader = Arc::clone(&storage);
        let db = tokio::task::spawn_blocking(move || persist::load(loader.as_ref()))
            .await
            .map_err(|e| BntkError::internal(format!("store load task failed: {e}")))??;

        Ok(LexiconStore {
            db: RwLock::new(db),
            storage,
            options,
        })
    }

    /// Open a fresh, non-persistent store.
    pub async fn memory() -> Result<Self> {
        Self::open(Arc::new(MemoryStorage::new_default()), StoreOptions::default()).await
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Flush whatever the last mutation dirtied. Called with the write lock held.
    ///
    /// On failure the dirty markers are restored so the next commit retries.
    async fn commit(&self, db: &mut Database) -> Result<()> {
        let dirty = db.take_dirty();
        if dirty.is_empty() {
            return Ok(());
        }

        let result = match persist::prepare(db, &dirty) {
            Ok(writes) => {
                let storage = Arc::clone(&self.storage);
                tokio::task::spawn_blocking(move || persist::flush(storage.as_ref(), &writes))
                    .await
                    .map_err(|e| BntkError::internal(format!("store flush task failed: {e}")))
                    .and_then(|flushed| flushed)
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            db.restore_dirty(dirty);
        }
        result
    }

    async fn write<R>(&self, op: impl FnOnce(&mut Database) -> Result<R>) -> Result<R> {
        let mut db = self.db.write().await;
        let result = op(&mut db);
        self.commit(&mut db).await?;
        result
    }

    /// Run a read-only closure under one read-lock acquisition.
    pub async fn read<R>(&self, op: impl FnOnce(&Database) -> R) -> R {
        let db = self.db.read().await;
        op(&db)
    }

    // ---- extensions and DDL -----------------------------------------------

    /// Enable an extension. Idempotent; only `"trigram"` is available.
    pub async fn enable_extension(&self, name: &str) -> Result<()> {
        self.write(|db| db.enable_extension(name)).await
    }

    pub async fn extension_enabled(&self, name: &str) -> bool {
        self.read(|db| db.extension_enabled(name)).await
    }

    /// Apply the canonical schema. Returns the names of created tables.
    pub async fn apply_schema(&self) -> Result<Vec<String>> {
        let created = self.write(|db| db.apply_schema()).await?;
        if !created.is_empty() {
            info!("Created tables: {}", created.join(", "));
        }
        Ok(created)
    }

    pub async fn create_table(&self, definition: TableDef) -> Result<()> {
        self.write(|db| db.create_table(definition)).await
    }

    pub async fn has_table(&self, name: &str) -> bool {
        self.read(|db| db.has_table(name)).await
    }

    pub async fn drop_table(&self, name: &str) -> Result<()> {
        self.write(|db| db.drop_table(name)).await?;
        info!("Dropped table {name}");
        Ok(())
    }

    pub async fn drop_table_if_exists(&self, name: &str) -> Result<bool> {
        let dropped = self.write(|db| db.drop_table_if_exists(name)).await?;
        if dropped {
            info!("Dropped table {name}");
        }
        Ok(dropped)
    }

    // ---- bulk copy and DML ------------------------------------------------

    /// Bulk copy a header-prefixed CSV stream into `table`.
    ///
    /// Rows are decoded outside the lock and applied in batches of
    /// `copy_batch_size`; a failing batch leaves no rows behind. Batches
    /// applied before a failure stay in place. The table is persisted once,
    /// when the copy ends.
    pub async fn copy_from(
        &self,
        table: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<usize, CopyFailure> {
        let definition = self
            .read(|db| db.catalog().table(table).cloned())
            .await
            .ok_or_else(|| CopyFailure {
                committed: 0,
                error: BntkError::schema(format!("relation \"{table}\" does not exist")),
            })?;

        let batch_size = self.options.copy_batch_size.max(1);
        let mut reader = CopyReader::new(&definition, Cursor::new(bytes), CopyFormat::default());
        let mut applied = 0;

        let outcome = loop {
            let batch = match reader.next_batch(batch_size) {
                Ok(batch) if batch.is_empty() => break Ok(()),
                Ok(batch) => batch,
                Err(error) => break Err(error),
            };

            let copied = {
                let mut db = self.db.write().await;
                db.apply_copy_batch(table, batch)
            };
            match copied {
                Ok(copied) => {
                    applied += copied;
                    debug!("Copied {applied} rows into {table}");
                }
                Err(error) => break Err(error),
            }
        };

        let mut db = self.db.write().await;
        let flushed = self.commit(&mut db).await;
        let error = match (outcome, flushed) {
            (Ok(()), Ok(())) => return Ok(applied),
            (Err(error), Ok(())) | (Ok(()), Err(error)) => error,
            (Err(error), Err(flush_error)) => {
                warn!("Flushing {table} after a failed copy also failed: {flush_error}");
                error
            }
        };
        Err(CopyFailure {
            committed: applied,
            error,
        })
    }

    /// Insert a word with a sequence-assigned id.
    pub async fn insert_word(&self, value: &str) -> Result<i32> {
        self.write(|db| db.insert_word(value)).await
    }

    /// Insert a word with an explicit id. The sequence advances past it.
    pub async fn insert_word_with_id(&self, id: i32, value: &str) -> Result<()> {
        self.write(|db| db.insert_word_with_id(id, value)).await
    }

    pub async fn insert_romanized(&self, word_id: i32, value: &str) -> Result<()> {
        self.write(|db| db.insert_romanized(word_id, value)).await
    }

    /// Delete a word; fails while its romanized form exists.
    pub async fn delete_word(&self, id: i32) -> Result<bool> {
        self.write(|db| db.delete_word(id)).await
    }

    /// Renumber a word; its romanized form follows.
    pub async fn update_word_id(&self, old_id: i32, new_id: i32) -> Result<()> {
        self.write(|db| db.update_word_id(old_id, new_id)).await
    }

    // ---- queries ----------------------------------------------------------

    pub async fn count(&self, table: &str) -> Result<usize> {
        self.read(|db| db.count(table)).await
    }

    pub async fn find_exact(&self, value: &str) -> Vec<Word> {
        self.read(|db| db.find_exact(value)).await
    }

    /// Case-insensitive existence check.
    pub async fn exists(&self, word: &str) -> bool {
        self.read(|db| db.exists(word)).await
    }

    pub async fn find_by_length(&self, min: usize, max: usize) -> Vec<Word> {
        self.read(|db| db.find_by_length(min, max)).await
    }

    pub async fn similarity(&self, a: &str, b: &str) -> Result<f64> {
        self.read(|db| db.similarity(a, b)).await
    }

    pub async fn distance(&self, a: &str, b: &str) -> Result<f64> {
        self.read(|db| db.distance(a, b)).await
    }

    /// `similarity(a, b) >= similarity_threshold`.
    pub async fn is_similar(&self, a: &str, b: &str) -> Result<bool> {
        let threshold = self.options.similarity_threshold;
        self.read(|db| db.is_similar(a, b, threshold)).await
    }

    pub async fn nearest_romanized(&self, query: &str, k: usize) -> Result<Vec<(RomanizedWord, f64)>> {
        self.read(|db| db.nearest_romanized(query, k)).await
    }

    pub async fn similar_words(&self, word: &str, options: &SimilarWordsOptions) -> Result<Vec<String>> {
        self.read(|db| db.similar_words(word, options)).await
    }

    /// Run the batched three-stage suggestion query for all `tokens`.
    pub async fn query_batch(
        &self,
        tokens: &[TokenQuery],
        options: &MatchOptions,
    ) -> Result<Vec<Candidate>> {
        self.read(|db| query::execute(db, tokens, options)).await
    }

    pub async fn stats(&self) -> StoreStats {
        self.read(|db| StoreStats {
            words: db.words().len(),
            romanized_words: db.romanized().len(),
            trigram_enabled: db.extension_enabled(TRIGRAM_EXTENSION),
            schema_ready: db.catalog().is_canonical(WORDS_TABLE)
                && db.catalog().is_canonical(ROMANIZED_WORDS_TABLE),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::persist::table_file;
    use crate::storage::file::{FileStorage, FileStorageConfig};
    use crate::storage::{StorageInput, StorageOutput, read_all};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Memory storage that records created outputs and can refuse writes.
    #[derive(Debug)]
    struct RecordingStorage {
        inner: MemoryStorage,
        refuse_writes: AtomicBool,
        created: Mutex<Vec<String>>,
    }

    impl RecordingStorage {
        fn new() -> Self {
            RecordingStorage {
                inner: MemoryStorage::new_default(),
                refuse_writes: AtomicBool::new(false),
                created: Mutex::new(Vec::new()),
            }
        }

        fn writes_of(&self, name: &str) -> usize {
            let temp_name = format!("{name}.tmp");
            self.created.lock().iter().filter(|n| **n == temp_name).count()
        }
    }

    impl Storage for RecordingStorage {
        fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
            self.inner.open_input(name)
        }

        fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
            if self.refuse_writes.load(Ordering::SeqCst) {
                return Err(BntkError::storage(format!("refusing to write {name}")));
            }
            self.created.lock().push(name.to_string());
            self.inner.create_output(name)
        }

        fn file_exists(&self, name: &str) -> bool {
            self.inner.file_exists(name)
        }

        fn delete_file(&self, name: &str) -> Result<()> {
            self.inner.delete_file(name)
        }

        fn list_files(&self) -> Result<Vec<String>> {
            self.inner.list_files()
        }

        fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
            self.inner.rename_file(old_name, new_name)
        }

        fn sync(&self) -> Result<()> {
            self.inner.sync()
        }
    }

    async fn ready_store() -> LexiconStore {
        let store = LexiconStore::memory().await.unwrap();
        store.enable_extension(TRIGRAM_EXTENSION).await.unwrap();
        store.apply_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_copy_commits_batches() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new_default());
        let options = StoreOptions {
            copy_batch_size: 2,
            ..StoreOptions::default()
        };
        let store = LexiconStore::open(storage, options).await.unwrap();
        store.apply_schema().await.unwrap();

        let input = b"id,value\n1,a\n2,b\n3,c\nbad,d\n5,e\n".to_vec();
        let failure = store.copy_from(WORDS_TABLE, input).await.unwrap_err();
        assert_eq!(failure.committed, 2);
        assert!(matches!(failure.error, BntkError::Copy(_)));
        assert_eq!(store.count(WORDS_TABLE).await.unwrap(), 2);

        let loaded = store
            .copy_from(ROMANIZED_WORDS_TABLE, b"word_id,value\n1,a\n2,b\n".to_vec())
            .await
            .unwrap();
        assert_eq!(loaded, 2);
    }

    #[tokio::test]
    async fn test_copy_into_missing_table() {
        let store = LexiconStore::memory().await.unwrap();
        let failure = store
            .copy_from(WORDS_TABLE, b"id,value\n1,a\n".to_vec())
            .await
            .unwrap_err();
        assert_eq!(failure.committed, 0);
        assert!(matches!(failure.error, BntkError::Schema(_)));
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let store = ready_store().await;
        assert!(store.apply_schema().await.unwrap().is_empty());
        assert!(store.stats().await.schema_ready);
    }

    #[tokio::test]
    async fn test_similarity_requires_extension() {
        let store = LexiconStore::memory().await.unwrap();
        assert!(matches!(
            store.similarity("ami", "amar").await,
            Err(BntkError::ExtensionUnavailable(_))
        ));

        store.enable_extension(TRIGRAM_EXTENSION).await.unwrap();
        assert!(store.is_similar("tomar", "tomr").await.unwrap());
        assert!(!store.is_similar("tomar", "amar").await.unwrap());
        assert_eq!(store.distance("ami", "ami").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_referential_actions() {
        let store = ready_store().await;
        let id = store.insert_word("আমি").await.unwrap();
        store.insert_romanized(id, "ami").await.unwrap();

        assert!(store.delete_word(id).await.is_err());
        store.update_word_id(id, 42).await.unwrap();

        let hits = store.nearest_romanized("ami", 5).await.unwrap();
        assert_eq!(hits[0].0.word_id, 42);
        assert!(store.exists("আমি").await);
        assert_eq!(store.find_exact("আমি").await[0].id, 42);
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let temp_dir = TempDir::new().unwrap();
        let config = FileStorageConfig::new(temp_dir.path());

        {
            let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.clone()).unwrap());
            let store = LexiconStore::open(storage, StoreOptions::default()).await.unwrap();
            store.enable_extension(TRIGRAM_EXTENSION).await.unwrap();
            store.apply_schema().await.unwrap();
            store
                .copy_from(WORDS_TABLE, "id,value\n1,আমি\n2,আমার\n".as_bytes().to_vec())
                .await
                .unwrap();
            store
                .copy_from(ROMANIZED_WORDS_TABLE, b"word_id,value\n1,ami\n2,amar\n".to_vec())
                .await
                .unwrap();
        }

        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config).unwrap());
        let store = LexiconStore::open(storage, StoreOptions::default()).await.unwrap();
        let stats = store.stats().await;
        assert_eq!(stats.words, 2);
        assert_eq!(stats.romanized_words, 2);
        assert!(stats.trigram_enabled);
        assert_eq!(store.insert_word("তোমার").await.unwrap(), 3);
        assert_eq!(store.nearest_romanized("amar", 1).await.unwrap()[0].0.word_id, 2);
    }

    #[tokio::test]
    async fn test_failed_flush_is_retried() {
        let storage = Arc::new(RecordingStorage::new());
        let store = LexiconStore::open(storage.clone(), StoreOptions::default())
            .await
            .unwrap();
        store.apply_schema().await.unwrap();

        storage.refuse_writes.store(true, Ordering::SeqCst);
        assert!(store.insert_word("আমি").await.is_err());
        // The row stays visible in memory but has not reached storage.
        assert_eq!(store.count(WORDS_TABLE).await.unwrap(), 1);

        storage.refuse_writes.store(false, Ordering::SeqCst);
        store.enable_extension(TRIGRAM_EXTENSION).await.unwrap();

        let reopened = LexiconStore::open(storage.clone(), StoreOptions::default())
            .await
            .unwrap();
        assert!(reopened.exists("আমি").await);
        assert!(reopened.stats().await.trigram_enabled);
    }

    #[tokio::test]
    async fn test_copy_persists_table_once() {
        let storage = Arc::new(RecordingStorage::new());
        let options = StoreOptions {
            copy_batch_size: 2,
            ..StoreOptions::default()
        };
        let store = LexiconStore::open(storage.clone(), options).await.unwrap();
        store.apply_schema().await.unwrap();
        let before = storage.writes_of(&table_file(WORDS_TABLE));

        let input = b"id,value\n1,a\n2,b\n3,c\n4,d\n5,e\n".to_vec();
        assert_eq!(store.copy_from(WORDS_TABLE, input).await.unwrap(), 5);
        assert_eq!(storage.writes_of(&table_file(WORDS_TABLE)), before + 1);

        // A failed copy still persists the batches applied before the failure.
        let input = b"id,value\n6,f\n7,g\nbad,h\n".to_vec();
        let failure = store.copy_from(WORDS_TABLE, input).await.unwrap_err();
        assert_eq!(failure.committed, 2);
        assert_eq!(storage.writes_of(&table_file(WORDS_TABLE)), before + 2);

        let reopened = LexiconStore::open(storage.clone(), StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(reopened.count(WORDS_TABLE).await.unwrap(), 7);
        assert!(!read_all(storage.as_ref(), &table_file(WORDS_TABLE)).unwrap().is_empty());
    }
}
