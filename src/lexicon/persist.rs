//! Loading and flushing the database through a [`Storage`] backend.
//!
//! The catalog is stored as JSON in `catalog.json`; each canonical table is a
//! bincode snapshot named `<table>.tbl`.

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::error::{BntkError, Result};
use crate::lexicon::database::{Database, Dirty};
use crate::lexicon::schema::{CATALOG_FORMAT_VERSION, Catalog};
use crate::lexicon::{ROMANIZED_WORDS_TABLE, WORDS_TABLE};
use crate::storage::{Storage, read_all, write_atomic};

/// Name of the catalog file.
pub const CATALOG_FILE: &str = "catalog.json";

/// File holding the rows of `table`.
pub fn table_file(table: &str) -> String {
    format!("{table}.tbl")
}

/// One pending storage operation.
#[derive(Debug)]
pub enum PendingWrite {
    Put { name: String, bytes: Vec<u8> },
    Delete { name: String },
}

impl PendingWrite {
    fn apply(&self, storage: &dyn Storage) -> Result<()> {
        match self {
            PendingWrite::Put { name, bytes } => write_atomic(storage, name, bytes),
            PendingWrite::Delete { name } => storage.delete_file(name),
        }
    }
}

fn decode_table<T: DeserializeOwned>(storage: &dyn Storage, table: &str) -> Result<Option<T>> {
    let name = table_file(table);
    if !storage.file_exists(&name) {
        return Ok(None);
    }
    let bytes = read_all(storage, &name)?;
    let snapshot = bincode::deserialize(&bytes)
        .map_err(|e| BntkError::serialization(format!("{name}: {e}")))?;
    Ok(Some(snapshot))
}

fn decode(storage: &dyn Storage) -> Result<Database> {
    if !storage.file_exists(CATALOG_FILE) {
        return Ok(Database::new());
    }

    let bytes = read_all(storage, CATALOG_FILE)?;
    let catalog: Catalog = serde_json::from_slice(&bytes)?;
    if catalog.format_version != CATALOG_FORMAT_VERSION {
        return Err(BntkError::serialization(format!(
            "unsupported catalog format version {}",
            catalog.format_version
        )));
    }

    let words = if catalog.is_canonical(WORDS_TABLE) {
        decode_table(storage, WORDS_TABLE)?
    } else {
        None
    };
    let romanized = if catalog.is_canonical(ROMANIZED_WORDS_TABLE) {
        decode_table(storage, ROMANIZED_WORDS_TABLE)?
    } else {
        None
    };

    Ok(Database::from_parts(catalog, words, romanized))
}

/// Load the database persisted in `storage`.
///
/// Decoding failures do not fail the load: the database comes back marked
/// unreadable so schema application reports a conflict and the recovery path
/// can drop and recreate the tables. Storage I/O failures are returned.
pub fn load(storage: &dyn Storage) -> Result<Database> {
    match decode(storage) {
        Ok(db) => {
            debug!(
                "Loaded lexicon: {} words, {} romanized words",
                db.words().len(),
                db.romanized().len()
            );
            Ok(db)
        }
        Err(e @ (BntkError::Io(_) | BntkError::Storage(_))) => Err(e),
        Err(e) => {
            warn!("Persisted lexicon could not be decoded: {e}");
            Ok(Database::unreadable(e.to_string()))
        }
    }
}

/// Serialize the artifacts named in `dirty`.
pub fn prepare(db: &Database, dirty: &BTreeSet<Dirty>) -> Result<Vec<PendingWrite>> {
    let mut writes = Vec::new();

    for item in dirty {
        if let Dirty::Dropped(table) = item
            && !dirty.contains(&Dirty::Table(table.clone()))
        {
            writes.push(PendingWrite::Delete {
                name: table_file(table),
            });
        }
    }

    for item in dirty {
        match item {
            Dirty::Catalog => writes.push(PendingWrite::Put {
                name: CATALOG_FILE.to_string(),
                bytes: serde_json::to_vec_pretty(db.catalog())?,
            }),
            Dirty::Table(table) if table == WORDS_TABLE => writes.push(PendingWrite::Put {
                name: table_file(table),
                bytes: bincode::serialize(&db.words().snapshot())?,
            }),
            Dirty::Table(table) if table == ROMANIZED_WORDS_TABLE => writes.push(PendingWrite::Put {
                name: table_file(table),
                bytes: bincode::serialize(&db.romanized().snapshot())?,
            }),
            Dirty::Table(_) | Dirty::Dropped(_) => {}
        }
    }

    Ok(writes)
}

/// Apply prepared writes in order.
pub fn flush(storage: &dyn Storage, writes: &[PendingWrite]) -> Result<()> {
    for write in writes {
        write.apply(storage)?;
    }
    storage.sync()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::TRIGRAM_EXTENSION;
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_roundtrip_through_storage() {
        let storage = MemoryStorage::new_default();

        let mut db = Database::new();
        db.enable_extension(TRIGRAM_EXTENSION).unwrap();
        db.apply_schema().unwrap();
        db.insert_word_with_id(7, "আমি").unwrap();
        db.insert_romanized(7, "ami").unwrap();

        let dirty = db.take_dirty();
        flush(&storage, &prepare(&db, &dirty).unwrap()).unwrap();
        assert!(storage.file_exists(CATALOG_FILE));
        assert!(storage.file_exists("words.tbl"));

        let loaded = load(&storage).unwrap();
        assert!(loaded.extension_enabled(TRIGRAM_EXTENSION));
        assert_eq!(loaded.words().get(7), Some("আমি"));
        assert_eq!(loaded.find_romanized_exact("AMI").len(), 1);
    }

    #[test]
    fn test_empty_storage_loads_empty_database() {
        let storage = MemoryStorage::new_default();
        let db = load(&storage).unwrap();
        assert!(db.catalog().tables.is_empty());
    }

    #[test]
    fn test_garbage_catalog_is_unreadable() {
        let storage = MemoryStorage::new_default();
        write_atomic(&storage, CATALOG_FILE, b"not json").unwrap();

        let mut db = load(&storage).unwrap();
        assert!(db.apply_schema().unwrap_err().is_schema_conflict());
    }

    #[test]
    fn test_dropped_table_file_is_deleted() {
        let storage = MemoryStorage::new_default();
        let mut db = Database::new();
        db.apply_schema().unwrap();
        let dirty = db.take_dirty();
        flush(&storage, &prepare(&db, &dirty).unwrap()).unwrap();
        assert!(storage.file_exists("romanized_words.tbl"));

        db.drop_table(ROMANIZED_WORDS_TABLE).unwrap();
        let dirty = db.take_dirty();
        flush(&storage, &prepare(&db, &dirty).unwrap()).unwrap();
        assert!(!storage.file_exists("romanized_words.tbl"));
        assert!(storage.file_exists("words.tbl"));
    }
}
