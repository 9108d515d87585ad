//! Storage abstraction layer for bntk.
//!
//! The lexicon store persists its catalog and table snapshots through the
//! [`Storage`] trait so the same store code runs against a directory on disk or
//! a purely in-memory backend (tests, ephemeral sessions).
//!
//! # Storage Types
//!
//! ## FileStorage
//! - Disk-based persistent storage rooted at a directory
//! - Atomic replacement through write-to-temp + rename
//!
//! ## MemoryStorage
//! - In-memory storage for testing and temporary lexicons
//! - Fast but non-persistent
//!
//! # Example
//!
//! ```
//! use bntk::storage::{StorageConfig, StorageFactory};
//! use bntk::storage::memory::MemoryStorageConfig;
//!
//! # fn main() -> bntk::error::Result<()> {
//! let storage = StorageFactory::create(StorageConfig::Memory(MemoryStorageConfig::default()))?;
//! assert!(!storage.file_exists("catalog.json"));
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BntkError, Result};

pub mod file;
pub mod memory;

/// A trait for storage backends that can store and retrieve named blobs.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a file for reading. The file must exist.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all files in the storage, sorted by name.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Rename a file, replacing any existing file with the new name.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Make completed writes and renames durable.
    fn sync(&self) -> Result<()>;
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Get the size of the input stream.
    fn size(&self) -> Result<u64>;
}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush and sync the output to storage.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Close the output stream, making the written bytes visible.
    fn close(&mut self) -> Result<()>;
}

/// Read a whole file into memory.
pub fn read_all(storage: &dyn Storage, name: &str) -> Result<Vec<u8>> {
    let mut input = storage.open_input(name)?;
    let mut buffer = Vec::with_capacity(input.size()? as usize);
    input.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Replace a file atomically: the bytes are written to `<name>.tmp` and then
/// renamed over `name`, so readers never observe a half-written file.
pub fn write_atomic(storage: &dyn Storage, name: &str, bytes: &[u8]) -> Result<()> {
    let temp_name = format!("{name}.tmp");
    {
        let mut output = storage.create_output(&temp_name)?;
        output.write_all(bytes)?;
        output.flush_and_sync()?;
        output.close()?;
    }
    storage.rename_file(&temp_name, name)
}

/// Type-safe configuration for the supported backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Directory-backed storage.
    File(file::FileStorageConfig),

    /// Non-persistent in-memory storage.
    Memory(memory::MemoryStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory(memory::MemoryStorageConfig::default())
    }
}

/// Helper for constructing concrete storage instances.
pub struct StorageFactory;

impl StorageFactory {
    /// Create a storage backend from its configuration.
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::Memory(mem_config) => {
                let storage = memory::MemoryStorage::new(mem_config);
                Ok(Arc::new(storage))
            }
            StorageConfig::File(file_config) => {
                let storage = file::FileStorage::new(file_config)?;
                Ok(Arc::new(storage))
            }
        }
    }
}

/// Low-level storage failures, converted into [`BntkError::Storage`].
#[derive(Debug, Clone)]
pub enum StorageError {
    FileNotFound(String),

    PermissionDenied(String),

    IoError(String),

    InvalidOperation(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::PermissionDenied(name) => write!(f, "Permission denied: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
            StorageError::InvalidOperation(msg) => write!(f, "Invalid operation: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for BntkError {
    fn from(err: StorageError) -> Self {
        BntkError::storage(err.to_string())
    }
}
