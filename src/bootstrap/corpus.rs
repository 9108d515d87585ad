//! Seed corpus sources.
//!
//! A corpus is a named CSV resource fetched once as a byte stream. The file
//! source resolves names against a base directory; the memory source serves
//! pre-registered byte buffers (tests, embedded corpora).

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::error::{BntkError, Result};

/// Where the seed corpora live and what they are called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory the corpus files are resolved against.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Corpus for the `words` table (`id,value`).
    #[serde(default = "default_words_file")]
    pub words_file: String,

    /// Corpus for the `romanized_words` table (`word_id,value`).
    #[serde(default = "default_romanized_words_file")]
    pub romanized_words_file: String,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("data")
}

fn default_words_file() -> String {
    "words.csv".to_string()
}

fn default_romanized_words_file() -> String {
    "romanized_words.csv".to_string()
}

impl Default for CorpusConfig {
    fn default() -> Self {
        CorpusConfig {
            base_path: default_base_path(),
            words_file: default_words_file(),
            romanized_words_file: default_romanized_words_file(),
        }
    }
}

impl CorpusConfig {
    /// A file source rooted at `base_path`.
    pub fn file_source(&self) -> FileCorpusSource {
        FileCorpusSource::new(&self.base_path)
    }
}

/// Fetches corpus resources by name.
pub trait CorpusSource: Send + Sync + Debug {
    /// Fetch the full contents of `name`.
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;

    /// Human-readable location of `name`, for logs.
    fn locate(&self, name: &str) -> String;
}

/// Reads corpora from a directory.
#[derive(Debug, Clone)]
pub struct FileCorpusSource {
    base_path: PathBuf,
}

impl FileCorpusSource {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        FileCorpusSource {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl CorpusSource for FileCorpusSource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            let path = self.base_path.join(name);
            tokio::fs::read(&path)
                .await
                .map_err(|e| BntkError::corpus_fetch(format!("{}: {e}", path.display())))
        }
        .boxed()
    }

    fn locate(&self, name: &str) -> String {
        self.base_path.join(name).display().to_string()
    }
}

/// Serves corpora from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpusSource {
    files: AHashMap<String, Vec<u8>>,
}

impl MemoryCorpusSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file<S: Into<String>, B: Into<Vec<u8>>>(mut self, name: S, bytes: B) -> Self {
        self.files.insert(name.into(), bytes.into());
        self
    }
}

impl CorpusSource for MemoryCorpusSource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        let result = self
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| BntkError::corpus_fetch(format!("no such corpus: {name}")));
        futures::future::ready(result).boxed()
    }

    fn locate(&self, name: &str) -> String {
        format!("memory:{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(temp_dir.path().join("words.csv")).unwrap();
        writeln!(file, "id,value").unwrap();
        writeln!(file, "1,আমি").unwrap();

        let source = FileCorpusSource::new(temp_dir.path());
        let bytes = source.fetch("words.csv").await.unwrap();
        assert!(String::from_utf8(bytes).unwrap().starts_with("id,value"));

        let err = source.fetch("missing.csv").await.unwrap_err();
        assert!(matches!(err, BntkError::CorpusFetch(_)));
        assert!(source.locate("words.csv").ends_with("words.csv"));
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemoryCorpusSource::new().with_file("words.csv", "id,value\n");
        assert_eq!(source.fetch("words.csv").await.unwrap(), b"id,value\n");
        assert!(source.fetch("romanized_words.csv").await.is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config: CorpusConfig = serde_json::from_str(r#"{"base_path":"/srv/bntk"}"#).unwrap();
        assert_eq!(config.words_file, "words.csv");
        assert_eq!(config.romanized_words_file, "romanized_words.csv");
        assert_eq!(config.file_source().base_path(), Path::new("/srv/bntk"));
    }
}
