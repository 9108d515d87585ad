//! Top-level configuration.
//!
//! A [`BntkConfig`] gathers the storage backend, the corpus location, the
//! bootstrap and suggestion tunables and the trigram threshold. Every field
//! has a default, so an empty JSON object is a valid configuration:
//!
//! ```
//! use bntk::config::BntkConfig;
//!
//! let config: BntkConfig = serde_json::from_str("{}").unwrap();
//! assert_eq!(config.suggestion.max_per_token, 5);
//! assert!(config.validate().is_ok());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::transliterator::{RenderMode, TableTransliterator};
use crate::bootstrap::{BootstrapConfig, CorpusConfig};
use crate::error::{BntkError, Result};
use crate::lexicon::StoreOptions;
use crate::lexicon::trigram::DEFAULT_SIMILARITY_THRESHOLD;
use crate::storage::StorageConfig;
use crate::suggest::SuggestionConfig;

/// Trigram facility settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrigramConfig {
    /// Threshold of the similarity predicate.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for TrigramConfig {
    fn default() -> Self {
        TrigramConfig {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Transliteration tables, one CSV file (`word,romanized`) per render mode.
///
/// Without any table the engine romanizes by passthrough.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransliterationConfig {
    #[serde(default)]
    pub tables: BTreeMap<RenderMode, PathBuf>,
}

impl TransliterationConfig {
    /// Load the configured tables, or `None` when there are none.
    pub fn load(&self) -> Result<Option<TableTransliterator>> {
        if self.tables.is_empty() {
            return Ok(None);
        }

        let mut transliterator = TableTransliterator::new();
        for (mode, path) in &self.tables {
            let loaded = transliterator.load_csv(*mode, path)?;
            debug!("Loaded {loaded} {mode} mappings from {}", path.display());
        }
        Ok(Some(transliterator))
    }
}

/// Configuration for a whole lexicon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BntkConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    #[serde(default)]
    pub suggestion: SuggestionConfig,

    #[serde(default)]
    pub trigram: TrigramConfig,

    #[serde(default)]
    pub transliteration: TransliterationConfig,
}

impl BntkConfig {
    /// Read a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BntkError::config(format!("{}: {e}", path.display())))?;
        let config: BntkConfig = serde_json::from_str(&content)
            .map_err(|e| BntkError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.suggestion.max_per_token == 0 {
            return Err(BntkError::config("suggestion.max_per_token must be positive"));
        }
        if self.suggestion.nearest_neighbors == 0 {
            return Err(BntkError::config(
                "suggestion.nearest_neighbors must be positive",
            ));
        }
        if self.bootstrap.copy_batch_size == 0 {
            return Err(BntkError::config("bootstrap.copy_batch_size must be positive"));
        }
        for (name, value) in [
            ("suggestion.min_similarity", self.suggestion.min_similarity),
            ("trigram.similarity_threshold", self.trigram.similarity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BntkError::config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Options for the store this configuration opens.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            copy_batch_size: self.bootstrap.copy_batch_size,
            similarity_threshold: self.trigram.similarity_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = BntkConfig::default();
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.bootstrap.schema_retries, 1);
        assert_eq!(config.suggestion.nearest_neighbors, 15);
        assert_eq!(config.trigram.similarity_threshold, 0.3);
        assert!(config.transliteration.load().unwrap().is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bntk.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "storage": {{"type": "file", "path": "/var/lib/bntk"}},
                "bootstrap": {{"copy_batch_size": 250}},
                "suggestion": {{"max_per_token": 3, "render_mode": "iso15919"}}
            }}"#
        )
        .unwrap();

        let config = BntkConfig::load(&path).unwrap();
        assert!(matches!(config.storage, StorageConfig::File(_)));
        assert_eq!(config.suggestion.max_per_token, 3);
        assert_eq!(config.suggestion.render_mode, RenderMode::Iso15919);
        assert_eq!(config.suggestion.nearest_neighbors, 15);

        let options = config.store_options();
        assert_eq!(options.copy_batch_size, 250);
        assert_eq!(options.similarity_threshold, 0.3);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = BntkConfig::default();
        config.suggestion.max_per_token = 0;
        assert!(matches!(config.validate(), Err(BntkError::Config(_))));

        let mut config = BntkConfig::default();
        config.trigram.similarity_threshold = 1.5;
        assert!(config.validate().is_err());

        let temp_dir = TempDir::new().unwrap();
        let err = BntkConfig::load(temp_dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, BntkError::Config(_)));
    }

    #[test]
    fn test_transliteration_tables() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("phonetic.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "word,romanized").unwrap();
        writeln!(file, "তোমার,tomar").unwrap();

        let mut config = TransliterationConfig::default();
        config.tables.insert(RenderMode::Phonetic, path);
        let transliterator = config.load().unwrap().unwrap();
        assert_eq!(transliterator.len(RenderMode::Phonetic), 1);
    }
}
