//! Relational schema and catalog for the lexicon.
//!
//! The catalog records which tables exist, their definitions, and which
//! extensions are enabled. Applying the canonical schema is idempotent against
//! a compatible catalog and fails with [`BntkError::SchemaConflict`] when a
//! table of the same name was created with a different definition.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BntkError, Result};
use crate::lexicon::{ROMANIZED_WORDS_TABLE, WORDS_ID_SEQUENCE, WORDS_TABLE};

/// Current on-disk catalog format.
pub const CATALOG_FORMAT_VERSION: u32 = 1;

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int4,
    Text,
}

/// Column default expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDefault {
    /// `nextval('<sequence>')`
    NextVal(String),
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    /// A `NOT NULL` column without default.
    pub fn required(name: &str, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.to_string(),
            column_type,
            not_null: true,
            default: None,
        }
    }

    /// Attach a default expression.
    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }
}

/// What happens to referencing rows when the referenced key changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub references_table: String,
    pub references_columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    /// Create a table definition without constraints.
    pub fn new(name: &str, columns: Vec<ColumnDef>) -> Self {
        TableDef {
            name: name.to_string(),
            columns,
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Set the primary key columns.
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a foreign key.
    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether this table references `table` through a foreign key.
    pub fn references(&self, table: &str) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.references_table == table)
    }
}

/// `words(id int4 default nextval('words_id_seq'), value text, primary key (id))`
pub fn words_table() -> TableDef {
    TableDef::new(
        WORDS_TABLE,
        vec![
            ColumnDef::required("id", ColumnType::Int4)
                .with_default(ColumnDefault::NextVal(WORDS_ID_SEQUENCE.to_string())),
            ColumnDef::required("value", ColumnType::Text),
        ],
    )
    .with_primary_key(&["id"])
}

/// `romanized_words(word_id int4 references words(id) on delete restrict on
/// update cascade, value text, primary key (word_id))`
pub fn romanized_words_table() -> TableDef {
    TableDef::new(
        ROMANIZED_WORDS_TABLE,
        vec![
            ColumnDef::required("word_id", ColumnType::Int4),
            ColumnDef::required("value", ColumnType::Text),
        ],
    )
    .with_primary_key(&["word_id"])
    .with_foreign_key(ForeignKey {
        name: "romanized_words_word_id_fkey".to_string(),
        columns: vec!["word_id".to_string()],
        references_table: WORDS_TABLE.to_string(),
        references_columns: vec!["id".to_string()],
        on_delete: ReferentialAction::Restrict,
        on_update: ReferentialAction::Cascade,
    })
}

/// The canonical schema, parents before dependents.
pub fn canonical_schema() -> Vec<TableDef> {
    vec![words_table(), romanized_words_table()]
}

/// A catalog entry for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub definition: TableDef,
    pub created_at: DateTime<Utc>,
}

/// The persisted catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub format_version: u32,
    #[serde(default)]
    pub tables: BTreeMap<String, TableEntry>,
    #[serde(default)]
    pub extensions: BTreeSet<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            format_version: CATALOG_FORMAT_VERSION,
            tables: BTreeMap::new(),
            extensions: BTreeSet::new(),
        }
    }
}

impl Catalog {
    /// Look up a table definition.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name).map(|entry| &entry.definition)
    }

    /// Whether a table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Whether `name` exists with exactly the canonical definition.
    pub fn is_canonical(&self, name: &str) -> bool {
        canonical_schema()
            .iter()
            .any(|def| def.name == name && self.table(name) == Some(def))
    }

    /// `CREATE TABLE`: fails if the table already exists or references a
    /// missing table.
    pub fn create_table(&mut self, definition: TableDef) -> Result<()> {
        if self.has_table(&definition.name) {
            return Err(BntkError::schema(format!(
                "relation \"{}\" already exists",
                definition.name
            )));
        }
        for fk in &definition.foreign_keys {
            if fk.references_table != definition.name && !self.has_table(&fk.references_table) {
                return Err(BntkError::schema(format!(
                    "relation \"{}\" referenced by \"{}\" does not exist",
                    fk.references_table, definition.name
                )));
            }
        }

        self.tables.insert(
            definition.name.clone(),
            TableEntry {
                definition,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// `DROP TABLE`: fails if the table is missing or another table depends on it.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if !self.has_table(name) {
            return Err(BntkError::schema(format!(
                "table \"{name}\" does not exist"
            )));
        }
        if let Some(dependent) = self
            .tables
            .values()
            .map(|entry| &entry.definition)
            .find(|def| def.name != name && def.references(name))
        {
            return Err(BntkError::schema(format!(
                "cannot drop table {name} because table {} depends on it",
                dependent.name
            )));
        }

        self.tables.remove(name);
        Ok(())
    }

    /// Apply the canonical schema.
    ///
    /// Returns the names of the tables that were created. Tables that already
    /// exist with the canonical definition are left alone; any other
    /// pre-existing definition is a [`BntkError::SchemaConflict`] and nothing
    /// is created.
    pub fn apply_canonical(&mut self) -> Result<Vec<String>> {
        let schema = canonical_schema();

        for def in &schema {
            if let Some(existing) = self.table(&def.name)
                && existing != def
            {
                return Err(BntkError::schema_conflict(format!(
                    "table \"{}\" exists with an incompatible definition (columns: {})",
                    def.name,
                    existing.column_names().join(", ")
                )));
            }
        }

        let mut created = Vec::new();
        for def in schema {
            if !self.has_table(&def.name) {
                created.push(def.name.clone());
                self.create_table(def)?;
            }
        }
        Ok(created)
    }
}
