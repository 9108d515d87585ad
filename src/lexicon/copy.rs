//! Bulk copy input: header-prefixed CSV decoded into typed rows.
//!
//! Rows are produced lazily so the store can commit them in batches; a
//! malformed row surfaces as an error at its position in the stream and the
//! rows before it are unaffected.

use std::io::Read;

use csv::StringRecord;

use crate::error::{BntkError, Result};
use crate::lexicon::schema::{ColumnType, TableDef};

/// A decoded column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int4(i32),
    Text(String),
}

/// One decoded row in column order.
pub type Row = Vec<Value>;

/// A bulk copy that stopped part-way.
///
/// `committed` rows were already made durable before `error` occurred; they
/// are not rolled back.
#[derive(Debug)]
pub struct CopyFailure {
    pub committed: usize,
    pub error: BntkError,
}

impl std::fmt::Display for CopyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (after {} committed rows)", self.error, self.committed)
    }
}

impl std::error::Error for CopyFailure {}

impl From<CopyFailure> for BntkError {
    fn from(failure: CopyFailure) -> Self {
        failure.error
    }
}

/// CSV format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyFormat {
    pub delimiter: u8,
    pub quote: u8,
    pub header: bool,
}

impl Default for CopyFormat {
    fn default() -> Self {
        CopyFormat {
            delimiter: b',',
            quote: b'"',
            header: true,
        }
    }
}

/// Streaming reader of typed rows for one table.
pub struct CopyReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    columns: Vec<ColumnType>,
    table: String,
    line: u64,
}

impl<R: Read> CopyReader<R> {
    /// Create a reader decoding `input` against `table`'s columns.
    pub fn new(table: &TableDef, input: R, format: CopyFormat) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(format.delimiter)
            .quote(format.quote)
            .has_headers(format.header)
            .flexible(true)
            .from_reader(input);

        CopyReader {
            records: reader.into_records(),
            columns: table.columns.iter().map(|c| c.column_type).collect(),
            table: table.name.clone(),
            line: if format.header { 1 } else { 0 },
        }
    }

    fn decode(&self, record: &StringRecord) -> Result<Row> {
        if record.len() != self.columns.len() {
            return Err(BntkError::copy(format!(
                "{}: line {}: expected {} columns, found {}",
                self.table,
                self.line,
                self.columns.len(),
                record.len()
            )));
        }

        record
            .iter()
            .zip(&self.columns)
            .map(|(field, column_type)| match column_type {
                ColumnType::Int4 => field.trim().parse::<i32>().map(Value::Int4).map_err(|_| {
                    BntkError::copy(format!(
                        "{}: line {}: invalid input syntax for type integer: \"{field}\"",
                        self.table, self.line
                    ))
                }),
                ColumnType::Text => Ok(Value::Text(field.to_string())),
            })
            .collect()
    }

    /// Read up to `max` rows. An empty batch means the input is exhausted.
    pub fn next_batch(&mut self, max: usize) -> Result<Vec<Row>> {
        let mut batch = Vec::with_capacity(max.min(4096));
        while batch.len() < max {
            match self.next() {
                Some(row) => batch.push(row?),
                None => break,
            }
        }
        Ok(batch)
    }
}

impl<R: Read> Iterator for CopyReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.line += 1;
        Some(
            record
                .map_err(|e| BntkError::copy(format!("{}: line {}: {e}", self.table, self.line)))
                .and_then(|record| self.decode(&record)),
        )
    }
}
