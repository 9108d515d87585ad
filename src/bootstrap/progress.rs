//! Bootstrap progress events.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One bootstrap milestone.
///
/// Events arrive in strictly forward order: `Checked`, then `Fetched` and
/// `Loaded` for each table that is seeded, then `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum BootstrapProgress {
    /// Row counts were read.
    Checked { words: usize, romanized_words: usize },
    /// A corpus was fetched.
    Fetched { table: String, bytes: usize },
    /// A corpus was copied into its table.
    Loaded { table: String, rows: usize },
    /// Bootstrap finished.
    Completed,
}

impl BootstrapProgress {
    /// Ordinal used to check forward ordering.
    pub fn ordinal(&self) -> u8 {
        match self {
            BootstrapProgress::Checked { .. } => 0,
            BootstrapProgress::Fetched { .. } => 1,
            BootstrapProgress::Loaded { .. } => 2,
            BootstrapProgress::Completed => 3,
        }
    }
}

/// Synchronous progress callback.
pub type ProgressSink = Arc<dyn Fn(&BootstrapProgress) + Send + Sync>;

/// Send `event` to `sink` if there is one.
pub fn emit(sink: Option<&ProgressSink>, event: BootstrapProgress) {
    if let Some(sink) = sink {
        sink(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_emit() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let sink: ProgressSink =
            Arc::new(move |event: &BootstrapProgress| recorder.lock().push(event.clone()));

        emit(Some(&sink), BootstrapProgress::Checked { words: 0, romanized_words: 0 });
        emit(None, BootstrapProgress::Completed);
        emit(Some(&sink), BootstrapProgress::Completed);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].ordinal() < seen[1].ordinal());
    }

    #[test]
    fn test_serializes_with_step_tag() {
        let json = serde_json::to_value(BootstrapProgress::Loaded {
            table: "words".to_string(),
            rows: 3,
        })
        .unwrap();
        assert_eq!(json["step"], "loaded");
        assert_eq!(json["rows"], 3);
    }
}
