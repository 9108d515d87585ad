//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::api::LexiconStats;
use crate::bootstrap::{BootstrapProgress, BootstrapReport, TableOutcome};
use crate::cli::args::{BntkArgs, OutputFormat};
use crate::error::Result;
use crate::suggest::{Candidate, Misspelling};

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn print_human(&self);
}

/// Result of `exists`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExistsResult {
    pub word: String,
    pub exists: bool,
}

/// Result of `suggest`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestResults {
    pub suggestions: Vec<Candidate>,
}

/// Result of `similar`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarResults {
    pub word: String,
    pub similar: Vec<String>,
}

/// Result of `check`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResults {
    pub misspellings: Vec<Misspelling>,
}

impl HumanOutput for ExistsResult {
    fn print_human(&self) {
        let verdict = if self.exists { "found" } else { "not found" };
        println!("{}: {verdict}", self.word);
    }
}

impl HumanOutput for SuggestResults {
    fn print_human(&self) {
        if self.suggestions.is_empty() {
            println!("No suggestions.");
            return;
        }

        let mut current: Option<&str> = None;
        for candidate in &self.suggestions {
            if current != Some(candidate.original.as_str()) {
                if current.is_some() {
                    println!();
                }
                println!("{}", candidate.original);
                println!("─────────────");
                current = Some(candidate.original.as_str());
            }
            println!(
                "  {}. {} ({}, score {:.3})",
                candidate.rank, candidate.suggestion, candidate.match_type, candidate.score
            );
        }
    }
}

impl HumanOutput for SimilarResults {
    fn print_human(&self) {
        if self.similar.is_empty() {
            println!("No words similar to {}.", self.word);
        } else {
            println!("{}: {}", self.word, self.similar.join(", "));
        }
    }
}

impl HumanOutput for CheckResults {
    fn print_human(&self) {
        if self.misspellings.is_empty() {
            println!("No suggestions.");
            return;
        }
        for misspelling in &self.misspellings {
            println!(
                "{} (at {}): {}",
                misspelling.word,
                misspelling.index,
                misspelling.suggestions.join(", ")
            );
        }
    }
}

impl HumanOutput for LexiconStats {
    fn print_human(&self) {
        println!("Lexicon Statistics:");
        println!("══════════════════");
        println!("Words: {}", self.words);
        println!("Romanized words: {}", self.romanized_words);
        println!("Trigram extension: {}", enabled(self.trigram_enabled));
        println!("Schema: {}", if self.schema_ready { "ready" } else { "missing" });
    }
}

impl HumanOutput for BootstrapReport {
    fn print_human(&self) {
        println!("Bootstrap Report:");
        println!("═════════════════");
        if self.schema_recoveries > 0 {
            println!("Schema recoveries: {}", self.schema_recoveries);
        }
        println!("words: {}", describe_outcome(&self.words));
        println!("romanized_words: {}", describe_outcome(&self.romanized_words));
        if self.is_degraded() {
            println!();
            println!("Lexicon is degraded; suggestions may be incomplete.");
        }
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

fn describe_outcome(outcome: &TableOutcome) -> String {
    match outcome {
        TableOutcome::AlreadySeeded { rows } => format!("already seeded ({rows} rows)"),
        TableOutcome::Loaded { rows } => format!("loaded {rows} rows"),
        TableOutcome::FetchFailed { reason } => format!("fetch failed: {reason}"),
        TableOutcome::LoadFailed { committed, reason } => {
            format!("load failed after {committed} rows: {reason}")
        }
    }
}

/// One line describing a bootstrap progress event.
pub fn describe_progress(event: &BootstrapProgress) -> String {
    match event {
        BootstrapProgress::Checked {
            words,
            romanized_words,
        } => format!("Checked: {words} words, {romanized_words} romanized words"),
        BootstrapProgress::Fetched { table, bytes } => {
            format!("Fetched {table} corpus ({})", format_bytes(*bytes as u64))
        }
        BootstrapProgress::Loaded { table, rows } => format!("Loaded {rows} rows into {table}"),
        BootstrapProgress::Completed => "Bootstrap completed".to_string(),
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(result: &T, args: &BntkArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_json<T: Serialize>(result: &T, args: &BntkArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format bytes into human-readable format.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
