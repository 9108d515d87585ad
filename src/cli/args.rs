//! Command line argument parsing for the bntk CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// bntk - Bangla and romanized word suggestions
#[derive(Parser, Debug, Clone)]
#[command(name = "bntk")]
#[command(about = "Fuzzy Bangla/romanized word suggestions backed by a seeded lexicon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct BntkArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Persist the lexicon in this directory instead of the configured storage
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Read seed corpora from this directory instead of the configured one
    #[arg(long, value_name = "DIR")]
    pub corpus: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl BntkArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Enable the trigram extension, apply the schema and seed empty tables
    Bootstrap,

    /// Check whether a word is in the lexicon
    Exists(WordArgs),

    /// Ranked suggestions for every word of a text
    Suggest(TextArgs),

    /// Words of similar length and spelling
    Similar(WordArgs),

    /// Per-word spelling report for a text
    Check(TextArgs),

    /// Show row counts and extension state
    Stats,
}

/// A single word argument.
#[derive(Parser, Debug, Clone)]
pub struct WordArgs {
    #[arg(value_name = "WORD")]
    pub word: String,
}

/// Free text, given as one or more arguments.
#[derive(Parser, Debug, Clone)]
pub struct TextArgs {
    #[arg(value_name = "TEXT", required = true, num_args = 1..)]
    pub text: Vec<String>,
}

impl TextArgs {
    /// The arguments joined with single spaces.
    pub fn joined(&self) -> String {
        self.text.join(" ")
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity() {
        let args = BntkArgs::try_parse_from(["bntk", "stats"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = BntkArgs::try_parse_from(["bntk", "-vv", "stats"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = BntkArgs::try_parse_from(["bntk", "-vv", "--quiet", "stats"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args = BntkArgs::try_parse_from(["bntk", "--format", "json", "stats"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);

        assert!(BntkArgs::try_parse_from(["bntk", "--format", "yaml", "stats"]).is_err());
    }

    #[test]
    fn test_text_arguments_are_joined() {
        let args = BntkArgs::try_parse_from(["bntk", "suggest", "ami", "tomar"]).unwrap();
        match args.command {
            Command::Suggest(text) => assert_eq!(text.joined(), "ami tomar"),
            other => panic!("Expected Suggest command, got {other:?}"),
        }

        assert!(BntkArgs::try_parse_from(["bntk", "check"]).is_err());
    }

    #[test]
    fn test_global_paths() {
        let args = BntkArgs::try_parse_from([
            "bntk",
            "--store",
            "/var/lib/bntk",
            "--corpus",
            "/srv/corpus",
            "exists",
            "আমি",
        ])
        .unwrap();
        assert_eq!(args.store, Some(PathBuf::from("/var/lib/bntk")));
        assert_eq!(args.corpus, Some(PathBuf::from("/srv/corpus")));
        assert!(matches!(args.command, Command::Exists(WordArgs { ref word }) if word == "আমি"));
    }
}
