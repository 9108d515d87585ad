//! Command implementations for the bntk CLI.

use std::sync::Arc;

use crate::api::{Lexicon, LexiconSession};
use crate::bootstrap::{BootstrapProgress, ProgressSink};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::BntkConfig;
use crate::error::Result;
use crate::storage::StorageConfig;
use crate::storage::file::FileStorageConfig;

/// Execute a CLI command.
pub async fn execute_command(args: BntkArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    match &args.command {
        Command::Bootstrap => run_bootstrap(config, &args).await,
        Command::Exists(word_args) => {
            let lexicon = open_lexicon(config, &args).await?;
            let result = ExistsResult {
                word: word_args.word.clone(),
                exists: lexicon.exists(&word_args.word).await,
            };
            output_result(&result, &args)
        }
        Command::Suggest(text_args) => {
            let lexicon = open_lexicon(config, &args).await?;
            let result = SuggestResults {
                suggestions: lexicon.suggest(&text_args.joined()).await,
            };
            output_result(&result, &args)
        }
        Command::Similar(word_args) => {
            let lexicon = open_lexicon(config, &args).await?;
            let result = SimilarResults {
                word: word_args.word.clone(),
                similar: lexicon.similar(&word_args.word).await,
            };
            output_result(&result, &args)
        }
        Command::Check(text_args) => {
            let lexicon = open_lexicon(config, &args).await?;
            let result = CheckResults {
                misspellings: lexicon.check(&text_args.joined()).await,
            };
            output_result(&result, &args)
        }
        Command::Stats => {
            let lexicon = open_lexicon(config, &args).await?;
            output_result(&lexicon.stats().await, &args)
        }
    }
}

/// Load the configuration file, if any, and apply command-line overrides.
fn resolve_config(args: &BntkArgs) -> Result<BntkConfig> {
    let mut config = match &args.config {
        Some(path) => BntkConfig::load(path)?,
        None => BntkConfig::default(),
    };

    if let Some(store) = &args.store {
        config.storage = StorageConfig::File(FileStorageConfig::new(store));
    }
    if let Some(corpus) = &args.corpus {
        config.corpus.base_path = corpus.clone();
    }
    Ok(config)
}

/// Progress printer for verbose human output.
fn progress_sink(args: &BntkArgs) -> Option<ProgressSink> {
    if args.output_format == OutputFormat::Human && args.verbosity() > 1 {
        Some(Arc::new(|event: &BootstrapProgress| {
            eprintln!("{}", describe_progress(event))
        }))
    } else {
        None
    }
}

/// Open the lexicon, bootstrapping it first so reads see a seeded store.
async fn open_lexicon(config: BntkConfig, args: &BntkArgs) -> Result<Arc<Lexicon>> {
    LexiconSession::new(config)
        .get_or_init(progress_sink(args))
        .await
}

async fn run_bootstrap(config: BntkConfig, args: &BntkArgs) -> Result<()> {
    let lexicon = Lexicon::open(config).await?;
    let report = lexicon.bootstrap(progress_sink(args)).await?;
    output_result(&report, args)
}
