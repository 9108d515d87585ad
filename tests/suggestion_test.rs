use bntk::analysis::transliterator::{RenderMode, TableTransliterator};
use bntk::lexicon::{LexiconStore, TRIGRAM_EXTENSION};
use bntk::suggest::{MatchType, SuggestionConfig, SuggestionEngine};
use std::sync::Arc;

async fn engine_with(entries: &[(&str, &str)]) -> SuggestionEngine {
    let store = LexiconStore::memory().await.unwrap();
    store.enable_extension(TRIGRAM_EXTENSION).await.unwrap();
    store.apply_schema().await.unwrap();
    for (word, romanized) in entries {
        let id = store.insert_word(word).await.unwrap();
        store.insert_romanized(id, romanized).await.unwrap();
    }
    SuggestionEngine::new(Arc::new(store), SuggestionConfig::default())
}

#[tokio::test]
async fn test_romanized_input_finds_bangla_word() {
    let engine = engine_with(&[("আমি", "ami"), ("আমার", "amar"), ("তোমার", "tomar")]).await;

    let suggestions = engine.suggest("tomar").await;
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].original, "tomar");
    assert_eq!(suggestions[0].suggestion, "তোমার");
    assert_eq!(suggestions[0].match_type, MatchType::ExactRomanized);
    assert_eq!(suggestions[0].priority, 2);
    assert_eq!(suggestions[0].score, 1.0);
    assert_eq!(suggestions[0].rank, 1);

    // Romanized matching ignores case.
    let upper = engine.suggest("TOMAR").await;
    assert_eq!(upper[0].suggestion, "তোমার");
    assert_eq!(upper[0].original, "TOMAR");
}

#[tokio::test]
async fn test_exact_match_outranks_trigram_match() {
    let engine = engine_with(&[("আমার", "amar"), ("আমারে", "amare")]).await;

    let suggestions = engine.suggest("amar").await;
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].suggestion, "আমার");
    assert_eq!(suggestions[0].match_type, MatchType::ExactRomanized);
    assert_eq!(suggestions[1].suggestion, "আমারে");
    assert_eq!(suggestions[1].match_type, MatchType::TrigramRomanized);
    assert!(suggestions[1].score > 0.3 && suggestions[1].score < 1.0);
    assert_eq!(suggestions[1].rank, 2);
}

#[tokio::test]
async fn test_results_are_capped_per_token() {
    let entries = [
        ("ভালোক", "bhaloa"),
        ("ভালোখ", "bhalob"),
        ("ভালোগ", "bhaloc"),
        ("ভালোঘ", "bhalod"),
        ("ভালোচ", "bhaloe"),
        ("ভালোছ", "bhalof"),
        ("ভালোজ", "bhalog"),
        ("মা", "ma"),
    ];
    let engine = engine_with(&entries).await;

    let suggestions = engine.suggest("bhalo ma").await;
    let bhalo: Vec<_> = suggestions.iter().filter(|c| c.original == "bhalo").collect();
    assert_eq!(bhalo.len(), 5);
    for (i, candidate) in bhalo.iter().enumerate() {
        assert_eq!(candidate.rank, i + 1);
        assert_eq!(candidate.match_type, MatchType::TrigramRomanized);
    }
    // Equal scores fall back to suggestion order.
    let names: Vec<_> = bhalo.iter().map(|c| c.suggestion.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    // The second token's group follows the first.
    let last = suggestions.last().unwrap();
    assert_eq!(last.original, "ma");
    assert_eq!(last.suggestion, "মা");
}

#[tokio::test]
async fn test_bangla_token_is_not_suggested_twice() {
    let store_entries = [("আমার", "amar"), ("আমারে", "amare")];
    let transliterator = TableTransliterator::new().with_entry(RenderMode::Phonetic, "আমার", "amar");
    let engine = engine_with(&store_entries)
        .await
        .with_transliterator(Arc::new(transliterator));

    let suggestions = engine.suggest("আমার").await;
    let own: Vec<_> = suggestions.iter().filter(|c| c.suggestion == "আমার").collect();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].match_type, MatchType::ExactBangla);
    assert_eq!(suggestions[0].suggestion, "আমার");
    assert!(suggestions.iter().any(|c| c.suggestion == "আমারে"));
}

#[tokio::test]
async fn test_unknown_and_empty_inputs() {
    let engine = engine_with(&[("আমি", "ami")]).await;

    assert!(engine.suggest("").await.is_empty());
    assert!(engine.suggest("।।, !").await.is_empty());
    assert!(engine.suggest("xyzzy").await.is_empty());
    assert!(engine.check("xyzzy").await.is_empty());
}

#[tokio::test]
async fn test_repeated_tokens_are_reported_once() {
    let engine = engine_with(&[("তোমার", "tomar")]).await;

    let suggestions = engine.suggest("tomr tomr tomr").await;
    assert_eq!(suggestions.len(), 1);
    assert!((suggestions[0].score - 0.375).abs() < 1e-9);

    let report = engine.check("ei tomr ar tomr").await;
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].word, "tomr");
    assert_eq!(report[0].index, 3);
}
