//! Criterion benchmarks for bntk.
//!
//! Covers the trigram primitives, nearest-neighbour lookup on the trigram
//! index, and the batched suggestion query end to end.

use std::hint::black_box;
use std::sync::Arc;

use bntk::analysis::tokenizer::{Tokenizer, UnicodeWordTokenizer};
use bntk::lexicon::trigram::{TrigramIndex, similarity, trigrams};
use bntk::lexicon::{LexiconStore, TRIGRAM_EXTENSION};
use bntk::suggest::{SuggestionConfig, SuggestionEngine};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;

const SYLLABLES: &[&str] = &[
    "a", "ba", "ka", "ma", "ta", "ra", "sho", "no", "pa", "de", "li", "kho", "ji", "be", "ro",
    "shi", "go", "ha", "tu", "mi",
];

/// Deterministic romanized pseudo-words.
fn generate_romanized(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let mut word = String::new();
            let mut n = i;
            for _ in 0..(2 + i % 3) {
                word.push_str(SYLLABLES[n % SYLLABLES.len()]);
                n = n / SYLLABLES.len() + i * 7 + 3;
            }
            word
        })
        .collect()
}

fn bench_trigram(c: &mut Criterion) {
    let mut group = c.benchmark_group("trigram");
    let words = generate_romanized(1000);

    group.bench_function("trigram_extraction", |b| {
        b.iter(|| black_box(trigrams(black_box("bhalobasha tomake"))))
    });

    group.throughput(Throughput::Elements(100));
    group.bench_function("similarity_batch", |b| {
        b.iter(|| {
            for word in words.iter().take(100) {
                black_box(similarity(black_box("tomar"), word));
            }
        })
    });

    let mut index = TrigramIndex::new();
    for (id, word) in words.iter().enumerate() {
        index.insert(id as i32, word);
    }
    group.bench_function("nearest_15", |b| {
        b.iter(|| black_box(index.nearest(black_box("mabata"), 15)))
    });

    group.finish();
}

fn bench_tokenize(c: &mut Criterion) {
    let tokenizer = UnicodeWordTokenizer::new();
    let text = "আমি tomake bhalobashi, তুমি ki amake bhalobasho? ".repeat(20);

    c.bench_function("tokenize_mixed_text", |b| {
        b.iter(|| {
            let tokens: Vec<_> = tokenizer.tokenize(black_box(&text)).unwrap().collect();
            black_box(tokens)
        })
    });
}

fn bench_suggest(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggest");
    group.sample_size(20);

    let runtime = Runtime::new().unwrap();
    let engine = runtime.block_on(async {
        let store = LexiconStore::memory().await.unwrap();
        store.enable_extension(TRIGRAM_EXTENSION).await.unwrap();
        store.apply_schema().await.unwrap();
        for (i, romanized) in generate_romanized(2000).iter().enumerate() {
            let id = store.insert_word(&format!("শব্দ{i}")).await.unwrap();
            store.insert_romanized(id, romanized).await.unwrap();
        }
        SuggestionEngine::new(Arc::new(store), SuggestionConfig::default())
    });

    let text = "mabata kaba shono rotu amra jiha";
    group.throughput(Throughput::Elements(6));
    group.bench_function("suggest_six_tokens", |b| {
        b.iter(|| runtime.block_on(async { black_box(engine.suggest(black_box(text)).await) }))
    });

    group.finish();
}

criterion_group!(benches, bench_trigram, bench_tokenize, bench_suggest);
criterion_main!(benches);
