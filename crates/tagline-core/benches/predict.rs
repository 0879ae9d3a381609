//! Benchmarks for ranking and embedding scoring.
//!
//! Run with: cargo bench -p tagline-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagline_core::scoring::TagBank;
use tagline_core::{InferenceResult, PreparedText, Scores, ScoringStrategy, TagTaxonomy, Tagger};

/// Deterministic pseudo-scores derived from tag bytes.
struct HashScores;

impl ScoringStrategy for HashScores {
    fn name(&self) -> &str {
        "bench"
    }

    fn score(
        &self,
        _input: &PreparedText,
        _category: &str,
        candidate_tags: &[String],
    ) -> InferenceResult<Scores> {
        Ok(candidate_tags
            .iter()
            .map(|t| {
                let h = t.bytes().fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
                (t.clone(), (h % 1000) as f32 / 1000.0)
            })
            .collect())
    }
}

fn benchmark_predict_ranking(c: &mut Criterion) {
    let tagger = Tagger::new(TagTaxonomy::volunteer(), Box::new(HashScores), 2).unwrap();

    c.bench_function("predict_volunteer_taxonomy", |b| {
        b.iter(|| {
            let _ = tagger.predict(black_box("Help seniors with grocery runs on weekends"));
        })
    });
}

fn benchmark_tag_bank_similarities(c: &mut Criterion) {
    let dim = 384;
    let tags: Vec<String> = (0..64).map(|i| format!("tag-{i}")).collect();
    let vectors: Vec<Vec<f32>> = (0..64)
        .map(|i| {
            (0..dim)
                .map(|j| ((i * dim + j) % 17) as f32 / 17.0)
                .collect()
        })
        .collect();
    let bank = TagBank::from_vectors(tags, vectors).unwrap();
    let query: Vec<f32> = (0..dim).map(|j| (j % 5) as f32).collect();

    c.bench_function("tag_bank_cosine_64x384", |b| {
        b.iter(|| {
            let _ = bank.similarities(black_box(&query));
        })
    });
}

criterion_group!(
    benches,
    benchmark_predict_ranking,
    benchmark_tag_bank_similarities
);
criterion_main!(benches);
