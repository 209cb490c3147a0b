//! Context window statistics benchmarks
//!
//! Measures chunk scoring (cosine similarity against a reference embedding)
//! and the three breakpoint statistics over neighbor texts of growing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use table_context::windowing::{cosine_similarity, filter_chunks};
use table_context::{BreakpointKind, BreakpointThreshold};

const EMBEDDING_DIM: usize = 1536;

/// Deterministic pseudo-random embedding
fn embedding(seed: u64) -> Vec<f32> {
    let mut s = seed.wrapping_add(1);
    (0..EMBEDDING_DIM)
        .map(|_| {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((s >> 33) as f32) / (u32::MAX as f32) - 0.25
        })
        .collect()
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_scoring");
    let reference = embedding(0);

    for chunks in [8, 64, 256] {
        let embeddings: Vec<Vec<f32>> = (1..=chunks as u64).map(embedding).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{chunks}_chunks")),
            &embeddings,
            |b, embeddings| {
                b.iter(|| {
                    let scores: Vec<f32> = embeddings
                        .iter()
                        .map(|e| cosine_similarity(black_box(e), black_box(&reference)))
                        .collect();
                    black_box(scores)
                });
            },
        );
    }

    group.finish();
}

fn bench_breakpoints(c: &mut Criterion) {
    let mut group = c.benchmark_group("breakpoint_filter");
    let reference = embedding(0);

    for chunks in [8, 64, 256] {
        let scores: Vec<f32> = (1..=chunks as u64)
            .map(|i| cosine_similarity(&embedding(i), &reference))
            .collect();
        let texts: Vec<String> = (0..chunks).map(|i| format!("chunk {i}")).collect();

        for kind in [
            BreakpointKind::Percentile,
            BreakpointKind::StandardDeviation,
            BreakpointKind::Interquartile,
        ] {
            let breakpoint = BreakpointThreshold::new(kind);
            group.bench_with_input(
                BenchmarkId::new(format!("{kind:?}"), chunks),
                &scores,
                |b, scores| {
                    b.iter(|| {
                        let threshold = breakpoint.threshold(black_box(scores)).unwrap_or(f64::MAX);
                        black_box(filter_chunks(&texts, scores, threshold))
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_scoring, bench_breakpoints);
criterion_main!(benches);
