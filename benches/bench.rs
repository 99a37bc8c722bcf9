// Criterion benchmarks for PadUni Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use paduni_match::core::{
    cosine_similarity, CompatibilityEvaluator, InterestScorer, Matcher, ScoringError,
};
use paduni_match::models::{Candidate, CompatibilityWeights, UserRole};
use tokio::runtime::Runtime;

/// In-process scorer so benchmarks never touch the network
struct LocalScorer;

impl InterestScorer for LocalScorer {
    async fn score(&self, a: &str, b: &str) -> Result<f64, ScoringError> {
        Ok(if a == b { 1.0 } else { 0.5 })
    }
}

fn create_candidate(id: usize, role: UserRole) -> Candidate {
    Candidate {
        id: id as i64,
        name: format!("User {}", id),
        email: format!("user{}@paduni.com", id),
        role,
        course: Some(if id % 4 == 0 { "Medicine" } else { "Engineering" }.to_string()),
        gender: Some(if id % 2 == 0 { "female" } else { "male" }.to_string()),
        birth_year: 2000 + (id % 8) as i32,
        entry_year: Some(2026),
        interests: Some("football music programming".to_string()),
    }
}

fn test_matcher() -> Matcher<LocalScorer> {
    Matcher::new(
        CompatibilityEvaluator::new(LocalScorer, CompatibilityWeights::default())
            .with_reference_year(2026),
    )
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let a: Vec<f64> = (0..384).map(|i| (i as f64).sin()).collect();
    let b: Vec<f64> = (0..384).map(|i| (i as f64).cos()).collect();

    c.bench_function("cosine_similarity_384d", |bench| {
        bench.iter(|| cosine_similarity(black_box(&a), black_box(&b)));
    });
}

fn bench_evaluate_pair(c: &mut Criterion) {
    let rt = Runtime::new().expect("failed to build runtime");
    let evaluator = CompatibilityEvaluator::new(LocalScorer, CompatibilityWeights::default())
        .with_reference_year(2026);
    let newcomer = create_candidate(1, UserRole::Newcomer);
    let veteran = create_candidate(2, UserRole::Veteran);

    c.bench_function("evaluate_pair", |b| {
        b.iter(|| rt.block_on(evaluator.evaluate(black_box(&newcomer), black_box(&veteran))));
    });
}

fn bench_pairing(c: &mut Criterion) {
    let rt = Runtime::new().expect("failed to build runtime");
    let matcher = test_matcher();

    let mut group = c.benchmark_group("pairing");

    for population in [10, 50, 100, 250].iter() {
        let newcomers: Vec<Candidate> = (0..*population)
            .map(|i| create_candidate(i, UserRole::Newcomer))
            .collect();
        let veterans: Vec<Candidate> = (0..*population)
            .map(|i| create_candidate(i + 1000, UserRole::Veteran))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("pair", population),
            population,
            |b, _| {
                b.iter(|| {
                    rt.block_on(matcher.pair(black_box(&newcomers), black_box(&veterans)))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cosine_similarity,
    bench_evaluate_pair,
    bench_pairing
);

criterion_main!(benches);
