//! Benchmark suite for resonance-core
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use resonance_core::model::MultiHeadSelfAttention;
use resonance_core::{EmotionalBatch, ModelConfig, Observation, ResonanceTransformer};

fn bench_attention(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let attn = MultiHeadSelfAttention::new(256, 8, &mut rng).unwrap();
    let mut group = c.benchmark_group("self_attention_d256");

    for seq_len in [7, 30, 90] {
        let x = Array2::from_shape_fn((seq_len, 256), |(i, j)| ((i + j) % 17) as f32 / 17.0);
        group.bench_with_input(BenchmarkId::from_parameter(seq_len), &seq_len, |b, _| {
            b.iter(|| black_box(attn.forward(x.view(), None)))
        });
    }
    group.finish();
}

fn bench_forward(c: &mut Criterion) {
    let model = ResonanceTransformer::new(ModelConfig::default()).unwrap();
    let mut group = c.benchmark_group("forward_default");
    group.sample_size(10);

    for batch in [1, 8] {
        let days: Vec<i64> = (0..30).map(|t| t % 7).collect();
        let hours = vec![9i64; 30];
        let input = EmotionalBatch::constant(batch, 3.0, 3.0, 2.5, &days, &hours);
        group.bench_with_input(BenchmarkId::new("batch", batch), &batch, |b, _| {
            b.iter(|| black_box(model.forward(&input, None).unwrap()))
        });
    }
    group.finish();
}

fn bench_predict_mixed_lengths(c: &mut Criterion) {
    let config = ModelConfig {
        n_layers: 2,
        ..ModelConfig::default()
    };
    let model = ResonanceTransformer::new(config).unwrap();
    let sequences: Vec<Vec<Observation>> = [5usize, 14, 30]
        .iter()
        .map(|&len| {
            (0..len)
                .map(|t| Observation::new(3.0, 2.5, 2.0, (t % 7) as u8, 10))
                .collect()
        })
        .collect();

    c.bench_function("predict_mixed_lengths", |b| {
        b.iter(|| black_box(model.predict(&sequences).unwrap()))
    });
}

criterion_group!(benches, bench_attention, bench_forward, bench_predict_mixed_lengths);
criterion_main!(benches);
