#![allow(dead_code)]

use std::sync::OnceLock;

use resonance_core::{ModelConfig, Observation, ResonanceTransformer};

pub fn small_config() -> ModelConfig {
    ModelConfig {
        d_model: 32,
        n_heads: 4,
        n_layers: 2,
        d_ff: 64,
        max_seq_len: 30,
        ..ModelConfig::default()
    }
}

/// One shared small model; construction dominates test time otherwise.
pub fn shared_model() -> &'static ResonanceTransformer {
    static MODEL: OnceLock<ResonanceTransformer> = OnceLock::new();
    MODEL.get_or_init(|| ResonanceTransformer::new(small_config()).expect("valid test config"))
}

/// A working week (Mon–Fri at 09:00) with a declining trend.
pub fn declining_week() -> Vec<Observation> {
    (0..5u8)
        .map(|day| {
            let t = day as f32;
            Observation::new(4.0 - 0.5 * t, 3.5 - 0.4 * t, 2.0 + 0.6 * t, day, 9)
        })
        .collect()
}

pub fn assert_distribution(probs: &[f32]) {
    let sum: f32 = probs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5, "sum = {sum}");
    assert!(probs.iter().all(|&p| p >= 0.0));
}
