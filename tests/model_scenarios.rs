//! Integration tests: end-to-end scenarios, snapshot round-trips through
//! JSON, and concurrent inference against a swappable handle.

mod common;

use std::sync::Arc;
use std::thread;

use resonance_core::recommend::{fallback_recommendations, DEFAULT_TEMPLATES};
use resonance_core::sanitize::diagnose_parameters;
use resonance_core::{
    risk_categories, EmotionalBatch, ModelConfig, ModelHandle, Observation, ParameterSnapshot,
    Parameterized, RecommendationCatalog, ResonanceError, ResonanceTransformer, RiskCategory,
};

use common::{assert_distribution, declining_week, shared_model, small_config};

#[test]
fn weekday_batch_with_default_architecture() {
    let model = ResonanceTransformer::new(ModelConfig::default()).unwrap();
    let batch = EmotionalBatch::constant(1, 0.5, 0.5, 0.5, &[0, 1, 2, 3, 4], &[9, 9, 9, 9, 9]);
    let out = model.forward(&batch, None).unwrap();

    let prediction = &out.predictions()[0];
    assert_eq!(prediction.risk_probs.len(), 4);
    assert_distribution(&prediction.risk_probs);
    assert!((0.0..=1.0).contains(&prediction.burnout_probability));
    assert_eq!(prediction.recommendation_probs.len(), 10);
    assert_distribution(&prediction.recommendation_probs);
}

#[test]
fn single_observation_sequence() {
    let model = shared_model();
    let predictions = model
        .predict(&[vec![Observation::new(2.0, 1.5, 4.5, 3, 17)]])
        .unwrap();
    assert_eq!(predictions.len(), 1);
    assert_distribution(&predictions[0].risk_probs);
}

#[test]
fn risk_lookup_scenario() {
    let probs = ndarray::array![[0.1f32, 0.2, 0.3, 0.4]];
    assert_eq!(risk_categories(probs.view()).unwrap(), vec![RiskCategory::AtRisk]);
}

#[test]
fn indivisible_heads_scenario() {
    let config = ModelConfig {
        d_model: 100,
        n_heads: 7,
        ..ModelConfig::default()
    };
    assert!(matches!(
        ResonanceTransformer::new(config),
        Err(ResonanceError::HeadsNotDivisible { d_model: 100, n_heads: 7 })
    ));
}

#[test]
fn mixed_length_batch_matches_shapes() {
    let model = shared_model();
    let week = declining_week();
    let predictions = model.predict(&[week.clone(), week[2..].to_vec()]).unwrap();
    assert_eq!(predictions.len(), 2);
    for p in &predictions {
        assert_eq!(p.hidden_state.len(), model.config().d_model);
    }
}

#[test]
fn short_sequence_predicts_the_same_alone_and_batched() {
    let model = shared_model();
    let week = declining_week();
    let short = week[3..].to_vec();

    let alone = &model.predict(&[short.clone()]).unwrap()[0];
    let batched = &model.predict(&[week, short]).unwrap()[1];

    assert_eq!(batched.hidden_state, alone.hidden_state);
    assert_eq!(batched.risk_probs, alone.risk_probs);
    assert_eq!(batched.burnout_probability, alone.burnout_probability);
    assert_eq!(batched.recommendation_probs, alone.recommendation_probs);
    assert_eq!(batched.risk_category, alone.risk_category);
}

#[test]
fn overflowing_signal_is_an_error_not_nan() {
    let model = shared_model();
    let huge = vec![Observation::new(3.0e38, 1.0, 1.0, 0, 9); 3];
    assert!(matches!(
        model.predict(&[huge]),
        Err(ResonanceError::NonFinite(_))
    ));

    // other requests are unaffected
    let predictions = model.predict(&[declining_week()]).unwrap();
    assert_distribution(&predictions[0].risk_probs);
}

#[test]
fn snapshot_json_round_trip() {
    let source = ResonanceTransformer::new(small_config()).unwrap();
    let json = serde_json::to_string(&source.to_snapshot()).unwrap();
    let restored: ParameterSnapshot = serde_json::from_str(&json).unwrap();

    let loaded = ResonanceTransformer::from_snapshot(
        ModelConfig {
            seed: 1234,
            ..small_config()
        },
        &restored,
    )
    .unwrap();
    assert_eq!(loaded.parameter_count(), source.parameter_count());

    let week = declining_week();
    let a = source.predict(&[week.clone()]).unwrap();
    let b = loaded.predict(&[week]).unwrap();
    assert_eq!(a[0].risk_probs, b[0].risk_probs);
    assert_eq!(a[0].burnout_probability, b[0].burnout_probability);
}

#[test]
fn snapshot_for_other_architecture_rejected() {
    let snapshot = ResonanceTransformer::new(small_config()).unwrap().to_snapshot();
    let wider = ModelConfig {
        d_model: 64,
        ..small_config()
    };
    assert!(matches!(
        ResonanceTransformer::from_snapshot(wider, &snapshot),
        Err(ResonanceError::ShapeMismatch { .. })
    ));
}

#[test]
fn concurrent_readers_survive_swap() {
    let handle = ModelHandle::new(ResonanceTransformer::new(small_config()).unwrap());
    let expected = handle.current().predict(&[declining_week()]).unwrap()[0].risk_probs.clone();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            thread::spawn(move || {
                let model = handle.current();
                model.predict(&[declining_week()]).unwrap()[0].risk_probs.clone()
            })
        })
        .collect();

    let replacement = ResonanceTransformer::new(ModelConfig {
        seed: 7,
        ..small_config()
    })
    .unwrap();
    let previous = handle.swap(replacement);

    for reader in readers {
        let probs = reader.join().unwrap();
        assert_eq!(probs.len(), 4);
        assert_distribution(&probs);
    }
    assert_eq!(previous.predict(&[declining_week()]).unwrap()[0].risk_probs, expected);
    assert!(!Arc::ptr_eq(&previous, &handle.current()));
}

#[test]
fn fresh_model_is_healthy() {
    let report = diagnose_parameters(shared_model());
    assert!(report.is_healthy);
    assert_eq!(report.value_count, shared_model().parameter_count());
}

#[test]
fn ranked_recommendations_use_catalog_text() {
    let prediction = &shared_model().predict(&[declining_week()]).unwrap()[0];
    let top = RecommendationCatalog::default().top_k(&prediction.recommendation_probs, 3);
    assert_eq!(top.len(), 3);
    assert!(top[0].score >= top[1].score && top[1].score >= top[2].score);
    assert!(top.iter().all(|r| DEFAULT_TEMPLATES.contains(&r.text.as_str())));
}

#[test]
fn rule_based_fallback_caps_at_five() {
    let picks = fallback_recommendations(1.5, 90.0);
    assert_eq!(picks.len(), 5);
    assert_eq!(picks.last(), Some(&DEFAULT_TEMPLATES[8]));
}
