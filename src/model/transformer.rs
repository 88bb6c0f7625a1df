//! ResonanceTransformer assembly.
//!
//! FeatureEncoder → PositionalEncoding → N × EncoderLayer (shared mask)
//! → final LayerNorm → last-timestep summary → risk / burnout /
//! recommendation heads.
//!
//! The summary is the hidden vector at the *last* sequence position. Batches
//! built by [`crate::sequence::build_batch`] are right-aligned so that
//! position always holds the most recent real observation. Non-finite
//! intermediate results (e.g. overflow from huge finite signals) fail the
//! call with `NonFinite`.

use ndarray::{s, Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::error::{ResonanceError, Result};
use crate::layers::LayerNorm;
use crate::matrix::argmax;
use crate::model::attention::AttentionMask;
use crate::model::encoder::EncoderStack;
use crate::model::features::EmotionalFeatureEncoder;
use crate::model::heads::PredictionHeads;
use crate::model::init::xavier_uniform_;
use crate::model::params::{join, ParamMut, ParamRef, Parameterized};
use crate::model::positional::PositionalEncoding;
use crate::sanitize::{check_finite, check_index_range};
use crate::sequence::{build_batch, SequenceBatch};
use crate::types::{Observation, Prediction, RiskCategory, DAYS_PER_WEEK, HOURS_PER_DAY, N_RISK_CLASSES};

// ==================== Input Batch ====================

/// Forward-pass inputs.
///
/// - `mood`, `energy`, `stress`: `(batch, seq, 1)`
/// - `day_of_week`: `(batch, seq)`, values 0..=6
/// - `hour_of_day`: `(batch, seq)`, values 0..=23
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionalBatch {
    pub mood: Array3<f32>,
    pub energy: Array3<f32>,
    pub stress: Array3<f32>,
    pub day_of_week: Array2<i64>,
    pub hour_of_day: Array2<i64>,
}

impl EmotionalBatch {
    pub fn new(
        mood: Array3<f32>,
        energy: Array3<f32>,
        stress: Array3<f32>,
        day_of_week: Array2<i64>,
        hour_of_day: Array2<i64>,
    ) -> Self {
        Self {
            mood,
            energy,
            stress,
            day_of_week,
            hour_of_day,
        }
    }

    /// Batch of `batch` identical sequences with constant signals.
    /// `hours` shorter or longer than `days` surfaces as a shape mismatch on forward.
    pub fn constant(
        batch: usize,
        mood: f32,
        energy: f32,
        stress: f32,
        days: &[i64],
        hours: &[i64],
    ) -> Self {
        let seq_len = days.len();
        Self {
            mood: Array3::from_elem((batch, seq_len, 1), mood),
            energy: Array3::from_elem((batch, seq_len, 1), energy),
            stress: Array3::from_elem((batch, seq_len, 1), stress),
            day_of_week: Array2::from_shape_fn((batch, seq_len), |(_, t)| days[t]),
            hour_of_day: Array2::from_shape_fn((batch, hours.len()), |(_, t)| hours[t]),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.mood.len_of(Axis(0))
    }

    pub fn seq_len(&self) -> usize {
        self.mood.len_of(Axis(1))
    }

    /// Shape, length and finiteness checks; returns `(batch, seq_len)`.
    fn validate(&self, max_seq_len: usize) -> Result<(usize, usize)> {
        let (batch, seq_len) = (self.batch_size(), self.seq_len());
        if batch == 0 {
            return Err(ResonanceError::EmptyInput("batch"));
        }
        if seq_len == 0 {
            return Err(ResonanceError::EmptyInput("sequence"));
        }

        let signal_shape = vec![batch, seq_len, 1];
        for (name, signal) in [("mood", &self.mood), ("energy", &self.energy), ("stress", &self.stress)] {
            expect_shape(name, &signal_shape, signal.shape())?;
        }
        let index_shape = vec![batch, seq_len];
        expect_shape("day_of_week", &index_shape, self.day_of_week.shape())?;
        expect_shape("hour_of_day", &index_shape, self.hour_of_day.shape())?;

        if seq_len > max_seq_len {
            return Err(ResonanceError::SequenceTooLong { seq_len, max_len: max_seq_len });
        }

        check_finite("mood", self.mood.iter())?;
        check_finite("energy", self.energy.iter())?;
        check_finite("stress", self.stress.iter())?;

        Ok((batch, seq_len))
    }
}

fn expect_shape(name: &str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(ResonanceError::ShapeMismatch {
            name: name.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

// ==================== Model Output ====================

#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// (batch, 4)
    pub risk_logits: Array2<f32>,
    /// (batch, 4), rows sum to 1
    pub risk_probs: Array2<f32>,
    /// Arg-max of each `risk_probs` row
    pub risk_categories: Vec<RiskCategory>,
    /// (batch,), each in [0, 1]
    pub burnout_probability: Array1<f32>,
    /// (batch, n_recommendations)
    pub recommendation_logits: Array2<f32>,
    /// (batch, n_recommendations), rows sum to 1
    pub recommendation_probs: Array2<f32>,
    /// (batch, d_model), final-normalized last timestep
    pub hidden_state: Array2<f32>,
}

impl ModelOutput {
    pub fn batch_size(&self) -> usize {
        self.risk_probs.nrows()
    }

    /// Splits the batch into per-sample predictions.
    pub fn predictions(&self) -> Vec<Prediction> {
        (0..self.batch_size())
            .map(|i| Prediction {
                risk_probs: self.risk_probs.row(i).to_vec(),
                risk_category: self.risk_categories[i],
                burnout_probability: self.burnout_probability[i],
                recommendation_probs: self.recommendation_probs.row(i).to_vec(),
                hidden_state: self.hidden_state.row(i).to_vec(),
            })
            .collect()
    }
}

/// Maps each row of `(batch, 4)` risk probabilities to its arg-max category.
///
/// Ties resolve toward the lower index, i.e. the less severe category.
pub fn risk_categories(probs: ArrayView2<'_, f32>) -> Result<Vec<RiskCategory>> {
    if probs.ncols() != N_RISK_CLASSES {
        return Err(ResonanceError::ShapeMismatch {
            name: "risk_probs".to_string(),
            expected: vec![probs.nrows(), N_RISK_CLASSES],
            actual: probs.shape().to_vec(),
        });
    }
    probs
        .rows()
        .into_iter()
        .map(|row| {
            RiskCategory::from_index(argmax(row.iter()))
                .ok_or_else(|| ResonanceError::InvalidConfig("risk index out of range".into()))
        })
        .collect()
}

// ==================== ResonanceTransformer ====================

#[derive(Debug, Clone)]
pub struct ResonanceTransformer {
    config: ModelConfig,
    feature_encoder: EmotionalFeatureEncoder,
    pos_encoding: PositionalEncoding,
    encoder_layers: EncoderStack,
    final_norm: LayerNorm,
    heads: PredictionHeads,
}

impl ResonanceTransformer {
    /// Builds and Xavier-initializes a model; weights depend only on `config.seed`.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut model = Self {
            feature_encoder: EmotionalFeatureEncoder::new(config.d_model, &mut rng),
            pos_encoding: PositionalEncoding::new(config.d_model, config.max_seq_len),
            encoder_layers: EncoderStack::new(
                config.n_layers,
                config.d_model,
                config.n_heads,
                config.d_ff,
                &mut rng,
            )?,
            final_norm: LayerNorm::new(config.d_model),
            heads: PredictionHeads::new(
                config.d_model,
                config.n_risk_classes,
                config.n_recommendations,
                &mut rng,
            ),
            config,
        };
        let initialized = xavier_uniform_(&mut model, &mut rng);

        info!(
            d_model = model.config.d_model,
            n_heads = model.config.n_heads,
            n_layers = model.config.n_layers,
            parameters = model.parameter_count(),
            xavier_tensors = initialized,
            "resonance transformer constructed"
        );
        Ok(model)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn pos_encoding(&self) -> &PositionalEncoding {
        &self.pos_encoding
    }

    pub fn encoder_layers(&self) -> &EncoderStack {
        &self.encoder_layers
    }

    pub fn n_recommendations(&self) -> usize {
        self.heads.n_recommendations()
    }

    /// Runs the full pipeline over a batch.
    ///
    /// `mask` (true = attend) must broadcast to `(batch, seq, seq)`. Any
    /// violated precondition fails the whole call; there is no partial output.
    pub fn forward(&self, batch: &EmotionalBatch, mask: Option<&AttentionMask>) -> Result<ModelOutput> {
        let (batch_size, seq_len) = batch.validate(self.config.max_seq_len)?;
        let mask = mask.map(|m| m.broadcast_to(batch_size, seq_len)).transpose()?;
        let starts = vec![0; batch_size];
        self.run(batch, mask.as_ref(), &starts)
    }

    /// Runs a right-aligned batch from [`build_batch`].
    ///
    /// Each row is encoded from its first real observation, so the padding is
    /// never seen and position `p` of a sequence always receives `PE(p)`.
    /// A sequence's output does not depend on what it was batched with.
    pub fn forward_sequences(&self, sequences: &SequenceBatch) -> Result<ModelOutput> {
        let (batch_size, seq_len) = sequences.batch.validate(self.config.max_seq_len)?;
        if sequences.lengths.len() != batch_size {
            return Err(ResonanceError::ShapeMismatch {
                name: "lengths".to_string(),
                expected: vec![batch_size],
                actual: vec![sequences.lengths.len()],
            });
        }
        let starts = sequences
            .lengths
            .iter()
            .map(|&len| match len {
                0 => Err(ResonanceError::EmptyInput("sequence")),
                _ => seq_len.checked_sub(len).ok_or(ResonanceError::SequenceTooLong {
                    seq_len: len,
                    max_len: seq_len,
                }),
            })
            .collect::<Result<Vec<usize>>>()?;
        self.run(&sequences.batch, None, &starts)
    }

    /// Shared pipeline; sample `i` is encoded from step `starts[i]` onward.
    fn run(
        &self,
        batch: &EmotionalBatch,
        mask: Option<&ArrayView3<'_, bool>>,
        starts: &[usize],
    ) -> Result<ModelOutput> {
        let batch_size = batch.batch_size();
        let days = check_index_range("day_of_week", batch.day_of_week.view(), DAYS_PER_WEEK - 1)?;
        let hours = check_index_range("hour_of_day", batch.hour_of_day.view(), HOURS_PER_DAY - 1)?;

        debug!(batch_size, seq_len = batch.seq_len(), masked = mask.is_some(), "forward pass");

        let summaries = (0..batch_size)
            .into_par_iter()
            .map(|i| self.encode_sample(batch, &days[i], &hours[i], mask, i, starts[i]))
            .collect::<Result<Vec<Array1<f32>>>>()?;

        let d_model = self.config.d_model;
        let hidden_state = Array2::from_shape_fn((batch_size, d_model), |(i, j)| summaries[i][j]);
        check_finite("hidden_state", hidden_state.iter())?;

        let heads = self.heads.forward(hidden_state.view());
        check_finite("risk_logits", heads.risk_logits.iter())?;
        check_finite("burnout_probability", heads.burnout_probability.iter())?;
        check_finite("recommendation_logits", heads.recommendation_logits.iter())?;
        let risk_categories = risk_categories(heads.risk_probs.view())?;

        Ok(ModelOutput {
            risk_logits: heads.risk_logits,
            risk_probs: heads.risk_probs,
            risk_categories,
            burnout_probability: heads.burnout_probability,
            recommendation_logits: heads.recommendation_logits,
            recommendation_probs: heads.recommendation_probs,
            hidden_state,
        })
    }

    /// Encodes steps `start..` of sample `i` and returns the final-normalized
    /// last-step vector.
    fn encode_sample(
        &self,
        batch: &EmotionalBatch,
        days: &[usize],
        hours: &[usize],
        mask: Option<&ArrayView3<'_, bool>>,
        i: usize,
        start: usize,
    ) -> Result<Array1<f32>> {
        let mut x = self.feature_encoder.forward(
            batch.mood.slice(s![i, start.., ..]),
            batch.energy.slice(s![i, start.., ..]),
            batch.stress.slice(s![i, start.., ..]),
            &days[start..],
            &hours[start..],
        );
        self.pos_encoding.forward(&mut x)?;

        let sample_mask = mask.map(|m| m.slice(s![i, start.., start..]));
        let x = self.encoder_layers.forward(x, sample_mask);

        let last = x.nrows() - 1;
        let summary = self.final_norm.forward(x.slice(s![last.., ..]));
        Ok(summary.index_axis_move(Axis(0), 0))
    }

    /// Batches raw observation sequences and predicts each independently.
    pub fn predict(&self, sequences: &[Vec<Observation>]) -> Result<Vec<Prediction>> {
        let batch = build_batch(sequences, self.config.max_seq_len)?;
        let output = self.forward_sequences(&batch)?;
        Ok(output.predictions())
    }
}

impl Parameterized for ResonanceTransformer {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        self.feature_encoder
            .visit_params(&join(prefix, "feature_encoder"), f);
        self.encoder_layers
            .visit_params(&join(prefix, "encoder_layers"), f);
        self.final_norm.visit_params(&join(prefix, "final_norm"), f);
        self.heads.visit_params(prefix, f);
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        self.feature_encoder
            .visit_params_mut(&join(prefix, "feature_encoder"), f);
        self.encoder_layers
            .visit_params_mut(&join(prefix, "encoder_layers"), f);
        self.final_norm
            .visit_params_mut(&join(prefix, "final_norm"), f);
        self.heads.visit_params_mut(prefix, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ArrayD, IxDyn};

    fn small_config() -> ModelConfig {
        ModelConfig {
            d_model: 32,
            n_heads: 4,
            n_layers: 2,
            d_ff: 64,
            ..ModelConfig::default()
        }
    }

    fn weekday_batch(batch: usize) -> EmotionalBatch {
        EmotionalBatch::constant(batch, 0.5, 0.5, 0.5, &[0, 1, 2, 3, 4], &[9, 9, 9, 9, 9])
    }

    fn assert_distribution(probs: &Array2<f32>) {
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-5, "row sums to {}", row.sum());
            assert!(row.iter().all(|&p| p >= 0.0));
        }
    }

    // ==================== scenarios ====================

    #[test]
    fn test_default_config_weekday_sequence() {
        let model = ResonanceTransformer::new(ModelConfig::default()).unwrap();
        let out = model.forward(&weekday_batch(1), None).unwrap();

        assert_eq!(out.risk_probs.shape(), &[1, 4]);
        assert_distribution(&out.risk_probs);
        assert_eq!(out.burnout_probability.len(), 1);
        assert!((0.0..=1.0).contains(&out.burnout_probability[0]));
        assert_eq!(out.recommendation_probs.shape(), &[1, 10]);
        assert_distribution(&out.recommendation_probs);
        assert_eq!(out.hidden_state.shape(), &[1, 256]);
    }

    #[test]
    fn test_single_step_sequence() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let batch = EmotionalBatch::constant(2, 3.0, 2.0, 4.0, &[5], &[22]);
        let out = model.forward(&batch, None).unwrap();
        assert_distribution(&out.risk_probs);

        let layer = &model.encoder_layers().layers()[0];
        let x = Array2::from_elem((1, 32), 0.3f32);
        let (_, weights) = layer.self_attn().forward_with_weights(x.view(), None);
        assert!(weights.iter().all(|w| w[[0, 0]] == 1.0));
    }

    #[test]
    fn test_risk_lookup_picks_at_risk() {
        let cats = risk_categories(array![[0.1f32, 0.2, 0.3, 0.4]].view()).unwrap();
        assert_eq!(cats, vec![RiskCategory::AtRisk]);
        assert_eq!(cats[0].as_str(), "at-risk");
    }

    #[test]
    fn test_indivisible_heads_fail_construction() {
        let config = ModelConfig {
            d_model: 100,
            n_heads: 7,
            ..ModelConfig::default()
        };
        assert_eq!(
            ResonanceTransformer::new(config).unwrap_err(),
            ResonanceError::HeadsNotDivisible {
                d_model: 100,
                n_heads: 7
            }
        );
    }

    // ==================== risk lookup ====================

    #[test]
    fn test_risk_lookup_ties_and_width() {
        let cats = risk_categories(array![[0.25f32, 0.25, 0.25, 0.25], [0.4, 0.4, 0.1, 0.1]].view())
            .unwrap();
        assert_eq!(cats, vec![RiskCategory::Thriving, RiskCategory::Thriving]);
        assert!(risk_categories(array![[0.5f32, 0.5]].view()).is_err());
    }

    // ==================== invariants ====================

    #[test]
    fn test_forward_is_deterministic() {
        let a = ResonanceTransformer::new(small_config()).unwrap();
        let b = ResonanceTransformer::new(small_config()).unwrap();
        let batch = weekday_batch(3);
        let out_a = a.forward(&batch, None).unwrap();
        let out_b = b.forward(&batch, None).unwrap();
        assert_eq!(out_a.risk_logits, out_b.risk_logits);
        assert_eq!(out_a.burnout_probability, out_b.burnout_probability);
        assert_eq!(out_a.hidden_state, out_b.hidden_state);
    }

    #[test]
    fn test_samples_are_independent() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let single = model.forward(&weekday_batch(1), None).unwrap();
        let many = model.forward(&weekday_batch(4), None).unwrap();
        for i in 0..4 {
            assert_eq!(many.hidden_state.row(i), single.hidden_state.row(0));
        }
    }

    #[test]
    fn test_parameter_names_cover_module_tree() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let names = model.parameter_names();
        assert!(names.contains(&"feature_encoder.combine.weight".to_string()));
        assert!(names.contains(&"encoder_layers.1.self_attn.w_q.weight".to_string()));
        assert!(names.contains(&"final_norm.bias".to_string()));
        assert!(names.contains(&"burnout_head.3.weight".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("pos_encoding")));
        // 12 encoder + 2 × 16 layer + 2 final norm + 12 heads
        assert_eq!(names.len(), 58);
    }

    #[test]
    fn test_padding_values_invisible_behind_mask() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let mut mask = Array3::from_elem((1, 1, 5), true);
        mask[[0, 0, 0]] = false;
        mask[[0, 0, 1]] = false;
        let mask = AttentionMask::new(mask.into_dyn());

        let clean = weekday_batch(1);
        let mut noisy = clean.clone();
        noisy.mood[[0, 0, 0]] = 9.0;
        noisy.stress[[0, 1, 0]] = -4.0;
        noisy.hour_of_day[[0, 0]] = 3;

        let a = model.forward(&clean, Some(&mask)).unwrap();
        let b = model.forward(&noisy, Some(&mask)).unwrap();
        for (x, y) in a.hidden_state.iter().zip(b.hidden_state.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_right_aligned_rows_use_positions_from_zero() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let week: Vec<Observation> = (0..5u8)
            .map(|d| Observation::new(3.0 - 0.3 * d as f32, 2.5, 2.0 + 0.4 * d as f32, d, 9))
            .collect();
        let short = week[2..].to_vec();

        let alone = model.forward_sequences(&build_batch(&[short.clone()], 90).unwrap()).unwrap();
        let mut padded = build_batch(&[week, short], 90).unwrap();
        assert_eq!(padded.padding(1), 2);
        let batched = model.forward_sequences(&padded).unwrap();
        assert_eq!(batched.hidden_state.row(1), alone.hidden_state.row(0));
        assert_eq!(batched.risk_logits.row(1), alone.risk_logits.row(0));

        // padded slots are never encoded
        padded.batch.mood[[1, 0, 0]] = 7.5;
        padded.batch.hour_of_day[[1, 1]] = 17;
        let noisy = model.forward_sequences(&padded).unwrap();
        assert_eq!(noisy.hidden_state, batched.hidden_state);
    }

    #[test]
    fn test_forward_sequences_checks_lengths() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let seq = vec![Observation::new(3.0, 3.0, 3.0, 1, 8); 3];
        let mut batch = build_batch(&[seq], 90).unwrap();
        batch.lengths.push(2);
        assert!(matches!(
            model.forward_sequences(&batch),
            Err(ResonanceError::ShapeMismatch { ref name, .. }) if name == "lengths"
        ));
        batch.lengths = vec![4];
        assert!(matches!(
            model.forward_sequences(&batch),
            Err(ResonanceError::SequenceTooLong { .. })
        ));
    }

    // ==================== error paths ====================

    #[test]
    fn test_rejects_out_of_range_indices() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let bad_day = EmotionalBatch::constant(1, 0.5, 0.5, 0.5, &[0, 7], &[9, 9]);
        assert!(matches!(
            model.forward(&bad_day, None),
            Err(ResonanceError::IndexOutOfRange { field: "day_of_week", value: 7, .. })
        ));
        let bad_hour = EmotionalBatch::constant(1, 0.5, 0.5, 0.5, &[0, 1], &[24, 9]);
        assert!(matches!(
            model.forward(&bad_hour, None),
            Err(ResonanceError::IndexOutOfRange { field: "hour_of_day", .. })
        ));
    }

    #[test]
    fn test_rejects_mismatched_shapes() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let mut batch = weekday_batch(2);
        batch.energy = Array3::zeros((2, 4, 1));
        assert!(matches!(
            model.forward(&batch, None),
            Err(ResonanceError::ShapeMismatch { ref name, .. }) if name == "energy"
        ));

        let mut batch = weekday_batch(2);
        batch.hour_of_day = Array2::zeros((1, 5));
        assert!(matches!(
            model.forward(&batch, None),
            Err(ResonanceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_too_long_and_empty() {
        let model = ResonanceTransformer::new(ModelConfig {
            max_seq_len: 4,
            ..small_config()
        })
        .unwrap();
        assert_eq!(
            model.forward(&weekday_batch(1), None).unwrap_err(),
            ResonanceError::SequenceTooLong {
                seq_len: 5,
                max_len: 4
            }
        );
        let empty = EmotionalBatch::constant(0, 0.5, 0.5, 0.5, &[0], &[0]);
        assert_eq!(
            model.forward(&empty, None).unwrap_err(),
            ResonanceError::EmptyInput("batch")
        );
    }

    #[test]
    fn test_rejects_non_finite_and_bad_mask() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let mut batch = weekday_batch(1);
        batch.stress[[0, 2, 0]] = f32::NAN;
        assert_eq!(
            model.forward(&batch, None).unwrap_err(),
            ResonanceError::NonFinite("stress".into())
        );

        let mask = AttentionMask::new(ArrayD::from_elem(IxDyn(&[3, 3]), true));
        assert!(matches!(
            model.forward(&weekday_batch(1), Some(&mask)),
            Err(ResonanceError::MaskNotBroadcastable { .. })
        ));
    }

    #[test]
    fn test_overflowing_signal_fails_instead_of_nan() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let batch = EmotionalBatch::constant(1, 3.0e38, 1.0, 1.0, &[0, 0, 0], &[9, 9, 9]);
        assert!(matches!(
            model.forward(&batch, None),
            Err(ResonanceError::NonFinite(_))
        ));
    }

    #[test]
    fn test_predict_splits_batch() {
        let model = ResonanceTransformer::new(small_config()).unwrap();
        let seq = vec![
            Observation::new(3.0, 3.5, 2.0, 0, 9),
            Observation::new(2.5, 3.0, 3.0, 1, 10),
        ];
        let preds = model.predict(&[seq.clone(), seq[..1].to_vec()]).unwrap();
        assert_eq!(preds.len(), 2);
        for p in &preds {
            assert_eq!(p.risk_probs.len(), 4);
            assert_eq!(p.recommendation_probs.len(), 10);
            assert_eq!(p.hidden_state.len(), 32);
            assert_eq!(p.risk_category, RiskCategory::from_index(argmax(&p.risk_probs)).unwrap());
        }
    }
}
