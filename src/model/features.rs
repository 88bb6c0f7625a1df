//! Emotional feature encoder.
//!
//! Continuous signals (mood, energy, stress) go through independent scalar
//! projections into disjoint slices of width ≈ d_model/3 (the remainder lands
//! on stress). Day-of-week and hour-of-day use lookup tables of width
//! d_model/4. The five parts are concatenated, projected back to d_model and
//! layer-normalized.

use ndarray::{s, Array2, ArrayView2};
use rand::Rng;

use crate::layers::{Embedding, LayerNorm, Linear};
use crate::model::params::{join, ParamMut, ParamRef, Parameterized};
use crate::types::{DAYS_PER_WEEK, HOURS_PER_DAY};

#[derive(Debug, Clone)]
pub struct EmotionalFeatureEncoder {
    mood_proj: Linear,
    energy_proj: Linear,
    stress_proj: Linear,
    day_embed: Embedding,
    hour_embed: Embedding,
    combine: Linear,
    norm: LayerNorm,
}

impl EmotionalFeatureEncoder {
    pub fn new<R: Rng + ?Sized>(d_model: usize, rng: &mut R) -> Self {
        let third = d_model / 3;
        let quarter = d_model / 4;
        let stress_width = third + d_model % 3;
        let combined_width = 2 * third + stress_width + 2 * quarter;

        Self {
            mood_proj: Linear::new(1, third, rng),
            energy_proj: Linear::new(1, third, rng),
            stress_proj: Linear::new(1, stress_width, rng),
            day_embed: Embedding::new(DAYS_PER_WEEK, quarter, rng),
            hour_embed: Embedding::new(HOURS_PER_DAY, quarter, rng),
            combine: Linear::new(combined_width, d_model, rng),
            norm: LayerNorm::new(d_model),
        }
    }

    pub fn d_model(&self) -> usize {
        self.combine.out_features()
    }

    /// Width of the concatenated sub-embeddings fed to `combine`.
    pub fn combined_width(&self) -> usize {
        self.combine.in_features()
    }

    /// Encodes one sequence.
    ///
    /// `mood`, `energy` and `stress` are `(seq_len, 1)`; `days` and `hours`
    /// hold one already range-checked index per step.
    pub fn forward(
        &self,
        mood: ArrayView2<'_, f32>,
        energy: ArrayView2<'_, f32>,
        stress: ArrayView2<'_, f32>,
        days: &[usize],
        hours: &[usize],
    ) -> Array2<f32> {
        let parts = [
            self.mood_proj.forward(mood),
            self.energy_proj.forward(energy),
            self.stress_proj.forward(stress),
            self.day_embed.forward(days),
            self.hour_embed.forward(hours),
        ];

        let mut combined = Array2::<f32>::zeros((mood.nrows(), self.combined_width()));
        let mut offset = 0;
        for part in &parts {
            let width = part.ncols();
            combined
                .slice_mut(s![.., offset..offset + width])
                .assign(part);
            offset += width;
        }

        let projected = self.combine.forward(combined.view());
        self.norm.forward(projected.view())
    }
}

impl Parameterized for EmotionalFeatureEncoder {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        self.mood_proj.visit_params(&join(prefix, "mood_proj"), f);
        self.energy_proj.visit_params(&join(prefix, "energy_proj"), f);
        self.stress_proj.visit_params(&join(prefix, "stress_proj"), f);
        self.day_embed.visit_params(&join(prefix, "day_embed"), f);
        self.hour_embed.visit_params(&join(prefix, "hour_embed"), f);
        self.combine.visit_params(&join(prefix, "combine"), f);
        self.norm.visit_params(&join(prefix, "norm"), f);
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        self.mood_proj.visit_params_mut(&join(prefix, "mood_proj"), f);
        self.energy_proj.visit_params_mut(&join(prefix, "energy_proj"), f);
        self.stress_proj.visit_params_mut(&join(prefix, "stress_proj"), f);
        self.day_embed.visit_params_mut(&join(prefix, "day_embed"), f);
        self.hour_embed.visit_params_mut(&join(prefix, "hour_embed"), f);
        self.combine.visit_params_mut(&join(prefix, "combine"), f);
        self.norm.visit_params_mut(&join(prefix, "norm"), f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_slice_widths() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let encoder = EmotionalFeatureEncoder::new(256, &mut rng);
        assert_eq!(encoder.mood_proj.out_features(), 85);
        assert_eq!(encoder.energy_proj.out_features(), 85);
        assert_eq!(encoder.stress_proj.out_features(), 86);
        assert_eq!(encoder.day_embed.dim(), 64);
        assert_eq!(encoder.hour_embed.num_embeddings(), 24);
        assert_eq!(encoder.combined_width(), 256 + 128);
    }

    #[test]
    fn test_output_is_normalized_per_step() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let encoder = EmotionalFeatureEncoder::new(32, &mut rng);
        let signal = Array2::from_elem((4, 1), 0.5f32);
        let out = encoder.forward(
            signal.view(),
            signal.view(),
            signal.view(),
            &[0, 1, 2, 6],
            &[9, 9, 23, 0],
        );
        assert_eq!(out.shape(), &[4, 32]);
        for row in out.rows() {
            let mean = row.sum() / 32.0;
            assert!(mean.abs() < 1e-4);
        }
    }

    #[test]
    fn test_day_context_changes_embedding() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let encoder = EmotionalFeatureEncoder::new(24, &mut rng);
        let signal = Array2::from_elem((2, 1), 0.2f32);
        let out = encoder.forward(signal.view(), signal.view(), signal.view(), &[0, 5], &[8, 8]);
        assert_ne!(out.row(0), out.row(1));
    }

    #[test]
    fn test_parameter_names_follow_module_tree() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let encoder = EmotionalFeatureEncoder::new(12, &mut rng);
        let names = encoder.parameter_names();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "mood_proj.weight");
        assert!(names.contains(&"day_embed.weight".to_string()));
        assert!(names.contains(&"norm.bias".to_string()));
    }
}
