//! Output heads over the sequence summary vector.
//!
//! Each head is `Linear → GELU → (Dropout) → Linear`; the two linears sit at
//! positions 0 and 3 of the block, which is how their parameters are named.
//!
//! | head           | widths                      | activation |
//! |----------------|-----------------------------|------------|
//! | risk           | d → d/2 → 4                 | softmax    |
//! | burnout        | d → d/2 → 1                 | sigmoid    |
//! | recommendation | d → d → n_recommendations   | softmax    |

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use crate::layers::Linear;
use crate::matrix::{gelu, sigmoid, softmax_rows};
use crate::model::params::{join, ParamMut, ParamRef, Parameterized};

// ==================== MLP Head ====================

#[derive(Debug, Clone)]
pub struct MlpHead {
    fc1: Linear,
    fc2: Linear,
}

impl MlpHead {
    pub fn new<R: Rng + ?Sized>(in_dim: usize, hidden: usize, out_dim: usize, rng: &mut R) -> Self {
        Self {
            fc1: Linear::new(in_dim, hidden, rng),
            fc2: Linear::new(hidden, out_dim, rng),
        }
    }

    pub fn out_dim(&self) -> usize {
        self.fc2.out_features()
    }

    /// Raw logits `(batch, out_dim)`.
    pub fn forward(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut hidden = self.fc1.forward(x);
        hidden.mapv_inplace(gelu);
        self.fc2.forward(hidden.view())
    }
}

impl Parameterized for MlpHead {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        self.fc1.visit_params(&join(prefix, "0"), f);
        self.fc2.visit_params(&join(prefix, "3"), f);
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        self.fc1.visit_params_mut(&join(prefix, "0"), f);
        self.fc2.visit_params_mut(&join(prefix, "3"), f);
    }
}

// ==================== Prediction Heads ====================

/// Logits and activated outputs of all three heads for one batch.
#[derive(Debug, Clone)]
pub struct HeadOutputs {
    pub risk_logits: Array2<f32>,
    pub risk_probs: Array2<f32>,
    pub burnout_probability: Array1<f32>,
    pub recommendation_logits: Array2<f32>,
    pub recommendation_probs: Array2<f32>,
}

#[derive(Debug, Clone)]
pub struct PredictionHeads {
    risk: MlpHead,
    burnout: MlpHead,
    recommendation: MlpHead,
}

impl PredictionHeads {
    pub fn new<R: Rng + ?Sized>(
        d_model: usize,
        n_risk_classes: usize,
        n_recommendations: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            risk: MlpHead::new(d_model, d_model / 2, n_risk_classes, rng),
            burnout: MlpHead::new(d_model, d_model / 2, 1, rng),
            recommendation: MlpHead::new(d_model, d_model, n_recommendations, rng),
        }
    }

    pub fn n_recommendations(&self) -> usize {
        self.recommendation.out_dim()
    }

    /// `summary` is `(batch, d_model)`, one row per sample.
    pub fn forward(&self, summary: ArrayView2<'_, f32>) -> HeadOutputs {
        let risk_logits = self.risk.forward(summary);
        let risk_probs = softmax_rows(&risk_logits);

        let burnout_probability = self
            .burnout
            .forward(summary)
            .index_axis(Axis(1), 0)
            .mapv(sigmoid);

        let recommendation_logits = self.recommendation.forward(summary);
        let recommendation_probs = softmax_rows(&recommendation_logits);

        HeadOutputs {
            risk_logits,
            risk_probs,
            burnout_probability,
            recommendation_logits,
            recommendation_probs,
        }
    }
}

impl Parameterized for PredictionHeads {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        self.risk.visit_params(&join(prefix, "risk_head"), f);
        self.burnout.visit_params(&join(prefix, "burnout_head"), f);
        self.recommendation.visit_params(&join(prefix, "recommendation_head"), f);
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        self.risk.visit_params_mut(&join(prefix, "risk_head"), f);
        self.burnout.visit_params_mut(&join(prefix, "burnout_head"), f);
        self.recommendation
            .visit_params_mut(&join(prefix, "recommendation_head"), f);
    }
}
