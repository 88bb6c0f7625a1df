use ndarray::{Array2, ArrayView2};
use rand::Rng;

use crate::layers::Linear;
use crate::matrix::gelu;
use crate::model::params::{join, ParamMut, ParamRef, Parameterized};

/// Position-wise `linear2(GELU(linear1(x)))`, d_model → d_ff → d_model.
#[derive(Debug, Clone)]
pub struct FeedForward {
    linear1: Linear,
    linear2: Linear,
}

impl FeedForward {
    pub fn new<R: Rng + ?Sized>(d_model: usize, d_ff: usize, rng: &mut R) -> Self {
        Self {
            linear1: Linear::new(d_model, d_ff, rng),
            linear2: Linear::new(d_ff, d_model, rng),
        }
    }

    pub fn d_ff(&self) -> usize {
        self.linear1.out_features()
    }

    pub fn forward(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut hidden = self.linear1.forward(x);
        hidden.mapv_inplace(gelu);
        self.linear2.forward(hidden.view())
    }
}

impl Parameterized for FeedForward {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        self.linear1.visit_params(&join(prefix, "linear1"), f);
        self.linear2.visit_params(&join(prefix, "linear2"), f);
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        self.linear1.visit_params_mut(&join(prefix, "linear1"), f);
        self.linear2.visit_params_mut(&join(prefix, "linear2"), f);
    }
}
