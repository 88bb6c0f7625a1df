//! Building blocks: affine projection, layer normalization, lookup table.
//!
//! All layers operate on one sample at a time, `(seq_len, features)`.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::error::{ResonanceError, Result};
use crate::model::params::{join, ParamMut, ParamRef, Parameterized};
use crate::types::LAYER_NORM_EPS;

// ==================== Linear ====================

/// Affine map `y = x·Wᵀ + b`, weight stored `(out_features, in_features)`.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl Linear {
    /// Weight and bias drawn from `U(-1/√in, 1/√in)`.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features.max(1) as f32).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        Self {
            weight: Array2::from_shape_simple_fn((out_features, in_features), || dist.sample(&mut *rng)),
            bias: Array1::from_shape_simple_fn(out_features, || dist.sample(&mut *rng)),
        }
    }

    /// Wraps explicit parameters; `bias` must have one entry per output row.
    pub fn from_parts(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self> {
        if weight.nrows() != bias.len() {
            return Err(ResonanceError::ShapeMismatch {
                name: "bias".to_string(),
                expected: vec![weight.nrows()],
                actual: vec![bias.len()],
            });
        }
        Ok(Self { weight, bias })
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn weight(&self) -> &Array2<f32> {
        &self.weight
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    pub fn forward(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut y = x.dot(&self.weight.t());
        y += &self.bias;
        y
    }
}

impl Parameterized for Linear {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        f(&join(prefix, "weight"), ParamRef::Matrix(&self.weight));
        f(&join(prefix, "bias"), ParamRef::Vector(&self.bias));
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        f(&join(prefix, "weight"), ParamMut::Matrix(&mut self.weight));
        f(&join(prefix, "bias"), ParamMut::Vector(&mut self.bias));
    }
}

// ==================== LayerNorm ====================

/// Per-row zero-mean / unit-variance normalization with learned scale and shift.
#[derive(Debug, Clone)]
pub struct LayerNorm {
    weight: Array1<f32>,
    bias: Array1<f32>,
    eps: f32,
}

impl LayerNorm {
    pub fn new(dim: usize) -> Self {
        Self {
            weight: Array1::ones(dim),
            bias: Array1::zeros(dim),
            eps: LAYER_NORM_EPS,
        }
    }

    pub fn dim(&self) -> usize {
        self.weight.len()
    }

    pub fn forward(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut out = x.to_owned();
        let width = x.ncols() as f32;
        for mut row in out.axis_iter_mut(Axis(0)) {
            let mean = row.sum() / width;
            // biased variance
            let var = row.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / width;
            let inv_std = 1.0 / (var + self.eps).sqrt();
            for ((v, &g), &b) in row.iter_mut().zip(self.weight.iter()).zip(self.bias.iter()) {
                *v = (*v - mean) * inv_std * g + b;
            }
        }
        out
    }
}

impl Parameterized for LayerNorm {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        f(&join(prefix, "weight"), ParamRef::Vector(&self.weight));
        f(&join(prefix, "bias"), ParamRef::Vector(&self.bias));
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        f(&join(prefix, "weight"), ParamMut::Vector(&mut self.weight));
        f(&join(prefix, "bias"), ParamMut::Vector(&mut self.bias));
    }
}

// ==================== Embedding ====================

/// Lookup table mapping a categorical index to a learned row.
#[derive(Debug, Clone)]
pub struct Embedding {
    weight: Array2<f32>,
}

impl Embedding {
    /// Rows drawn from `U(-1, 1)`; overwritten by Xavier init or a snapshot.
    pub fn new<R: Rng + ?Sized>(num_embeddings: usize, dim: usize, rng: &mut R) -> Self {
        let dist = Uniform::new_inclusive(-1.0f32, 1.0);
        Self {
            weight: Array2::from_shape_simple_fn((num_embeddings, dim), || dist.sample(&mut *rng)),
        }
    }

    pub fn num_embeddings(&self) -> usize {
        self.weight.nrows()
    }

    pub fn dim(&self) -> usize {
        self.weight.ncols()
    }

    /// Gathers rows; every index must be `< num_embeddings()`.
    pub fn forward(&self, indices: &[usize]) -> Array2<f32> {
        self.weight.select(Axis(0), indices)
    }
}

impl Parameterized for Embedding {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        f(&join(prefix, "weight"), ParamRef::Matrix(&self.weight));
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        f(&join(prefix, "weight"), ParamMut::Matrix(&mut self.weight));
    }
}
