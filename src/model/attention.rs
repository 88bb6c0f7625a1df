//! Multi-head scaled dot-product self-attention.
//!
//! Per head `h`:
//! - `scores_h = Q_h · K_hᵀ / √d_k`
//! - forbidden pairs get weight exactly 0 (masked softmax over the key axis)
//! - `context_h = softmax(scores_h) · V_h`
//!
//! Heads are concatenated and passed through one output projection.
//! Cost is O(seq² · d_model) per call.

use ndarray::{s, Array2, ArrayD, ArrayView2, ArrayView3};
use rand::Rng;

use crate::error::{ResonanceError, Result};
use crate::layers::Linear;
use crate::matrix::masked_softmax_rows;
use crate::model::params::{join, ParamMut, ParamRef, Parameterized};

// ==================== Attention Mask ====================

/// Boolean attention mask, `true` = attend, `false` = forbidden.
///
/// Any shape broadcastable to `(batch, seq, seq)` is accepted, e.g.
/// `(seq, seq)` shared by every sample or `(batch, 1, seq)` key padding.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionMask {
    mask: ArrayD<bool>,
}

impl AttentionMask {
    pub fn new(mask: ArrayD<bool>) -> Self {
        Self { mask }
    }

    /// Builds a mask from numeric values: non-zero = attend, zero = forbidden.
    pub fn from_values(values: &ArrayD<f32>) -> Self {
        Self {
            mask: values.mapv(|v| v != 0.0),
        }
    }

    /// Mask that lets every query see only itself.
    pub fn diagonal(seq_len: usize) -> Self {
        let mask = Array2::from_shape_fn((seq_len, seq_len), |(i, j)| i == j);
        Self {
            mask: mask.into_dyn(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.mask.shape()
    }

    pub fn as_array(&self) -> &ArrayD<bool> {
        &self.mask
    }

    /// Broadcast view over `(batch, seq, seq)`.
    pub fn broadcast_to(&self, batch: usize, seq_len: usize) -> Result<ArrayView3<'_, bool>> {
        let target = [batch, seq_len, seq_len];
        if self.mask.ndim() > 3 {
            return Err(self.not_broadcastable(target));
        }
        self.mask
            .broadcast((batch, seq_len, seq_len))
            .ok_or_else(|| self.not_broadcastable(target))
    }

    fn not_broadcastable(&self, target: [usize; 3]) -> ResonanceError {
        ResonanceError::MaskNotBroadcastable {
            shape: self.mask.shape().to_vec(),
            target,
        }
    }
}

// ==================== Multi-Head Self-Attention ====================

#[derive(Debug, Clone)]
pub struct MultiHeadSelfAttention {
    w_q: Linear,
    w_k: Linear,
    w_v: Linear,
    w_o: Linear,
    n_heads: usize,
    d_k: usize,
    scale: f32,
}

impl MultiHeadSelfAttention {
    pub fn new<R: Rng + ?Sized>(d_model: usize, n_heads: usize, rng: &mut R) -> Result<Self> {
        if n_heads == 0 || d_model == 0 || d_model % n_heads != 0 {
            return Err(ResonanceError::HeadsNotDivisible { d_model, n_heads });
        }
        let d_k = d_model / n_heads;

        Ok(Self {
            w_q: Linear::new(d_model, d_model, rng),
            w_k: Linear::new(d_model, d_model, rng),
            w_v: Linear::new(d_model, d_model, rng),
            w_o: Linear::new(d_model, d_model, rng),
            n_heads,
            d_k,
            scale: (d_k as f32).sqrt(),
        })
    }

    pub fn n_heads(&self) -> usize {
        self.n_heads
    }

    pub fn d_k(&self) -> usize {
        self.d_k
    }

    /// Attends over one sequence `(seq_len, d_model)` with an optional
    /// `(seq_len, seq_len)` mask.
    pub fn forward(&self, x: ArrayView2<'_, f32>, mask: Option<ArrayView2<'_, bool>>) -> Array2<f32> {
        self.forward_with_weights(x, mask).0
    }

    /// Same as [`forward`](Self::forward), also returning each head's
    /// `(seq_len, seq_len)` post-softmax weights.
    pub fn forward_with_weights(
        &self,
        x: ArrayView2<'_, f32>,
        mask: Option<ArrayView2<'_, bool>>,
    ) -> (Array2<f32>, Vec<Array2<f32>>) {
        let seq_len = x.nrows();
        let q = self.w_q.forward(x);
        let k = self.w_k.forward(x);
        let v = self.w_v.forward(x);

        let mut context = Array2::<f32>::zeros((seq_len, self.n_heads * self.d_k));
        let mut head_weights = Vec::with_capacity(self.n_heads);

        for head in 0..self.n_heads {
            let lo = head * self.d_k;
            let hi = lo + self.d_k;
            let q_h = q.slice(s![.., lo..hi]);
            let k_h = k.slice(s![.., lo..hi]);
            let v_h = v.slice(s![.., lo..hi]);

            let mut weights = q_h.dot(&k_h.t()) / self.scale;
            let empty_rows = masked_softmax_rows(&mut weights, mask);
            if empty_rows > 0 {
                tracing::warn!(head, empty_rows, "query rows with every key masked");
            }

            context.slice_mut(s![.., lo..hi]).assign(&weights.dot(&v_h));
            head_weights.push(weights);
        }

        (self.w_o.forward(context.view()), head_weights)
    }
}

impl Parameterized for MultiHeadSelfAttention {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        self.w_q.visit_params(&join(prefix, "w_q"), f);
        self.w_k.visit_params(&join(prefix, "w_k"), f);
        self.w_v.visit_params(&join(prefix, "w_v"), f);
        self.w_o.visit_params(&join(prefix, "w_o"), f);
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        self.w_q.visit_params_mut(&join(prefix, "w_q"), f);
        self.w_k.visit_params_mut(&join(prefix, "w_k"), f);
        self.w_v.visit_params_mut(&join(prefix, "w_v"), f);
        self.w_o.visit_params_mut(&join(prefix, "w_o"), f);
    }
}
