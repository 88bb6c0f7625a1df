//! Pre-norm transformer encoder.
//!
//! - `y = x + Attention(Norm1(x), mask)`
//! - `z = y + FeedForward(Norm2(y))`
//!
//! The same mask is handed to every layer of the stack.

use ndarray::{Array2, ArrayView2};
use rand::Rng;

use crate::error::Result;
use crate::layers::LayerNorm;
use crate::model::attention::MultiHeadSelfAttention;
use crate::model::feed_forward::FeedForward;
use crate::model::params::{join, ParamMut, ParamRef, Parameterized};

#[derive(Debug, Clone)]
pub struct TransformerEncoderLayer {
    self_attn: MultiHeadSelfAttention,
    ff: FeedForward,
    norm1: LayerNorm,
    norm2: LayerNorm,
}

impl TransformerEncoderLayer {
    pub fn new<R: Rng + ?Sized>(
        d_model: usize,
        n_heads: usize,
        d_ff: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self {
            self_attn: MultiHeadSelfAttention::new(d_model, n_heads, rng)?,
            ff: FeedForward::new(d_model, d_ff, rng),
            norm1: LayerNorm::new(d_model),
            norm2: LayerNorm::new(d_model),
        })
    }

    pub fn self_attn(&self) -> &MultiHeadSelfAttention {
        &self.self_attn
    }

    pub fn forward(&self, x: ArrayView2<'_, f32>, mask: Option<ArrayView2<'_, bool>>) -> Array2<f32> {
        let attn_out = self.self_attn.forward(self.norm1.forward(x).view(), mask);
        let y = &x + &attn_out;
        let ff_out = self.ff.forward(self.norm2.forward(y.view()).view());
        y + ff_out
    }
}

impl Parameterized for TransformerEncoderLayer {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        self.self_attn.visit_params(&join(prefix, "self_attn"), f);
        self.ff.visit_params(&join(prefix, "ff"), f);
        self.norm1.visit_params(&join(prefix, "norm1"), f);
        self.norm2.visit_params(&join(prefix, "norm2"), f);
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        self.self_attn.visit_params_mut(&join(prefix, "self_attn"), f);
        self.ff.visit_params_mut(&join(prefix, "ff"), f);
        self.norm1.visit_params_mut(&join(prefix, "norm1"), f);
        self.norm2.visit_params_mut(&join(prefix, "norm2"), f);
    }
}

/// N encoder layers applied in order.
#[derive(Debug, Clone)]
pub struct EncoderStack {
    layers: Vec<TransformerEncoderLayer>,
}

impl EncoderStack {
    pub fn new<R: Rng + ?Sized>(
        n_layers: usize,
        d_model: usize,
        n_heads: usize,
        d_ff: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let layers = (0..n_layers)
            .map(|_| TransformerEncoderLayer::new(d_model, n_heads, d_ff, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[TransformerEncoderLayer] {
        &self.layers
    }

    pub fn forward(&self, x: Array2<f32>, mask: Option<ArrayView2<'_, bool>>) -> Array2<f32> {
        self.layers
            .iter()
            .fold(x, |hidden, layer| layer.forward(hidden.view(), mask))
    }
}

impl Parameterized for EncoderStack {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>)) {
        for (i, layer) in self.layers.iter().enumerate() {
            layer.visit_params(&join(prefix, &i.to_string()), f);
        }
    }

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>)) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.visit_params_mut(&join(prefix, &i.to_string()), f);
        }
    }
}
