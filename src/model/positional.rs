//! Sinusoidal positional encoding.
//!
//! At position `p`, channel pair `(2i, 2i+1)` receives
//! `sin(p / 10000^(2i/d_model))` and `cos(p / 10000^(2i/d_model))`.
//! The table is built once up to `max_len` and sliced per call.

use ndarray::{s, Array2, ArrayView2};

use crate::error::{ResonanceError, Result};
use crate::types::POSITIONAL_BASE;

#[derive(Debug, Clone)]
pub struct PositionalEncoding {
    /// (max_len, d_model)
    table: Array2<f32>,
}

impl PositionalEncoding {
    pub fn new(d_model: usize, max_len: usize) -> Self {
        let log_base = POSITIONAL_BASE.ln();
        let table = Array2::from_shape_fn((max_len, d_model), |(pos, channel)| {
            let pair = (channel / 2 * 2) as f32;
            let div_term = (pair * (-log_base / d_model as f32)).exp();
            let angle = pos as f32 * div_term;
            if channel % 2 == 0 {
                angle.sin()
            } else {
                angle.cos()
            }
        });
        Self { table }
    }

    pub fn max_len(&self) -> usize {
        self.table.nrows()
    }

    pub fn d_model(&self) -> usize {
        self.table.ncols()
    }

    pub fn table(&self) -> &Array2<f32> {
        &self.table
    }

    /// First `seq_len` rows of the table.
    pub fn encoding(&self, seq_len: usize) -> Result<ArrayView2<'_, f32>> {
        if seq_len > self.max_len() {
            return Err(ResonanceError::SequenceTooLong {
                seq_len,
                max_len: self.max_len(),
            });
        }
        Ok(self.table.slice(s![..seq_len, ..]))
    }

    /// Adds the positional signal to one embedded sequence `(seq_len, d_model)` in place.
    pub fn forward(&self, x: &mut Array2<f32>) -> Result<()> {
        let encoding = self.encoding(x.nrows())?;
        *x += &encoding;
        Ok(())
    }
}
