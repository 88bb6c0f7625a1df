//! Observation sequences → padded model batch.
//!
//! Sequences of unequal length are right-aligned: shorter ones are
//! left-padded with [`Observation::padding`] so the last position of every
//! row is the most recent real observation. The padding is storage only;
//! [`crate::ResonanceTransformer::forward_sequences`] encodes each row from
//! its first real step, so positions count from 0 for every sequence.

use ndarray::{Array2, Array3};

use crate::error::{ResonanceError, Result};
use crate::model::transformer::EmotionalBatch;
use crate::sanitize::validate_observation;
use crate::types::Observation;

#[derive(Debug, Clone)]
pub struct SequenceBatch {
    pub batch: EmotionalBatch,
    /// Real (unpadded) length of each sequence.
    pub lengths: Vec<usize>,
}

impl SequenceBatch {
    pub fn padded_len(&self) -> usize {
        self.batch.seq_len()
    }

    /// Number of padding steps in front of sample `i`.
    pub fn padding(&self, i: usize) -> usize {
        self.padded_len() - self.lengths[i]
    }
}

pub fn build_batch(sequences: &[Vec<Observation>], max_seq_len: usize) -> Result<SequenceBatch> {
    if sequences.is_empty() {
        return Err(ResonanceError::EmptyInput("batch"));
    }

    let lengths: Vec<usize> = sequences.iter().map(Vec::len).collect();
    if lengths.contains(&0) {
        return Err(ResonanceError::EmptyInput("sequence"));
    }
    let seq_len = lengths.iter().copied().max().unwrap_or(0);
    if seq_len > max_seq_len {
        return Err(ResonanceError::SequenceTooLong {
            seq_len,
            max_len: max_seq_len,
        });
    }

    for (b, seq) in sequences.iter().enumerate() {
        for (t, obs) in seq.iter().enumerate() {
            validate_observation(obs, b, t)?;
        }
    }

    let batch_size = sequences.len();
    let step = |b: usize, t: usize| -> Observation {
        let offset = seq_len - lengths[b];
        if t < offset {
            Observation::padding()
        } else {
            sequences[b][t - offset]
        }
    };

    let batch = EmotionalBatch::new(
        Array3::from_shape_fn((batch_size, seq_len, 1), |(b, t, _)| step(b, t).mood),
        Array3::from_shape_fn((batch_size, seq_len, 1), |(b, t, _)| step(b, t).energy),
        Array3::from_shape_fn((batch_size, seq_len, 1), |(b, t, _)| step(b, t).stress),
        Array2::from_shape_fn((batch_size, seq_len), |(b, t)| step(b, t).day_of_week as i64),
        Array2::from_shape_fn((batch_size, seq_len), |(b, t)| step(b, t).hour_of_day as i64),
    );

    Ok(SequenceBatch { batch, lengths })
}
