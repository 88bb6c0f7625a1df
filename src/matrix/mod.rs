//! Numeric primitives shared by every layer.
//!
//! - Row-wise softmax with exact masking
//! - GELU (erf form) and numerically stable sigmoid
//! - Arg-max with lower-index tie breaking
//! - Glorot/Xavier uniform bound

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};

/// Softmax over one row, restricted to the `allowed` entries.
///
/// Forbidden entries are written as exactly `0.0`. Returns `false` when no
/// entry is allowed, in which case the whole row is zeroed.
pub fn masked_softmax_in_place(
    mut row: ArrayViewMut1<'_, f32>,
    allowed: ArrayView1<'_, bool>,
) -> bool {
    let mut max = f32::NEG_INFINITY;
    for (&v, &ok) in row.iter().zip(allowed.iter()) {
        if ok && v > max {
            max = v;
        }
    }

    if max == f32::NEG_INFINITY {
        // every key forbidden (or all scores -inf)
        row.fill(0.0);
        return false;
    }

    let mut sum = 0.0f32;
    for (v, &ok) in row.iter_mut().zip(allowed.iter()) {
        if ok {
            *v = (*v - max).exp();
            sum += *v;
        } else {
            *v = 0.0;
        }
    }

    row.mapv_inplace(|v| v / sum);
    true
}

/// Unmasked softmax over one row.
pub fn softmax_in_place(mut row: ArrayViewMut1<'_, f32>) {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    row.mapv_inplace(|v| {
        let e = (v - max).exp();
        sum += e;
        e
    });
    row.mapv_inplace(|v| v / sum);
}

/// Softmax applied independently to every row.
pub fn softmax_rows(x: &Array2<f32>) -> Array2<f32> {
    let mut out = x.clone();
    for row in out.axis_iter_mut(Axis(0)) {
        softmax_in_place(row);
    }
    out
}

/// Row-wise softmax honouring a `(rows, cols)` boolean mask (true = attend).
///
/// Returns the number of rows that had no allowed entry.
pub fn masked_softmax_rows(scores: &mut Array2<f32>, mask: Option<ArrayView2<'_, bool>>) -> usize {
    let mut empty_rows = 0;
    match mask {
        Some(mask) => {
            for (row, allowed) in scores.axis_iter_mut(Axis(0)).zip(mask.axis_iter(Axis(0))) {
                if !masked_softmax_in_place(row, allowed) {
                    empty_rows += 1;
                }
            }
        }
        None => {
            for row in scores.axis_iter_mut(Axis(0)) {
                softmax_in_place(row);
            }
        }
    }
    empty_rows
}

/// Gaussian error linear unit, exact form `0.5·x·(1 + erf(x/√2))`.
#[inline]
pub fn gelu(x: f32) -> f32 {
    0.5 * x * (1.0 + libm::erff(x * std::f32::consts::FRAC_1_SQRT_2))
}

/// Logistic sigmoid, evaluated without overflow on either tail.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut best_idx = 0;
    let mut best = f32::NEG_INFINITY;
    for (i, &v) in values.into_iter().enumerate() {
        if v > best {
            best = v;
            best_idx = i;
        }
    }
    best_idx
}

/// Half-width of the Glorot/Xavier uniform distribution.
pub fn xavier_bound(fan_in: usize, fan_out: usize) -> f32 {
    (6.0 / (fan_in + fan_out).max(1) as f32).sqrt()
}
