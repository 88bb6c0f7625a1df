//! Data Sanitization
//!
//! Input and parameter validity checks.
//!
//! Functions:
//! - Non-finite detection for signal tensors
//! - Day/hour index range checks with (batch, step) location
//! - Parameter health diagnostics

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{ResonanceError, Result};
use crate::model::params::Parameterized;
use crate::types::{Observation, DAYS_PER_WEEK, HOURS_PER_DAY};

/// True if the slice holds any NaN or ±Inf.
pub fn has_invalid_values(arr: &[f32]) -> bool {
    arr.iter().any(|x| !x.is_finite())
}

/// Fails with `NonFinite(name)` on the first NaN or ±Inf.
pub fn check_finite<'a, I>(name: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f32>,
{
    if values.into_iter().any(|x| !x.is_finite()) {
        return Err(ResonanceError::NonFinite(name.to_string()));
    }
    Ok(())
}

/// Converts a `(batch, seq)` index tensor into per-sample `usize` rows,
/// rejecting anything outside `[0, max]`.
pub fn check_index_range(
    field: &'static str,
    values: ArrayView2<'_, i64>,
    max: usize,
) -> Result<Vec<Vec<usize>>> {
    values
        .outer_iter()
        .enumerate()
        .map(|(batch, row)| {
            row.iter()
                .enumerate()
                .map(|(step, &value)| {
                    if value < 0 || value as u64 > max as u64 {
                        Err(ResonanceError::IndexOutOfRange {
                            field,
                            value,
                            max,
                            batch,
                            step,
                        })
                    } else {
                        Ok(value as usize)
                    }
                })
                .collect::<Result<Vec<usize>>>()
        })
        .collect()
}

/// Checks one observation located at `(batch, step)`.
pub fn validate_observation(obs: &Observation, batch: usize, step: usize) -> Result<()> {
    check_finite("mood", [obs.mood].iter())?;
    check_finite("energy", [obs.energy].iter())?;
    check_finite("stress", [obs.stress].iter())?;

    if obs.day_of_week as usize >= DAYS_PER_WEEK {
        return Err(ResonanceError::IndexOutOfRange {
            field: "day_of_week",
            value: obs.day_of_week as i64,
            max: DAYS_PER_WEEK - 1,
            batch,
            step,
        });
    }
    if obs.hour_of_day as usize >= HOURS_PER_DAY {
        return Err(ResonanceError::IndexOutOfRange {
            field: "hour_of_day",
            value: obs.hour_of_day as i64,
            max: HOURS_PER_DAY - 1,
            batch,
            step,
        });
    }
    Ok(())
}

// ==================== Parameter Diagnostics ====================

/// Health summary over every parameter of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDiagnostics {
    pub is_healthy: bool,
    pub tensor_count: usize,
    pub value_count: usize,
    pub nan_count: usize,
    pub inf_count: usize,
    /// Largest finite |value|
    pub max_abs: f32,
    /// First tensor holding a non-finite value
    pub first_invalid: Option<String>,
    pub message: String,
}

pub fn diagnose_parameters(module: &dyn Parameterized) -> ParameterDiagnostics {
    let mut tensor_count = 0;
    let mut value_count = 0;
    let mut nan_count = 0;
    let mut inf_count = 0;
    let mut max_abs = 0.0f32;
    let mut first_invalid = None;

    module.visit_params("", &mut |name, param| {
        tensor_count += 1;
        value_count += param.len();
        let mut tensor_invalid = false;
        for v in param.to_vec() {
            if v.is_nan() {
                nan_count += 1;
                tensor_invalid = true;
            } else if v.is_infinite() {
                inf_count += 1;
                tensor_invalid = true;
            } else {
                max_abs = max_abs.max(v.abs());
            }
        }
        if tensor_invalid && first_invalid.is_none() {
            first_invalid = Some(name.to_string());
        }
    });

    let is_healthy = nan_count == 0 && inf_count == 0;
    let message = if is_healthy {
        "Parameters are healthy".to_string()
    } else if nan_count > 0 {
        format!("Parameters contain {nan_count} NaN values")
    } else {
        format!("Parameters contain {inf_count} infinite values")
    };

    ParameterDiagnostics {
        is_healthy,
        tensor_count,
        value_count,
        nan_count,
        inf_count,
        max_abs,
        first_invalid,
        message,
    }
}
