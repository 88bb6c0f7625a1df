//! Parameter snapshots and the shared model handle.
//!
//! A [`ParameterSnapshot`] maps dotted parameter names to shaped float
//! tensors. Loading is all-or-nothing: every declared name must be present
//! with its exact shape and finite values before anything is assigned.
//!
//! [`ModelHandle`] holds the live model behind `RwLock<Arc<_>>`; inference
//! clones the `Arc`, and a new model replaces the reference in one step.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::error::{ResonanceError, Result};
use crate::model::params::Parameterized;
use crate::model::transformer::ResonanceTransformer;
use crate::sanitize::has_invalid_values;

/// Name of the positional buffer. It is exported, and validated on load, but
/// never read back: the table is regenerated from the config.
pub const POSITIONAL_BUFFER: &str = "pos_encoding.pe";

// ==================== Snapshot ====================

/// One named tensor in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl ParamTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    pub fn expected_len(&self) -> usize {
        self.shape.iter().product()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    tensors: BTreeMap<String, ParamTensor>,
}

impl ParameterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: ParamTensor) -> Option<ParamTensor> {
        self.tensors.insert(name.into(), tensor)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamTensor> {
        self.tensors.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamTensor> {
        self.tensors.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParamTensor> {
        self.tensors.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamTensor)> {
        self.tensors.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ==================== Load / Export ====================

impl ResonanceTransformer {
    /// Builds the architecture declared by `config` and overwrites every
    /// parameter from `snapshot`.
    pub fn from_snapshot(config: ModelConfig, snapshot: &ParameterSnapshot) -> Result<Self> {
        let mut model = Self::new(config)?;
        model.validate_snapshot(snapshot)?;

        model.visit_params_mut("", &mut |name, mut param| {
            if let Some(tensor) = snapshot.get(name) {
                param.assign(&tensor.data);
            }
        });

        info!(tensors = snapshot.len(), "parameter snapshot loaded");
        Ok(model)
    }

    /// Every parameter plus the positional buffer, as `(1, max_len, d_model)`.
    pub fn to_snapshot(&self) -> ParameterSnapshot {
        let mut snapshot = ParameterSnapshot::new();
        self.visit_params("", &mut |name, param| {
            snapshot.insert(name, ParamTensor::new(param.shape(), param.to_vec()));
        });

        let table = self.pos_encoding().table();
        snapshot.insert(
            POSITIONAL_BUFFER,
            ParamTensor::new(
                vec![1, table.nrows(), table.ncols()],
                table.iter().copied().collect(),
            ),
        );
        snapshot
    }

    fn validate_snapshot(&self, snapshot: &ParameterSnapshot) -> Result<()> {
        let mut declared = BTreeMap::new();
        self.visit_params("", &mut |name, param| {
            declared.insert(name.to_string(), param.shape());
        });
        let pe = self.pos_encoding();
        declared.insert(
            POSITIONAL_BUFFER.to_string(),
            vec![1, pe.max_len(), pe.d_model()],
        );

        if let Some(name) = snapshot.names().find(|n| !declared.contains_key(*n)) {
            return Err(ResonanceError::UnexpectedParameter(name.to_string()));
        }

        for (name, shape) in &declared {
            let Some(tensor) = snapshot.get(name) else {
                if name == POSITIONAL_BUFFER {
                    continue;
                }
                return Err(ResonanceError::MissingParameter(name.clone()));
            };
            if &tensor.shape != shape {
                return Err(ResonanceError::ShapeMismatch {
                    name: name.clone(),
                    expected: shape.clone(),
                    actual: tensor.shape.clone(),
                });
            }
            if tensor.data.len() != tensor.expected_len() {
                return Err(ResonanceError::ParameterLength {
                    name: name.clone(),
                    shape: tensor.shape.clone(),
                    expected: tensor.expected_len(),
                    actual: tensor.data.len(),
                });
            }
            if has_invalid_values(&tensor.data) {
                return Err(ResonanceError::NonFinite(name.clone()));
            }
        }
        Ok(())
    }
}

// ==================== Model Handle ====================

/// Shared, atomically swappable reference to the live model.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    inner: Arc<RwLock<Arc<ResonanceTransformer>>>,
}

impl ModelHandle {
    pub fn new(model: ResonanceTransformer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(model))),
        }
    }

    /// Model to run the next inference against.
    pub fn current(&self) -> Arc<ResonanceTransformer> {
        Arc::clone(&self.inner.read())
    }

    /// Installs `model`, returning the one it replaced.
    pub fn swap(&self, model: ResonanceTransformer) -> Arc<ResonanceTransformer> {
        let previous = std::mem::replace(&mut *self.inner.write(), Arc::new(model));
        info!("model snapshot swapped");
        previous
    }

    /// Loads `snapshot` and swaps it in. On failure the live model is unchanged.
    pub fn load_snapshot(
        &self,
        config: ModelConfig,
        snapshot: &ParameterSnapshot,
    ) -> Result<Arc<ResonanceTransformer>> {
        match ResonanceTransformer::from_snapshot(config, snapshot) {
            Ok(model) => Ok(self.swap(model)),
            Err(err) => {
                warn!(error = %err, "rejected parameter snapshot");
                Err(err)
            }
        }
    }
}
