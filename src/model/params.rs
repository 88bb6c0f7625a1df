//! Named-parameter traversal.
//!
//! Every layer exposes its tensors under dotted names (`combine.weight`,
//! `encoder_layers.3.ff.linear1.bias`, ...). Initialization, snapshot loading
//! and export all walk the model through this trait.

use ndarray::{Array1, Array2};

/// Read-only view of one parameter tensor.
pub enum ParamRef<'a> {
    Vector(&'a Array1<f32>),
    Matrix(&'a Array2<f32>),
}

impl ParamRef<'_> {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            ParamRef::Vector(v) => v.shape().to_vec(),
            ParamRef::Matrix(m) => m.shape().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ParamRef::Vector(v) => v.len(),
            ParamRef::Matrix(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values in row-major order.
    pub fn to_vec(&self) -> Vec<f32> {
        match self {
            ParamRef::Vector(v) => v.iter().copied().collect(),
            ParamRef::Matrix(m) => m.iter().copied().collect(),
        }
    }
}

/// Mutable handle to one parameter tensor.
pub enum ParamMut<'a> {
    Vector(&'a mut Array1<f32>),
    Matrix(&'a mut Array2<f32>),
}

impl ParamMut<'_> {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            ParamMut::Vector(v) => v.shape().to_vec(),
            ParamMut::Matrix(m) => m.shape().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ParamMut::Vector(v) => v.len(),
            ParamMut::Matrix(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrites the tensor from row-major `data`; `data.len()` must equal `len()`.
    pub fn assign(&mut self, data: &[f32]) {
        debug_assert_eq!(data.len(), self.len());
        match self {
            ParamMut::Vector(v) => v.iter_mut().zip(data).for_each(|(dst, &src)| *dst = src),
            ParamMut::Matrix(m) => m.iter_mut().zip(data).for_each(|(dst, &src)| *dst = src),
        }
    }
}

/// A module owning named parameters.
pub trait Parameterized {
    fn visit_params(&self, prefix: &str, f: &mut dyn FnMut(&str, ParamRef<'_>));

    fn visit_params_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, ParamMut<'_>));

    fn parameter_count(&self) -> usize {
        let mut total = 0;
        self.visit_params("", &mut |_, p| total += p.len());
        total
    }

    fn parameter_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.visit_params("", &mut |name, _| names.push(name.to_string()));
        names
    }
}

/// Joins a parent prefix and a child name with a dot.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
