//! Glorot/Xavier uniform initialization.
//!
//! Every 2-D parameter `(fan_out, fan_in)` is redrawn from
//! `U(-a, a)` with `a = √(6 / (fan_in + fan_out))`. Biases and
//! normalization scale/shift (1-D) keep their construction values.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::matrix::xavier_bound;
use crate::model::params::{ParamMut, Parameterized};

/// Re-initializes all matrices of `module`, returning how many were touched.
pub fn xavier_uniform_<M, R>(module: &mut M, rng: &mut R) -> usize
where
    M: Parameterized + ?Sized,
    R: Rng + ?Sized,
{
    let mut touched = 0;
    module.visit_params_mut("", &mut |_, param| {
        if let ParamMut::Matrix(weight) = param {
            let (fan_out, fan_in) = weight.dim();
            let bound = xavier_bound(fan_in, fan_out);
            let dist = Uniform::new_inclusive(-bound, bound);
            weight.iter_mut().for_each(|w| *w = dist.sample(&mut *rng));
            touched += 1;
        }
    });
    touched
}
