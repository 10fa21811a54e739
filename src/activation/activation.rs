use serde::{Serialize, Deserialize};
use std::f64::consts::E;

use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Softmax is a vector-valued activation; it is applied row by row in
    /// `apply()`, never through the element-wise `function()`.
    Softmax,
    Tanh,
}

impl ActivationFunction {
    /// Element-wise activation. `Softmax` is the identity here; use `apply()`.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Applies the activation to a batch of pre-activations, one example per row.
    pub fn apply(&self, z: &mut Matrix) {
        match self {
            ActivationFunction::Identity => {}
            ActivationFunction::Softmax => {
                for r in 0..z.rows {
                    softmax_in_place(z.row_mut(r));
                }
            }
            other => z.map_in_place(|x| other.function(x)),
        }
    }
}

/// Numerically stable softmax: shifts by the row maximum before exponentiating.
pub fn softmax_in_place(row: &mut [f64]) {
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in row.iter_mut() {
        *x /= sum;
    }
}

/// `log(softmax(row))`, computed without forming the probabilities.
pub fn log_softmax_in_place(row: &mut [f64]) {
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let log_sum = row.iter().map(|x| (x - max).exp()).sum::<f64>().ln() + max;
    for x in row.iter_mut() {
        *x -= log_sum;
    }
}
