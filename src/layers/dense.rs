use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully-connected layer: `a = f(x · W + b)` with one example per row of `x`.
#[derive(Debug, Clone)]
pub struct Dense {
    pub size: usize,
    pub input_size: usize,
    /// Shape (input_size, size).
    pub weights: Matrix,
    /// Length `size`.
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

impl Dense {
    pub fn new(weights: Matrix, biases: Vec<f64>, activation: ActivationFunction) -> Dense {
        assert_eq!(weights.cols, biases.len(), "one bias per output neuron");
        Dense {
            size: weights.cols,
            input_size: weights.rows,
            weights,
            biases,
            activator: activation,
        }
    }

    /// Linear part only: `x · W + b`.
    pub fn pre_activation(&self, input: &Matrix) -> Matrix {
        let mut z = input * &self.weights;
        z.add_row(&self.biases);
        z
    }

    /// Forward pass over a batch; the layer keeps no per-call state.
    pub fn forward(&self, input: &Matrix) -> Matrix {
        let mut z = self.pre_activation(input);
        self.activator.apply(&mut z);
        z
    }
}
