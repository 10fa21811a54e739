pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod engine;
pub mod data;
pub mod eval;
pub mod report;
pub mod config;
pub mod error;

/// Side length of a square MNIST image.
pub const MNIST_HW: usize = 28;
/// Pixels per flattened image.
pub const NINPUT: usize = MNIST_HW * MNIST_HW;
/// Digit classes.
pub const NCLASSES: usize = 10;
/// Examples in the MNIST test set.
pub const NTEST: usize = 10_000;
/// Default logical batch size for the model-build path.
pub const NBATCH_LOGICAL: usize = 1_000;
/// Default physical batch size for the model-build path.
pub const NBATCH_PHYSICAL: usize = 500;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Dense;
pub use network::network::{LayerParams, Network};
pub use engine::{ExecutionEngine, NativeEngine, ComputeGraph};
pub use eval::{evaluate, EvalResult, Statistic, loss_statistic, accuracy_statistic};
pub use config::EvalConfig;
pub use error::{EvalErr, Result};
