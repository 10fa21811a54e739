pub mod backend;
pub mod graph;
pub mod model;

pub use backend::{Device, worker_hint, CPU, THREADED};
pub use graph::{ComputeGraph, GraphNode, eval_precomputed_graph};
pub use model::{Model, load_model, build_model, evaluate_model};

use crate::{
    error::{EvalErr, Result},
    eval::result::EvalResult,
    NCLASSES, NINPUT,
};

/// The two ways of running a model over a test set.
///
/// The orchestrator only talks to this trait, so tests can substitute an
/// engine that records which entry points were called.
pub trait ExecutionEngine {
    /// Handle produced by `load_model` and completed by `build_model`.
    type Model;

    /// Replays a precomputed graph stored at `path` (CPU only). Failure is
    /// reported through `EvalResult::success()`, never as an error.
    fn eval_precomputed_graph(
        &self,
        path: &str,
        images: &[f64],
        labels: &[f64],
        count: usize,
        n_threads: usize,
    ) -> EvalResult;

    fn load_model(&self, path: &str, backend: &str) -> Result<Self::Model>;

    fn build_model(&self, model: &mut Self::Model, logical_batch_size: usize, physical_batch_size: usize) -> Result<()>;

    fn evaluate_model(&self, model: &Self::Model, images: &[f64], labels: &[f64], count: usize) -> Result<EvalResult>;
}

/// The engine implemented by this crate: JSON graphs and parameter files,
/// dense forward passes on the CPU.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl ExecutionEngine for NativeEngine {
    type Model = Model;

    fn eval_precomputed_graph(
        &self,
        path: &str,
        images: &[f64],
        labels: &[f64],
        count: usize,
        n_threads: usize,
    ) -> EvalResult {
        graph::eval_precomputed_graph(path, images, labels, count, n_threads)
    }

    fn load_model(&self, path: &str, backend: &str) -> Result<Model> {
        model::load_model(path, backend)
    }

    fn build_model(&self, model: &mut Model, logical_batch_size: usize, physical_batch_size: usize) -> Result<()> {
        model::build_model(model, logical_batch_size, physical_batch_size)
    }

    fn evaluate_model(&self, model: &Model, images: &[f64], labels: &[f64], count: usize) -> Result<EvalResult> {
        model::evaluate_model(model, images, labels, count)
    }
}

/// Both buffers must hold at least `count` examples.
pub(crate) fn check_buffers(images: &[f64], labels: &[f64], count: usize) -> Result<()> {
    if images.len() < count * NINPUT {
        return Err(EvalErr::Shape { what: "image buffer length", got: images.len(), expected: count * NINPUT });
    }
    if labels.len() < count * NCLASSES {
        return Err(EvalErr::Shape { what: "label buffer length", got: labels.len(), expected: count * NCLASSES });
    }
    Ok(())
}
