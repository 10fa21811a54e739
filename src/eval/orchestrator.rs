use std::time::Instant;

use log::{debug, info};

use crate::{
    config::EvalConfig,
    engine::{backend::{logical_cores, worker_hint, CPU}, ExecutionEngine},
    error::{EvalErr, Result},
    eval::result::EvalResult,
};

/// Strategies for running a model over the test set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    /// Replay a precomputed graph stored at the model path.
    GraphReplay,
    /// Load parameters, build a fresh graph, evaluate it in batches.
    ModelBuild,
}

/// Paths to attempt, in order, for a backend selector. Graph replay is only
/// tried on the CPU backend; `ModelBuild` is always the last resort.
pub fn select_paths(backend: &str) -> &'static [ExecutionPath] {
    if backend == CPU {
        &[ExecutionPath::GraphReplay, ExecutionPath::ModelBuild]
    } else {
        &[ExecutionPath::ModelBuild]
    }
}

/// Evaluates the model at `model_path` on the first `config.n_examples`
/// examples of `images`/`labels`.
///
/// A successful graph replay is returned as is. Otherwise the model is built
/// from its parameters for `backend`; any failure there is final.
pub fn evaluate<E: ExecutionEngine>(
    engine: &E,
    model_path: &str,
    images: &[f64],
    labels: &[f64],
    backend: &str,
    config: &EvalConfig,
) -> Result<EvalResult> {
    let paths = select_paths(backend);
    debug!("execution paths for backend {backend}: {paths:?}");

    if paths.contains(&ExecutionPath::GraphReplay) {
        let n_threads = worker_hint(logical_cores());
        let result = engine.eval_precomputed_graph(model_path, images, labels, config.n_examples, n_threads);
        if result.success() {
            return Ok(result);
        }
        info!("graph replay from {model_path} did not succeed, building the model instead");
    } else {
        info!(
            "not trying to load a compute graph from {model_path} because this is only supported for the {CPU} backend"
        );
    }

    build_and_evaluate(engine, model_path, images, labels, backend, config)
}

fn build_and_evaluate<E: ExecutionEngine>(
    engine: &E,
    model_path: &str,
    images: &[f64],
    labels: &[f64],
    backend: &str,
    config: &EvalConfig,
) -> Result<EvalResult> {
    let t_start = Instant::now();

    let mut model = engine.load_model(model_path, backend)?;
    engine.build_model(&mut model, config.logical_batch_size, config.physical_batch_size)?;

    info!("loaded model in {:.2} ms", t_start.elapsed().as_secs_f64() * 1000.0);

    let result = engine.evaluate_model(&model, images, labels, config.n_examples)?;
    if !result.success() {
        return Err(EvalErr::Unsuccessful);
    }
    Ok(result)
}
