use log::{debug, info};
use rayon::prelude::*;

use crate::{
    activation::activation::{log_softmax_in_place, ActivationFunction},
    config::check_batch_split,
    engine::{backend::Device, check_buffers},
    error::{EvalErr, Result},
    eval::result::EvalResult,
    layers::dense::Dense,
    loss::cross_entropy::CrossEntropyLoss,
    math::{argmax, matrix::Matrix},
    network::network::Network,
    NCLASSES, NINPUT,
};

/// Executable form of a model: its layers plus the batch split they run with.
#[derive(Debug)]
struct Built {
    hidden: Vec<Dense>,
    head: Dense,
    logical_batch_size: usize,
    physical_batch_size: usize,
}

/// Handle to a model loaded from a parameter file for a specific backend.
///
/// Created by `load_model`, made executable by `build_model`. Everything it
/// holds is released when it goes out of scope.
#[derive(Debug)]
pub struct Model {
    path: String,
    device: Device,
    network: Network,
    built: Option<Built>,
}

impl Model {
    pub fn device(&self) -> Device {
        self.device
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Hidden layers and output layer, if `build_model` has run.
    pub(crate) fn layers(&self) -> Option<(&[Dense], &Dense)> {
        self.built.as_ref().map(|b| (b.hidden.as_slice(), &b.head))
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        debug!("releasing model {} on {}", self.path, self.device);
    }
}

/// Reads model parameters from `path` for the backend named `backend`.
pub fn load_model(path: &str, backend: &str) -> Result<Model> {
    let device = Device::from_name(backend)?;
    let network = Network::load_json(path)?;

    if let Some(description) = network.metadata.as_ref().and_then(|m| m.description.as_deref()) {
        info!("model {path}: {description}");
    }
    debug!("loaded {} layers from {path} for {device}", network.layers.len());

    Ok(Model { path: path.to_owned(), device, network, built: None })
}

/// Constructs the executable layers of `model` for batches of
/// `logical_batch_size` examples, evaluated `physical_batch_size` at a time.
pub fn build_model(model: &mut Model, logical_batch_size: usize, physical_batch_size: usize) -> Result<()> {
    check_batch_split(logical_batch_size, physical_batch_size)?;

    let mut hidden = model.network.to_layers()?;
    let input_size = hidden[0].input_size;
    if input_size != NINPUT {
        return Err(EvalErr::Shape { what: "model input size", got: input_size, expected: NINPUT });
    }
    let head = hidden.pop().ok_or(EvalErr::Shape { what: "layer count", got: 0, expected: 1 })?;
    if head.size != NCLASSES {
        return Err(EvalErr::Shape { what: "model output size", got: head.size, expected: NCLASSES });
    }

    model.built = Some(Built { hidden, head, logical_batch_size, physical_batch_size });
    Ok(())
}

/// Evaluates the first `count` examples in logical batches, each split into
/// physical passes. On `Device::Threaded` the passes of one logical batch run
/// in parallel.
pub fn evaluate_model(model: &Model, images: &[f64], labels: &[f64], count: usize) -> Result<EvalResult> {
    let built = model.built.as_ref().ok_or(EvalErr::ModelNotBuilt)?;
    check_buffers(images, labels, count)?;

    let mut pred = Vec::with_capacity(count);
    let mut loss = Vec::with_capacity(count);

    for logical_start in (0..count).step_by(built.logical_batch_size) {
        let logical_end = (logical_start + built.logical_batch_size).min(count);
        let passes: Vec<(usize, usize)> = (logical_start..logical_end)
            .step_by(built.physical_batch_size)
            .map(|s| (s, (s + built.physical_batch_size).min(logical_end)))
            .collect();

        let outputs: Vec<(Vec<usize>, Vec<f64>)> = match model.device {
            Device::Cpu => passes
                .iter()
                .map(|&(s, e)| forward_pass(built, images, labels, s, e))
                .collect(),
            Device::Threaded => passes
                .par_iter()
                .map(|&(s, e)| forward_pass(built, images, labels, s, e))
                .collect(),
        };

        for (p, l) in outputs {
            pred.extend(p);
            loss.extend(l);
        }
    }

    Ok(EvalResult::from_predictions(pred, loss, &labels[..count * NCLASSES]))
}

/// Runs examples `start..end` through the built layers; returns predicted
/// classes and cross-entropy losses.
fn forward_pass(built: &Built, images: &[f64], labels: &[f64], start: usize, end: usize) -> (Vec<usize>, Vec<f64>) {
    let rows = end - start;
    let mut x = Matrix::from_slice(rows, NINPUT, &images[start * NINPUT..end * NINPUT]);

    for layer in &built.hidden {
        x = layer.forward(&x);
    }

    // The head normalizes below, so a softmax output layer contributes only its logits.
    let mut logits = match built.head.activator {
        ActivationFunction::Softmax | ActivationFunction::Identity => built.head.pre_activation(&x),
        _ => built.head.forward(&x),
    };

    let mut pred = Vec::with_capacity(rows);
    let mut loss = Vec::with_capacity(rows);
    for r in 0..rows {
        let row = logits.row_mut(r);
        log_softmax_in_place(row);
        let label = &labels[(start + r) * NCLASSES..(start + r + 1) * NCLASSES];
        pred.push(argmax(row));
        loss.push(CrossEntropyLoss::loss_from_log_probs(row, label));
    }

    (pred, loss)
}
