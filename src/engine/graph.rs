use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    activation::activation::{log_softmax_in_place, ActivationFunction},
    engine::{check_buffers, model::Model},
    error::{EvalErr, Result},
    eval::result::EvalResult,
    layers::dense::Dense,
    loss::cross_entropy::CrossEntropyLoss,
    math::{argmax, matrix::Matrix},
    NCLASSES, NINPUT,
};

/// Tag identifying a serialized compute graph.
pub const GRAPH_FORMAT: &str = "mnist-graph";

/// One step of a compiled graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphNode {
    /// `x · W + b`; `weights` has one row per input and one column per output.
    Linear { weights: Matrix, biases: Vec<f64> },
    /// Activation applied to every row; softmax normalizes each row.
    Activation { function: ActivationFunction },
    /// Log-softmax over the logits fused with the cross-entropy loss. Always last.
    CrossEntropyHead,
}

/// A precompiled evaluation plan: the layers of a built model flattened into
/// graph nodes, ready to be replayed without the parameter file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeGraph {
    pub format: String,
    /// Examples per replayed chunk.
    pub batch_size: usize,
    pub nodes: Vec<GraphNode>,
}

impl ComputeGraph {
    /// Flattens a built model into graph nodes. A softmax on the output
    /// layer is absorbed into the cross-entropy head. The result is validated,
    /// so a graph that replay would refuse is never produced.
    pub fn compile(model: &Model, batch_size: usize) -> Result<ComputeGraph> {
        let (hidden, head) = model.layers().ok_or(EvalErr::ModelNotBuilt)?;
        if batch_size == 0 {
            return Err(EvalErr::Graph("batch size must be non-zero".into()));
        }

        let mut nodes = Vec::with_capacity(2 * hidden.len() + 3);
        for layer in hidden {
            push_layer(&mut nodes, layer, layer.activator);
        }
        let head_activation = match head.activator {
            ActivationFunction::Softmax => ActivationFunction::Identity,
            other => other,
        };
        push_layer(&mut nodes, head, head_activation);
        nodes.push(GraphNode::CrossEntropyHead);

        let graph = ComputeGraph { format: GRAPH_FORMAT.to_owned(), batch_size, nodes };
        graph.validate()?;
        Ok(graph)
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Loads and validates a graph. Files in any other format, including model
    /// parameter files, are rejected.
    pub fn load_json(path: &str) -> Result<ComputeGraph> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let graph: ComputeGraph = serde_json::from_reader(reader)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Checks the format tag, that linear nodes chain from `NINPUT` to
    /// `NCLASSES` with correctly sized buffers, and that the head comes last.
    pub fn validate(&self) -> Result<()> {
        if self.format != GRAPH_FORMAT {
            return Err(EvalErr::Graph(format!("unexpected format tag {:?}", self.format)));
        }
        if self.batch_size == 0 {
            return Err(EvalErr::Graph("batch size must be non-zero".into()));
        }
        if !matches!(self.nodes.last(), Some(GraphNode::CrossEntropyHead)) {
            return Err(EvalErr::Graph("graph does not end in a cross-entropy head".into()));
        }

        let mut width = NINPUT;
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                GraphNode::Linear { weights, biases } => {
                    if weights.rows != width {
                        return Err(EvalErr::Shape { what: "graph node input size", got: weights.rows, expected: width });
                    }
                    let expected = weights.rows.checked_mul(weights.cols).ok_or(EvalErr::Shape {
                        what: "graph weight count",
                        got: weights.data.len(),
                        expected: usize::MAX,
                    })?;
                    if weights.data.len() != expected {
                        return Err(EvalErr::Shape { what: "graph weight count", got: weights.data.len(), expected });
                    }
                    if biases.len() != weights.cols {
                        return Err(EvalErr::Shape { what: "graph bias count", got: biases.len(), expected: weights.cols });
                    }
                    width = weights.cols;
                }
                GraphNode::Activation { .. } => {}
                GraphNode::CrossEntropyHead if i + 1 != self.nodes.len() => {
                    return Err(EvalErr::Graph(format!("node {i}: head before the last node")));
                }
                GraphNode::CrossEntropyHead => {}
            }
        }

        if width != NCLASSES {
            return Err(EvalErr::Shape { what: "graph output size", got: width, expected: NCLASSES });
        }
        Ok(())
    }

    /// Replays the graph over the first `count` examples, `batch_size` at a
    /// time, on a dedicated pool of `n_threads` workers.
    pub fn replay(&self, images: &[f64], labels: &[f64], count: usize, n_threads: usize) -> Result<EvalResult> {
        check_buffers(images, labels, count)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(std::io::Error::other)?;

        let starts: Vec<usize> = (0..count).step_by(self.batch_size).collect();
        let outputs: Vec<(Vec<usize>, Vec<f64>)> = pool.install(|| {
            starts
                .par_iter()
                .map(|&s| self.replay_chunk(images, labels, s, (s + self.batch_size).min(count)))
                .collect()
        });

        let mut pred = Vec::with_capacity(count);
        let mut loss = Vec::with_capacity(count);
        for (p, l) in outputs {
            pred.extend(p);
            loss.extend(l);
        }

        Ok(EvalResult::from_predictions(pred, loss, &labels[..count * NCLASSES]))
    }

    fn replay_chunk(&self, images: &[f64], labels: &[f64], start: usize, end: usize) -> (Vec<usize>, Vec<f64>) {
        let rows = end - start;
        let mut x = Matrix::from_slice(rows, NINPUT, &images[start * NINPUT..end * NINPUT]);
        let mut pred = Vec::with_capacity(rows);
        let mut loss = Vec::with_capacity(rows);

        for node in &self.nodes {
            match node {
                GraphNode::Linear { weights, biases } => {
                    let mut z = &x * weights;
                    z.add_row(biases);
                    x = z;
                }
                GraphNode::Activation { function } => function.apply(&mut x),
                GraphNode::CrossEntropyHead => {
                    for r in 0..rows {
                        let row = x.row_mut(r);
                        log_softmax_in_place(row);
                        let label = &labels[(start + r) * NCLASSES..(start + r + 1) * NCLASSES];
                        pred.push(argmax(row));
                        loss.push(CrossEntropyLoss::loss_from_log_probs(row, label));
                    }
                }
            }
        }

        (pred, loss)
    }
}

fn push_layer(nodes: &mut Vec<GraphNode>, layer: &Dense, activation: ActivationFunction) {
    nodes.push(GraphNode::Linear {
        weights: layer.weights.clone(),
        biases: layer.biases.clone(),
    });
    if activation != ActivationFunction::Identity {
        nodes.push(GraphNode::Activation { function: activation });
    }
}

/// Loads the graph at `path` and replays it on the CPU with `n_threads`
/// workers. Any failure (missing file, wrong format, bad shapes) yields an
/// unsuccessful result so the caller can fall back to building the model.
pub fn eval_precomputed_graph(
    path: &str,
    images: &[f64],
    labels: &[f64],
    count: usize,
    n_threads: usize,
) -> EvalResult {
    let graph = match ComputeGraph::load_json(path) {
        Ok(graph) => graph,
        Err(e) => {
            warn!("could not load a compute graph from {path}: {e}");
            return EvalResult::failed();
        }
    };
    info!("replaying compute graph from {path} with {n_threads} threads");
    debug!("graph has {} nodes, batch size {}", graph.nodes.len(), graph.batch_size);

    match graph.replay(images, labels, count, n_threads) {
        Ok(result) => result,
        Err(e) => {
            warn!("compute graph replay failed: {e}");
            EvalResult::failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(rows: usize, cols: usize) -> GraphNode {
        GraphNode::Linear { weights: Matrix::zeros(rows, cols), biases: vec![0.0; cols] }
    }

    fn graph(nodes: Vec<GraphNode>) -> ComputeGraph {
        ComputeGraph { format: GRAPH_FORMAT.to_owned(), batch_size: 4, nodes }
    }

    #[test]
    fn well_formed_graph_validates() {
        let g = graph(vec![
            linear(NINPUT, 8),
            GraphNode::Activation { function: ActivationFunction::ReLU },
            linear(8, NCLASSES),
            GraphNode::CrossEntropyHead,
        ]);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn graph_without_head_is_rejected() {
        let g = graph(vec![linear(NINPUT, NCLASSES)]);
        assert!(matches!(g.validate(), Err(EvalErr::Graph(_))));
    }

    #[test]
    fn broken_chain_is_rejected() {
        let g = graph(vec![linear(NINPUT, 8), linear(9, NCLASSES), GraphNode::CrossEntropyHead]);
        assert!(matches!(g.validate(), Err(EvalErr::Shape { got: 9, expected: 8, .. })));
    }

    #[test]
    fn hidden_softmax_is_a_valid_node() {
        let g = graph(vec![
            linear(NINPUT, 8),
            GraphNode::Activation { function: ActivationFunction::Softmax },
            linear(8, NCLASSES),
            GraphNode::CrossEntropyHead,
        ]);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn overflowing_weight_shape_is_rejected() {
        let weights = Matrix { rows: NINPUT, cols: usize::MAX / 2, data: vec![] };
        let g = graph(vec![
            GraphNode::Linear { weights, biases: vec![] },
            GraphNode::CrossEntropyHead,
        ]);
        assert!(matches!(g.validate(), Err(EvalErr::Shape { what: "graph weight count", .. })));
    }

    #[test]
    fn wrong_format_tag_is_rejected() {
        let mut g = graph(vec![linear(NINPUT, NCLASSES), GraphNode::CrossEntropyHead]);
        g.format = "something-else".into();
        assert!(matches!(g.validate(), Err(EvalErr::Graph(_))));
    }

    #[test]
    fn replay_predicts_from_logits() {
        // Class = index of the lit pixel among the first ten.
        let mut weights = Matrix::zeros(NINPUT, NCLASSES);
        for c in 0..NCLASSES {
            weights.data[c * NCLASSES + c] = 4.0;
        }
        let g = graph(vec![
            GraphNode::Linear { weights, biases: vec![0.0; NCLASSES] },
            GraphNode::CrossEntropyHead,
        ]);

        let mut images = vec![0.0; 3 * NINPUT];
        let mut labels = vec![0.0; 3 * NCLASSES];
        for (i, class) in [2usize, 9, 5].into_iter().enumerate() {
            images[i * NINPUT + class] = 1.0;
            labels[i * NCLASSES + class] = 1.0;
        }

        let result = g.replay(&images, &labels, 3, 2).unwrap();
        assert_eq!(result.predictions(), &[2, 9, 5]);
        assert!(result.correct().iter().all(|&c| c));
    }
}
