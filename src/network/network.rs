use serde::{Serialize, Deserialize};

use crate::{
    activation::activation::ActivationFunction,
    error::{EvalErr, Result},
    layers::dense::Dense,
    math::matrix::Matrix,
    network::metadata::ModelMetadata,
};

/// Parameters of one dense layer as stored on disk.
///
/// `weights` is row-major with shape (`input_size`, `size`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerParams {
    pub input_size: usize,
    pub size: usize,
    pub activation: ActivationFunction,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

/// A serialized fully-connected network: the model parameter file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<LayerParams>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    pub fn new(layers: Vec<LayerParams>) -> Network {
        Network { layers, metadata: None }
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Checks every layer's buffers against its declared sizes and that
    /// consecutive layers chain, then materializes them as `Dense` layers.
    pub fn to_layers(&self) -> Result<Vec<Dense>> {
        if self.layers.is_empty() {
            return Err(EvalErr::Shape { what: "layer count", got: 0, expected: 1 });
        }

        let mut layers = Vec::with_capacity(self.layers.len());
        for (i, params) in self.layers.iter().enumerate() {
            if i > 0 && params.input_size != self.layers[i - 1].size {
                return Err(EvalErr::Shape {
                    what: "layer input size",
                    got: params.input_size,
                    expected: self.layers[i - 1].size,
                });
            }
            if params.biases.len() != params.size {
                return Err(EvalErr::Shape {
                    what: "bias count",
                    got: params.biases.len(),
                    expected: params.size,
                });
            }
            let weights = Matrix::from_vec(params.input_size, params.size, params.weights.clone())
                .ok_or(EvalErr::Shape {
                    what: "weight count",
                    got: params.weights.len(),
                    expected: params.input_size * params.size,
                })?;
            layers.push(Dense::new(weights, params.biases.clone(), params.activation));
        }

        Ok(layers)
    }
}
