use std::{error::Error, fmt, io};

/// The crate's result type.
pub type Result<T> = std::result::Result<T, EvalErr>;

/// Failures raised while loading data, loading or building a model, or
/// reducing an evaluation result.
#[derive(Debug)]
pub enum EvalErr {
    Io(io::Error),
    Json(serde_json::Error),
    /// A dataset file is missing, truncated or has an unexpected header.
    Dataset {
        path: String,
        reason: String,
    },
    UnknownBackend(String),
    /// A compute graph file is well-formed JSON but not a usable graph.
    Graph(String),
    /// A model or graph does not have the shape the harness expects.
    Shape {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// Invalid logical/physical batch split or example count.
    BatchConfig(String),
    /// `evaluate_model` was called on a handle that `build_model` never completed.
    ModelNotBuilt,
    /// Statistics were requested for an evaluation that did not run.
    Unsuccessful,
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErr::Io(e) => write!(f, "io error: {e}"),
            EvalErr::Json(e) => write!(f, "malformed json: {e}"),
            EvalErr::Dataset { path, reason } => write!(f, "failed to load '{path}': {reason}"),
            EvalErr::UnknownBackend(name) => write!(f, "unknown backend '{name}'"),
            EvalErr::Graph(msg) => write!(f, "invalid compute graph: {msg}"),
            EvalErr::Shape {
                what,
                got,
                expected,
            } => write!(f, "{what} mismatch: got {got}, expected {expected}"),
            EvalErr::BatchConfig(msg) => write!(f, "invalid batch configuration: {msg}"),
            EvalErr::ModelNotBuilt => write!(f, "model was loaded but never built"),
            EvalErr::Unsuccessful => write!(f, "evaluation did not succeed"),
        }
    }
}

impl Error for EvalErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EvalErr::Io(e) => Some(e),
            EvalErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EvalErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for EvalErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl EvalErr {
    pub(crate) fn dataset(path: &str, reason: impl Into<String>) -> Self {
        EvalErr::Dataset {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}
