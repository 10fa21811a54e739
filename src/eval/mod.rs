pub mod orchestrator;
pub mod result;
pub mod stats;

pub use orchestrator::{evaluate, select_paths, ExecutionPath};
pub use result::EvalResult;
pub use stats::{accuracy_statistic, loss_statistic, Statistic};
