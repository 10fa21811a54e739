use std::env;

use crate::error::{EvalErr, Result};
use crate::{NBATCH_LOGICAL, NBATCH_PHYSICAL, NTEST};

/// Sizes used by an evaluation run.
///
/// # Fields
/// - `n_examples`         : how many test examples are loaded and evaluated
/// - `logical_batch_size` : examples the engine treats as one batch
/// - `physical_batch_size`: examples per forward pass; a logical batch is
///                           split into `logical / physical` passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    pub n_examples: usize,
    pub logical_batch_size: usize,
    pub physical_batch_size: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            n_examples: NTEST,
            logical_batch_size: NBATCH_LOGICAL,
            physical_batch_size: NBATCH_PHYSICAL,
        }
    }
}

impl EvalConfig {
    pub fn new(n_examples: usize, logical_batch_size: usize, physical_batch_size: usize) -> Self {
        EvalConfig { n_examples, logical_batch_size, physical_batch_size }
    }

    /// Defaults overridden by `MNIST_NTEST`, `MNIST_NBATCH_LOGICAL` and
    /// `MNIST_NBATCH_PHYSICAL` when set.
    pub fn from_env() -> Result<Self> {
        let defaults = EvalConfig::default();
        let config = EvalConfig {
            n_examples: read_var("MNIST_NTEST", defaults.n_examples)?,
            logical_batch_size: read_var("MNIST_NBATCH_LOGICAL", defaults.logical_batch_size)?,
            physical_batch_size: read_var("MNIST_NBATCH_PHYSICAL", defaults.physical_batch_size)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_batch_split(self.logical_batch_size, self.physical_batch_size)?;
        if self.n_examples == 0 {
            return Err(EvalErr::BatchConfig("n_examples must be at least 1".into()));
        }
        Ok(())
    }
}

/// A logical batch must split evenly into non-empty physical passes.
pub fn check_batch_split(logical: usize, physical: usize) -> Result<()> {
    if physical == 0 || logical == 0 {
        return Err(EvalErr::BatchConfig(format!(
            "batch sizes must be non-zero (logical={logical}, physical={physical})"
        )));
    }
    if physical > logical || logical % physical != 0 {
        return Err(EvalErr::BatchConfig(format!(
            "logical batch size {logical} is not a multiple of physical batch size {physical}"
        )));
    }
    Ok(())
}

fn read_var(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| EvalErr::BatchConfig(format!("{name}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_test_set() {
        let cfg = EvalConfig::default();
        assert_eq!(cfg, EvalConfig::new(10_000, 1_000, 500));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn uneven_split_is_rejected() {
        assert!(check_batch_split(1000, 300).is_err());
        assert!(check_batch_split(500, 1000).is_err());
        assert!(check_batch_split(10, 0).is_err());
        assert!(check_batch_split(10, 5).is_ok());
        assert!(check_batch_split(10, 10).is_ok());
    }

    #[test]
    fn zero_examples_is_rejected() {
        assert!(EvalConfig::new(0, 10, 5).validate().is_err());
    }
}
