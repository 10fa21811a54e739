use std::fmt;

use crate::error::{EvalErr, Result};

/// Selector naming the plain CPU backend, the only one graph replay supports.
pub const CPU: &str = "CPU";

/// Selector naming the multi-threaded CPU backend.
pub const THREADED: &str = "THREADED";

/// Execution targets the native engine can run a built model on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Physical passes run one after another on the calling thread.
    Cpu,
    /// Physical passes of a logical batch run in parallel on the rayon pool.
    Threaded,
}

impl Device {
    /// Resolves a backend selector. Unknown names (e.g. `CUDA0`) are errors.
    pub fn from_name(name: &str) -> Result<Device> {
        match name {
            CPU => Ok(Device::Cpu),
            THREADED => Ok(Device::Threaded),
            other => Err(EvalErr::UnknownBackend(other.to_owned())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Device::Cpu => CPU,
            Device::Threaded => THREADED,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Worker count for graph replay: about half the logical cores plus a small
/// margin, never more than the cores available.
pub fn worker_hint(logical_cores: usize) -> usize {
    logical_cores.min((logical_cores + 4) / 2)
}

/// Logical core count of this machine, 1 if it cannot be determined.
pub fn logical_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_hint_matches_clamp_formula() {
        let cases = [(1, 1), (2, 2), (3, 3), (4, 4), (6, 5), (8, 6), (16, 10), (64, 34)];
        for (cores, expected) in cases {
            assert_eq!(worker_hint(cores), expected, "cores={cores}");
        }
    }

    #[test]
    fn known_backends_resolve() {
        assert_eq!(Device::from_name("CPU").unwrap(), Device::Cpu);
        assert_eq!(Device::from_name("THREADED").unwrap(), Device::Threaded);
        assert_eq!(Device::Threaded.to_string(), "THREADED");
    }

    #[test]
    fn unknown_backend_is_an_error() {
        match Device::from_name("CUDA0") {
            Err(EvalErr::UnknownBackend(name)) => assert_eq!(name, "CUDA0"),
            other => panic!("expected UnknownBackend, got {other:?}"),
        }
        assert!(Device::from_name("cpu").is_err());
    }
}
