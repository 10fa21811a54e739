use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::eval::stats::Statistic;

/// Uniformly picks one of `n` example indices.
///
/// # Panics
/// Panics if `n == 0`.
pub fn pick_example<R: Rng>(rng: &mut R, n: usize) -> usize {
    rng.gen_range(0..n)
}

/// A generator seeded from the wall clock; differs from run to run.
pub fn time_seeded_rng() -> StdRng {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    StdRng::seed_from_u64(seed)
}

/// Writes the prediction for the sampled example and the aggregate
/// statistics, accuracy as a percentage.
pub fn write_summary<W: Write>(out: &mut W, predicted: usize, loss: Statistic, accuracy: Statistic) -> io::Result<()> {
    writeln!(out, "predicted digit is {predicted}")?;
    writeln!(out, "test_loss={:.6}+-{:.6}", loss.mean, loss.stderr)?;
    writeln!(out, "test_acc={:.2}+-{:.2}%", 100.0 * accuracy.mean, 100.0 * accuracy.stderr)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lines_use_fixed_precision() {
        let mut out = Vec::new();
        write_summary(
            &mut out,
            7,
            Statistic { mean: 0.1234567, stderr: 0.0012 },
            Statistic { mean: 0.9812, stderr: 0.001337 },
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "predicted digit is 7\ntest_loss=0.123457+-0.001200\ntest_acc=98.12+-0.13%\n"
        );
    }

    #[test]
    fn seeded_picks_are_reproducible_and_in_range() {
        let a: Vec<usize> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..50).map(|_| pick_example(&mut rng, 10)).collect()
        };
        let b: Vec<usize> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..50).map(|_| pick_example(&mut rng, 10)).collect()
        };
        assert_eq!(a, b);
        assert!(a.iter().all(|&i| i < 10));
    }
}
