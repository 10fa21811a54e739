use crate::error::{EvalErr, Result};
use crate::eval::result::EvalResult;

/// A sample mean and the standard error of that mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistic {
    pub mean: f64,
    pub stderr: f64,
}

/// Mean per-example loss and its standard error (sample standard deviation
/// over `sqrt(N)`). The standard error is 0 when fewer than two examples exist.
pub fn loss_statistic(result: &EvalResult) -> Result<Statistic> {
    if !result.success() {
        return Err(EvalErr::Unsuccessful);
    }

    let losses = result.losses();
    let n = losses.len();
    if n == 0 {
        return Ok(Statistic { mean: 0.0, stderr: 0.0 });
    }

    let mean = losses.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return Ok(Statistic { mean, stderr: 0.0 });
    }

    let variance = losses.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Ok(Statistic { mean, stderr: (variance / n as f64).sqrt() })
}

/// Fraction of correct predictions in [0, 1] and its Bernoulli standard
/// error `sqrt(p(1-p)/N)`. The standard error is 0 when fewer than two
/// examples exist.
pub fn accuracy_statistic(result: &EvalResult) -> Result<Statistic> {
    if !result.success() {
        return Err(EvalErr::Unsuccessful);
    }

    let correct = result.correct();
    let n = correct.len();
    if n == 0 {
        return Ok(Statistic { mean: 0.0, stderr: 0.0 });
    }

    let ncorrect = correct.iter().filter(|&&c| c).count();
    let p = ncorrect as f64 / n as f64;
    if n == 1 {
        return Ok(Statistic { mean: p, stderr: 0.0 });
    }

    Ok(Statistic { mean: p, stderr: (p * (1.0 - p) / n as f64).sqrt() })
}
