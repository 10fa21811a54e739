/// Categorical cross-entropy between a predicted distribution and a one-hot
/// (or soft) target.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Scalar loss from log-probabilities (the output of a log-softmax):
    ///   L = -sum(expected[i] * log_predicted[i])
    pub fn loss_from_log_probs(log_predicted: &[f64], expected: &[f64]) -> f64 {
        log_predicted.iter().zip(expected.iter())
            .filter(|(_, e)| **e != 0.0)
            .map(|(lp, e)| -e * lp)
            .sum()
    }
}
