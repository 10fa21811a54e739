use crate::math::argmax;
use crate::NCLASSES;

/// Per-example outcome of one evaluation run.
///
/// Built once by the engine and read-only afterwards. An unsuccessful result
/// carries no examples and must not be reduced to statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    success: bool,
    pred: Vec<usize>,
    loss: Vec<f64>,
    correct: Vec<bool>,
}

impl EvalResult {
    /// The result of an engine that could not run.
    pub fn failed() -> Self {
        EvalResult { success: false, pred: vec![], loss: vec![], correct: vec![] }
    }

    /// Assembles a successful result from per-example predictions and losses.
    /// Correctness is derived from `labels`, one one-hot row of `NCLASSES`
    /// values per example.
    ///
    /// # Panics
    /// Panics if the three inputs do not describe the same number of examples.
    pub fn from_predictions(pred: Vec<usize>, loss: Vec<f64>, labels: &[f64]) -> Self {
        assert_eq!(pred.len(), loss.len(), "one loss value per prediction");
        assert_eq!(labels.len(), pred.len() * NCLASSES, "one label row per prediction");

        let correct = pred
            .iter()
            .zip(labels.chunks_exact(NCLASSES))
            .map(|(&p, label)| p == argmax(label))
            .collect();

        EvalResult { success: true, pred, loss, correct }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// Number of evaluated examples.
    pub fn len(&self) -> usize {
        self.pred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pred.is_empty()
    }

    /// Predicted class of example `index`, if it was evaluated.
    pub fn prediction(&self, index: usize) -> Option<usize> {
        self.pred.get(index).copied()
    }

    pub fn predictions(&self) -> &[usize] {
        &self.pred
    }

    pub fn losses(&self) -> &[f64] {
        &self.loss
    }

    pub fn correct(&self) -> &[bool] {
        &self.correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(class: usize) -> Vec<f64> {
        let mut v = vec![0.0; NCLASSES];
        v[class] = 1.0;
        v
    }

    #[test]
    fn correctness_follows_true_labels() {
        let labels: Vec<f64> = [3, 7, 0].iter().flat_map(|&c| one_hot(c)).collect();
        let result = EvalResult::from_predictions(vec![3, 1, 0], vec![0.1, 2.0, 0.3], &labels);

        assert!(result.success());
        assert_eq!(result.len(), 3);
        assert_eq!(result.correct(), &[true, false, true]);
        assert_eq!(result.prediction(1), Some(1));
        assert_eq!(result.prediction(3), None);
    }

    #[test]
    fn failed_result_is_empty() {
        let result = EvalResult::failed();
        assert!(!result.success());
        assert!(result.is_empty());
    }
}
