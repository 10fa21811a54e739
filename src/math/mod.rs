pub mod matrix;

pub use matrix::Matrix;

/// Index of the maximum element in a slice. Ties resolve to the lowest
/// index; NaN compares as equal; an empty slice yields 0.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &x)| match best {
            Some((_, b)) if x <= b || x.is_nan() => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::argmax;

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[]), 0);
        assert_eq!(argmax(&[0.0, 0.0, 1.0]), 2);
    }
}
