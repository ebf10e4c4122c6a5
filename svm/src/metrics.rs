/// Mean exact-match accuracy of `y_pred` against `y_true`.
///
/// Compares pairwise up to the shorter slice; returns 0 for empty input.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return 0.0;
    }
    let hits = y_true
        .iter()
        .zip(y_pred)
        .filter(|(a, b)| a == b)
        .count();
    hits as f64 / n as f64
}
