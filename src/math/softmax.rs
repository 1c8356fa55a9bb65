use crate::math::matrix::Matrix;

/// Normalizes every row of a 2-D buffer into a probability distribution.
///
/// The loss layer takes this as an injected capability rather than calling a
/// concrete function, so tests can substitute their own normalizer and
/// exercise the loss bookkeeping in isolation.
pub trait RowNormalizer {
    fn normalize_rows(&self, m: &mut Matrix);
}

/// Numerically stable row-wise softmax.
pub struct Softmax;

impl RowNormalizer for Softmax {
    /// In-place softmax over each row: subtracts the row maximum before
    /// exponentiating so that large-magnitude scores cannot overflow, then
    /// divides by the row sum. Each output row sums to 1 (up to rounding).
    fn normalize_rows(&self, m: &mut Matrix) {
        for i in 0..m.rows {
            let row = m.row_mut(i);
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mut sum = 0.0;
            for x in row.iter_mut() {
                *x = (*x - max).exp();
                sum += *x;
            }
            for x in row.iter_mut() {
                *x /= sum;
            }
        }
    }
}
