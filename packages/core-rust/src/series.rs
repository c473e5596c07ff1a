//! Terms of the Leibniz series `pi = 4 * sum((-1)^k / (2k + 1))`.

/// Computes the `k`-th summand `4 * (-1)^k / (2k + 1)`.
///
/// Pure and total, so independent evaluations can run on any thread.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn term(k: u64) -> f64 {
    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
    4.0 * sign / (2.0 * k as f64 + 1.0)
}

/// Sums terms `0..=n` sequentially, in index order.
///
/// Reference value for the parallel aggregator; the two may differ in the
/// last bits because floating-point addition is not associative.
#[must_use]
pub fn partial_sum(n: u64) -> f64 {
    (0..=n).map(term).sum()
}
