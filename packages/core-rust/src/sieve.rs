//! Largest-prime search using a quadratic-form (Atkin) sieve.
//!
//! Candidates are marked by toggling entries hit by the forms
//! `4x² + y²`, `3x² + y²` and `3x² − y²` under fixed residues mod 12, then
//! multiples of prime squares are cleared. The table is a request-scoped
//! buffer: every call allocates its own and drops it on return.
//!
//! Loop bounds derived from the square root use `x <= floor(sqrt(limit))`,
//! which includes perfect-square roots.

use crate::error::PipelineError;

/// Largest bound accepted by [`find_largest_prime_below`] by default.
pub const SIEVE_CAPACITY: usize = 50_000_000;

/// Boolean primality table indexed by candidate value.
///
/// After [`SieveTable::mark`] completes, `is_prime(n)` is `true` iff `n` is
/// prime for every `n` in `0..=limit`.
#[derive(Debug)]
pub struct SieveTable {
    flags: Vec<bool>,
    limit: usize,
}

impl SieveTable {
    /// Allocates an all-false table covering `0..=limit`.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            flags: vec![false; limit + 1],
            limit,
        }
    }

    /// Highest candidate covered by the table.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Primality of `n`; `false` for anything outside the table.
    #[must_use]
    pub fn is_prime(&self, n: usize) -> bool {
        self.flags.get(n).copied().unwrap_or(false)
    }

    /// Runs the full marking pass.
    pub fn mark(&mut self) {
        let limit = self.limit;
        let root = floor_sqrt(limit);

        for x in 1..=root {
            for y in 1..=root {
                let n = 4 * x * x + y * y;
                if n <= limit && (n % 12 == 1 || n % 12 == 5) {
                    self.toggle(n);
                }

                let n = 3 * x * x + y * y;
                if n <= limit && n % 12 == 7 {
                    self.toggle(n);
                }

                if x > y {
                    let n = 3 * x * x - y * y;
                    if n <= limit && n % 12 == 11 {
                        self.toggle(n);
                    }
                }
            }
        }

        for n in 5..=root {
            if self.flags[n] {
                let square = n * n;
                for multiple in (square..=limit).step_by(square) {
                    self.flags[multiple] = false;
                }
            }
        }

        // The quadratic forms never reach 2 and 3.
        if limit >= 2 {
            self.flags[2] = true;
        }
        if limit >= 3 {
            self.flags[3] = true;
        }
    }

    /// Highest index marked prime, scanning from the top.
    #[must_use]
    pub fn largest_prime(&self) -> Option<usize> {
        self.flags.iter().rposition(|&flag| flag)
    }

    /// Number of primes in the table.
    #[must_use]
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&flag| flag).count()
    }

    fn toggle(&mut self, n: usize) {
        self.flags[n] = !self.flags[n];
    }
}

/// Returns the largest prime strictly below `bound`.
///
/// `capacity` is the largest bound the caller is willing to allocate a table
/// for; [`SIEVE_CAPACITY`] is the standard policy.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidBound`] when `bound <= 2` (there is no
/// prime below it) or when `bound` exceeds `capacity`.
pub fn find_largest_prime_below(bound: i64, capacity: usize) -> Result<u64, PipelineError> {
    if bound <= 2 {
        return Err(PipelineError::invalid_bound(format!(
            "no prime exists below {bound}; bound must be at least 3"
        )));
    }

    let bound = usize::try_from(bound)
        .ok()
        .filter(|&b| b <= capacity)
        .ok_or_else(|| {
            PipelineError::invalid_bound(format!(
                "bound {bound} exceeds the sieve capacity of {capacity}"
            ))
        })?;

    let mut table = SieveTable::new(bound - 1);
    table.mark();

    tracing::trace!(bound, primes = table.count(), "sieve marked");

    table
        .largest_prime()
        .map(|p| p as u64)
        .ok_or_else(|| PipelineError::invalid_bound(format!("no prime found below {bound}")))
}

/// `floor(sqrt(n))`, corrected for floating-point rounding at large `n`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn floor_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn is_prime_naive(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let mut d = 2;
        while d * d <= n {
            if n % d == 0 {
                return false;
            }
            d += 1;
        }
        true
    }

    #[test]
    fn largest_prime_below_100_is_97() {
        assert_eq!(find_largest_prime_below(100, SIEVE_CAPACITY), Ok(97));
    }

    #[test]
    fn small_bounds() {
        assert_eq!(find_largest_prime_below(3, SIEVE_CAPACITY), Ok(2));
        assert_eq!(find_largest_prime_below(4, SIEVE_CAPACITY), Ok(3));
        assert_eq!(find_largest_prime_below(5, SIEVE_CAPACITY), Ok(3));
        assert_eq!(find_largest_prime_below(6, SIEVE_CAPACITY), Ok(5));
    }

    #[test]
    fn bound_is_exclusive() {
        assert_eq!(find_largest_prime_below(97, SIEVE_CAPACITY), Ok(89));
        assert_eq!(find_largest_prime_below(98, SIEVE_CAPACITY), Ok(97));
    }

    #[test]
    fn rejects_bounds_without_a_prime_below() {
        for bound in [i64::MIN, -5, 0, 1, 2] {
            let err = find_largest_prime_below(bound, SIEVE_CAPACITY).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidBound { .. }), "{bound}");
        }
    }

    #[test]
    fn rejects_bound_above_capacity() {
        let err = find_largest_prime_below(1_001, 1_000).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidBound { .. }));
        assert!(err.message().contains("capacity"));
    }

    #[test]
    fn bound_equal_to_capacity_is_accepted() {
        assert_eq!(find_largest_prime_below(1_000, 1_000), Ok(997));
    }

    #[test]
    fn table_matches_trial_division_up_to_ten_thousand() {
        let mut table = SieveTable::new(10_000);
        table.mark();
        for n in 0..=10_000usize {
            assert_eq!(table.is_prime(n), is_prime_naive(n as u64), "n = {n}");
        }
        assert_eq!(table.count(), 1_229);
    }

    #[test]
    fn squares_of_primes_are_cleared() {
        // 25, 49 and 121 sit in residue classes the forms can toggle.
        let mut table = SieveTable::new(200);
        table.mark();
        for square in [25, 49, 121, 169] {
            assert!(!table.is_prime(square), "{square}");
        }
    }

    #[test]
    fn is_prime_outside_table_is_false() {
        let table = SieveTable::new(10);
        assert!(!table.is_prime(11));
    }

    #[test]
    fn floor_sqrt_handles_perfect_squares() {
        assert_eq!(floor_sqrt(0), 0);
        assert_eq!(floor_sqrt(1), 1);
        assert_eq!(floor_sqrt(24), 4);
        assert_eq!(floor_sqrt(25), 5);
        assert_eq!(floor_sqrt(49_999_999), 7_071);
    }

    #[test]
    fn million_bound() {
        assert_eq!(find_largest_prime_below(1_000_000, SIEVE_CAPACITY), Ok(999_983));
    }

    proptest! {
        #[test]
        fn result_is_the_largest_prime_below_bound(bound in 3i64..20_000) {
            let prime = find_largest_prime_below(bound, SIEVE_CAPACITY).unwrap();
            prop_assert!(prime < bound as u64);
            prop_assert!(is_prime_naive(prime));
            for candidate in (prime + 1)..(bound as u64) {
                prop_assert!(!is_prime_naive(candidate));
            }
        }
    }
}
