//! Quantile breakpoints.
//!
//! Limits are computed the way chroma.js `limits(values, "q", n)` does:
//! the minimum, `n - 1` linearly interpolated interior quantiles, and the
//! maximum. A value belongs to the class of the first limit that is
//! greater than or equal to it.

use serde::Serialize;

/// Result of classifying a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Index of the first breakpoint `>=` the value.
    Class(usize),
    /// The value exceeds every breakpoint (or is NaN).
    OutOfRange,
}

/// Ordered, non-decreasing class limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Breakpoints {
    limits: Vec<f64>,
}

impl Breakpoints {
    /// Computes `count` quantile limits over `values`.
    ///
    /// Non-finite values are ignored. The first limit is the minimum and
    /// the last is the maximum, so `count` limits bound `count - 1`
    /// intervals and the lowest class holds only values equal to the
    /// minimum. With `count == 1` the only limit is the maximum. An empty
    /// value set yields no limits.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    pub fn quantile(values: impl IntoIterator<Item = f64>, count: usize) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() || count == 0 {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        if count == 1 {
            return Self { limits: vec![max] };
        }

        let intervals = count - 1;
        let last = (sorted.len() - 1) as f64;
        let mut limits = Vec::with_capacity(count);
        limits.push(min);

        for i in 1..intervals {
            let p = last * i as f64 / intervals as f64;
            let base = p.floor();
            let idx = base as usize;
            let frac = p - base;

            if frac == 0.0 {
                limits.push(sorted[idx]);
            } else {
                let lo = sorted[idx];
                let hi = sorted[idx + 1];
                // Clamped so rounding can never step outside the neighbors.
                limits.push((lo + (hi - lo) * frac).clamp(lo, hi));
            }
        }

        limits.push(max);
        Self { limits }
    }

    /// Returns the limits in ascending order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.limits
    }

    /// Returns the number of limits (one per class).
    #[must_use]
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    /// Returns `true` if no limits were computed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Returns the class of the first limit `>=` `value`.
    ///
    /// A value equal to a limit belongs to that limit's class, not the
    /// next one.
    #[must_use]
    pub fn classify(&self, value: f64) -> Classification {
        self.limits
            .iter()
            .position(|&limit| limit >= value)
            .map_or(Classification::OutOfRange, Classification::Class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn three_values_four_classes() {
        let bp = Breakpoints::quantile([10.0, 1.0, 5.0], 4);
        let limits = bp.as_slice();
        assert_eq!(limits.len(), 4);
        assert!(approx(limits[0], 1.0));
        assert!(approx(limits[1], 1.0 + 4.0 * (2.0 / 3.0)));
        assert!(approx(limits[2], 5.0 + 5.0 / 3.0));
        assert!(approx(limits[3], 10.0));
    }

    #[test]
    fn limits_are_non_decreasing() {
        let values = [3.0, 3.0, 3.0, 7.0, 1.0, 9.0, 9.0, 2.0, 2.5, 8.0, 3.0];
        for count in 1..8 {
            let bp = Breakpoints::quantile(values, count);
            assert_eq!(bp.len(), count);
            assert!(
                bp.as_slice().windows(2).all(|w| w[0] <= w[1]),
                "limits not sorted for count {count}: {:?}",
                bp.as_slice()
            );
        }
    }

    #[test]
    fn constant_values_give_constant_limits() {
        let bp = Breakpoints::quantile([4.0; 5], 4);
        assert!(bp.as_slice().iter().all(|&l| approx(l, 4.0)));
        assert_eq!(bp.classify(4.0), Classification::Class(0));
    }

    #[test]
    fn computation_is_deterministic() {
        let values = [5.0, 1.0, 2.0, 8.0, 8.0, 3.0, 10.0, 6.0];
        let a = Breakpoints::quantile(values, 5);
        let b = Breakpoints::quantile(values.iter().rev().copied(), 5);
        assert_eq!(a, b);
    }

    #[test]
    fn value_equal_to_limit_takes_that_class() {
        let bp = Breakpoints::quantile([1.0, 5.0, 10.0], 4);
        for (i, &limit) in bp.as_slice().iter().enumerate() {
            assert_eq!(bp.classify(limit), Classification::Class(i));
        }
    }

    #[test]
    fn value_between_limits_takes_upper_class() {
        let bp = Breakpoints::quantile([1.0, 5.0, 10.0], 4);
        assert_eq!(bp.classify(2.0), Classification::Class(1));
        assert_eq!(bp.classify(5.0), Classification::Class(2));
        assert_eq!(bp.classify(-3.0), Classification::Class(0));
    }

    #[test]
    fn out_of_range_above_max_and_for_nan() {
        let bp = Breakpoints::quantile([1.0, 5.0, 10.0], 4);
        assert_eq!(bp.classify(10.01), Classification::OutOfRange);
        assert_eq!(bp.classify(f64::NAN), Classification::OutOfRange);
    }

    #[test]
    fn single_class_uses_max() {
        let bp = Breakpoints::quantile([2.0, 9.0], 1);
        assert_eq!(bp.as_slice(), &[9.0]);
    }

    #[test]
    fn empty_values_classify_everything_out_of_range() {
        let bp = Breakpoints::quantile(std::iter::empty(), 4);
        assert!(bp.is_empty());
        assert_eq!(bp.classify(0.0), Classification::OutOfRange);
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let bp = Breakpoints::quantile([f64::NAN, 1.0, f64::INFINITY, 3.0], 2);
        assert_eq!(bp.as_slice(), &[1.0, 3.0]);
    }
}
