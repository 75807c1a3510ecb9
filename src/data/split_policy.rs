// ============================================================
// Layer 4 — Train/Validation/Test Split Policy
// ============================================================
// Turns a row count and two fractions into three contiguous
// index ranges over the (already shuffled) dataset:
//
//   [0 ........ train_end) [train_end .. val_end) [val_end .. total)
//          train                  validation              test
//
//   train_end = floor(train_pct * total)
//   val_end   = train_end + floor(val_pct * total)
//
// Test is always the remainder, so rows lost to flooring
// land there and the three ranges always cover every row.
//
// Small inputs can legally produce empty partitions, e.g.
// 2 rows at 80/10 → train [0,1), val [1,1), test [1,2).
// That is not an error.
//
// This function does no shuffling; see partitioner.rs.

use std::ops::Range;

use crate::domain::error::PartitionError;
use crate::domain::partition::PartitionKind;

/// Slack allowed on `train_pct + val_pct <= 1` for float error
const FRACTION_SUM_TOLERANCE: f64 = 1e-9;

/// The three ranges produced by [`compute_ranges`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRanges {
    pub train:      Range<usize>,
    pub validation: Range<usize>,
    pub test:       Range<usize>,
}

impl SplitRanges {
    pub fn get(&self, kind: PartitionKind) -> Range<usize> {
        match kind {
            PartitionKind::Train      => self.train.clone(),
            PartitionKind::Validation => self.validation.clone(),
            PartitionKind::Test       => self.test.clone(),
        }
    }

    /// Row count covered by all three ranges
    pub fn total(&self) -> usize {
        self.test.end
    }

    /// (train, validation, test) row counts
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.train.len(), self.validation.len(), self.test.len())
    }
}

/// Check both fractions lie in [0, 1] and leave a non-negative
/// remainder for test.
pub fn validate_fractions(train_pct: f64, val_pct: f64) -> Result<(), PartitionError> {
    for (name, v) in [("train_pct", train_pct), ("val_pct", val_pct)] {
        if !v.is_finite() || !(0.0..=1.0).contains(&v) {
            return Err(PartitionError::InvalidConfig(format!(
                "{name} must be within [0, 1], got {v}"
            )));
        }
    }
    if train_pct + val_pct > 1.0 + FRACTION_SUM_TOLERANCE {
        return Err(PartitionError::InvalidConfig(format!(
            "train_pct + val_pct must not exceed 1, got {} + {} = {}",
            train_pct,
            val_pct,
            train_pct + val_pct
        )));
    }
    Ok(())
}

/// Compute the train / validation / test ranges for `total_rows`.
///
/// # Example
/// ```ignore
/// let r = compute_ranges(10, 0.8, 0.1)?;
/// assert_eq!((r.train, r.validation, r.test), (0..8, 8..9, 9..10));
/// ```
pub fn compute_ranges(
    total_rows: usize,
    train_pct:  f64,
    val_pct:    f64,
) -> Result<SplitRanges, PartitionError> {
    validate_fractions(train_pct, val_pct)?;

    let total     = total_rows as f64;
    let train_end = ((train_pct * total).floor() as usize).min(total_rows);
    let val_end   = (train_end + (val_pct * total).floor() as usize).min(total_rows);

    Ok(SplitRanges {
        train:      0..train_end,
        validation: train_end..val_end,
        test:       val_end..total_rows,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ten_rows_default_split() {
        let r = compute_ranges(10, 0.8, 0.1).unwrap();
        assert_eq!(r.train,      0..8);
        assert_eq!(r.validation, 8..9);
        assert_eq!(r.test,       9..10);
    }

    #[test]
    fn test_two_rows_yields_empty_validation() {
        let r = compute_ranges(2, 0.8, 0.1).unwrap();
        assert_eq!(r.train,      0..1);
        assert_eq!(r.validation, 1..1);
        assert_eq!(r.test,       1..2);
        assert!(r.validation.is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let r = compute_ranges(0, 0.8, 0.1).unwrap();
        assert_eq!(r.sizes(), (0, 0, 0));
    }

    #[test]
    fn test_flooring_shortfall_goes_to_test() {
        // 0.7 * 7 = 4.9 → 4, 0.2 * 7 = 1.4 → 1, test gets 2
        let r = compute_ranges(7, 0.7, 0.2).unwrap();
        assert_eq!(r.sizes(), (4, 1, 2));
    }

    #[test]
    fn test_full_training_split() {
        let r = compute_ranges(10, 1.0, 0.0).unwrap();
        assert_eq!(r.sizes(), (10, 0, 0));
    }

    #[test]
    fn test_invalid_fractions() {
        for (t, v) in [(0.9, 0.2), (-0.1, 0.1), (0.5, 1.5), (f64::NAN, 0.1)] {
            assert!(
                matches!(compute_ranges(10, t, v), Err(PartitionError::InvalidConfig(_))),
                "expected ({t}, {v}) to be rejected"
            );
        }
    }

    #[test]
    fn test_range_lookup_by_kind() {
        let r = compute_ranges(10, 0.8, 0.1).unwrap();
        assert_eq!(r.get(PartitionKind::Validation), 8..9);
        assert_eq!(r.total(), 10);
    }

    proptest! {
        #[test]
        fn ranges_are_disjoint_and_exhaustive(
            total in 0usize..5000,
            train in 0.0f64..=1.0,
            share in 0.0f64..=1.0,
        ) {
            let val = (1.0 - train) * share;
            let r = compute_ranges(total, train, val).unwrap();

            prop_assert_eq!(r.train.start, 0);
            prop_assert_eq!(r.train.end, r.validation.start);
            prop_assert_eq!(r.validation.end, r.test.start);
            prop_assert_eq!(r.test.end, total);

            let (a, b, c) = r.sizes();
            prop_assert_eq!(a + b + c, total);
        }

        #[test]
        fn test_is_the_remainder(
            total in 0usize..5000,
            train in 0.0f64..=0.6,
            val in 0.0f64..=0.4,
        ) {
            let r = compute_ranges(total, train, val).unwrap();
            let train_end = (train * total as f64).floor() as usize;
            let val_end = train_end + (val * total as f64).floor() as usize;
            prop_assert_eq!(r.train.len(), train_end);
            prop_assert_eq!(r.test.len(), total - val_end);
        }
    }
}
