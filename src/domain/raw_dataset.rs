// ============================================================
// Layer 3 — RawDataset Domain Type
// ============================================================
// The single 2-D numeric table the experiment starts from.
//
// Stored row-major in one flat Vec<f32>:
//   row i occupies values[i * row_width .. (i + 1) * row_width]
//
// The first `input_dim` columns of a row are features,
// the rest are regression targets. Where that cut happens is
// decided by the partitioner, not by this type.
//
// Reference: Rust Book §8 (Vectors)

use std::collections::HashSet;
use std::ops::Range;

use crate::domain::error::PartitionError;

#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    values:    Vec<f32>,
    row_width: usize,
}

impl RawDataset {
    /// Build from a flat row-major buffer.
    /// Fails when the buffer is not a whole number of rows.
    pub fn from_flat(values: Vec<f32>, row_width: usize) -> Result<Self, PartitionError> {
        if row_width == 0 {
            return Err(PartitionError::ShapeMismatch(
                "row width must be at least 1".to_string(),
            ));
        }
        if values.len() % row_width != 0 {
            return Err(PartitionError::ShapeMismatch(format!(
                "{} values do not divide into rows of width {}",
                values.len(),
                row_width
            )));
        }
        Ok(Self { values, row_width })
    }

    pub fn len(&self) -> usize {
        self.values.len() / self.row_width
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.row_width)?;
        let end   = start.checked_add(self.row_width)?;
        self.values.get(start..end)
    }

    /// Materialise a new dataset whose row `i` is `self.row(permutation[i])`.
    ///
    /// `permutation` must contain every index in [0, len) exactly once.
    pub fn reordered(&self, permutation: &[usize]) -> Result<Self, PartitionError> {
        let n = self.len();
        if permutation.len() != n {
            return Err(PartitionError::InvalidPermutation(format!(
                "expected {} indices, got {}",
                n,
                permutation.len()
            )));
        }

        let mut seen = HashSet::with_capacity(n);
        let mut values = Vec::with_capacity(self.values.len());
        for &src in permutation {
            if !seen.insert(src) {
                return Err(PartitionError::InvalidPermutation(format!(
                    "index {src} appears more than once"
                )));
            }
            let row = self.row(src).ok_or_else(|| {
                PartitionError::InvalidPermutation(format!("index {src} is outside [0, {n})"))
            })?;
            values.extend_from_slice(row);
        }

        Ok(Self { values, row_width: self.row_width })
    }

    /// Cut the rows in `rows` into (features, targets) column blocks at
    /// `input_dim`. Both blocks are row-major and have `rows.len()` rows.
    pub fn split_columns(
        &self,
        rows:      Range<usize>,
        input_dim: usize,
    ) -> Result<(Vec<f32>, Vec<f32>), PartitionError> {
        if input_dim == 0 || input_dim >= self.row_width {
            return Err(PartitionError::ShapeMismatch(format!(
                "input_dim {} leaves no feature or target columns in rows of width {}",
                input_dim, self.row_width
            )));
        }
        if rows.end > self.len() || rows.start > rows.end {
            return Err(PartitionError::ShapeMismatch(format!(
                "row range {:?} does not fit {} rows",
                rows,
                self.len()
            )));
        }

        let count = rows.len();
        let mut features = Vec::with_capacity(count * input_dim);
        let mut targets  = Vec::with_capacity(count * (self.row_width - input_dim));

        for r in rows {
            let start = r * self.row_width;
            let row   = &self.values[start..start + self.row_width];
            features.extend_from_slice(&row[..input_dim]);
            targets.extend_from_slice(&row[input_dim..]);
        }

        Ok((features, targets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawDataset {
        RawDataset::from_flat(
            vec![
                0.0, 10.0, 20.0,
                1.0, 11.0, 21.0,
                2.0, 12.0, 22.0,
            ],
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_zero_row_width_rejected() {
        let err = RawDataset::from_flat(vec![1.0, 2.0], 0).unwrap_err();
        assert!(matches!(err, PartitionError::ShapeMismatch(_)));
    }

    #[test]
    fn test_flat_must_be_whole_rows() {
        assert!(RawDataset::from_flat(vec![1.0, 2.0, 3.0], 2).is_err());
        let empty = RawDataset::from_flat(Vec::new(), 3).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
    }

    #[test]
    fn test_reordered_moves_whole_rows() {
        let t = table().reordered(&[2, 0, 1]).unwrap();
        assert_eq!(t.row(0).unwrap(), &[2.0, 12.0, 22.0]);
        assert_eq!(t.row(1).unwrap(), &[0.0, 10.0, 20.0]);
        assert_eq!(t.row(2).unwrap(), &[1.0, 11.0, 21.0]);
    }

    #[test]
    fn test_reordered_rejects_bad_permutations() {
        let t = table();
        assert!(matches!(t.reordered(&[0, 1]), Err(PartitionError::InvalidPermutation(_))));
        assert!(matches!(t.reordered(&[0, 0, 1]), Err(PartitionError::InvalidPermutation(_))));
        assert!(matches!(t.reordered(&[0, 1, 5]), Err(PartitionError::InvalidPermutation(_))));
    }

    #[test]
    fn test_huge_index_is_an_error_not_an_overflow() {
        let one = RawDataset::from_flat(vec![1.0, 2.0, 3.0], 3).unwrap();
        assert_eq!(one.row(usize::MAX / 3), None);
        assert!(matches!(
            one.reordered(&[usize::MAX / 3]),
            Err(PartitionError::InvalidPermutation(_))
        ));
    }

    #[test]
    fn test_split_columns() {
        let (f, t) = table().split_columns(1..3, 1).unwrap();
        assert_eq!(f, vec![1.0, 2.0]);
        assert_eq!(t, vec![11.0, 21.0, 12.0, 22.0]);
    }

    #[test]
    fn test_split_columns_needs_target_columns() {
        assert!(matches!(
            table().split_columns(0..3, 3),
            Err(PartitionError::ShapeMismatch(_))
        ));
        assert!(matches!(
            table().split_columns(0..3, 0),
            Err(PartitionError::ShapeMismatch(_))
        ));
    }
}
