use derive_builder::Builder;
use num_traits::Float;

/// Dense two-dimensional numeric table read from a result dataset.
///
/// Values are stored in row-major order (C-style), the layout used by
/// the container for every tabular dataset.
#[derive(Debug, Clone, Default, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Table {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl TableBuilder {
    fn validate(&self) -> Result<(), String> {
        if let (Some(rows), Some(cols), Some(values)) = (self.rows, self.cols, &self.values) {
            let expect = rows * cols;
            if values.len() != expect {
                return Err(format!(
                    "values length ({}) must be rows * cols ({} * {} = {})",
                    values.len(),
                    rows,
                    cols,
                    expect
                ));
            }
        }
        Ok(())
    }
}

impl Table {
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn col(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        assert!(col < self.cols);
        (0..self.rows).map(move |row| self.get(row, col))
    }

    /// Returns a copy of column `col`.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.col(col).collect()
    }

    /// Sum of column `col`.
    pub fn col_sum(&self, col: usize) -> f64 {
        sum(&self.column(col))
    }
}

/// Sums the elements of `a` in index order.
pub fn sum<T: Float>(a: &[T]) -> T {
    a.iter().fold(T::zero(), |acc, &v| acc + v)
}

/// Returns the smallest and largest element of `a`, or `None` if empty.
/// Both are NaN when any element is NaN.
pub fn min_max<T: Float>(a: &[T]) -> Option<(T, T)> {
    let first = *a.first()?;
    if a.iter().any(|v| v.is_nan()) {
        return Some((T::nan(), T::nan()));
    }
    Some(
        a.iter()
            .skip(1)
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{format_err, Result};

    #[test]
    fn test_build_and_columns() -> Result<()> {
        let t = TableBuilder::default()
            .rows(2)
            .cols(4)
            .values(vec![10.0, 5.0, 1.0, 1.0, 20.0, 8.0, 1.0, 1.0])
            .build()?;

        assert_eq!((t.rows(), t.cols()), (2, 4));
        assert_eq!(t.column(0), vec![10.0, 20.0]);
        assert_eq!(t.get(1, 1), 8.0);
        assert_eq!(t.col_sum(1), 13.0);
        Ok(())
    }

    #[test]
    fn test_build_rejects_bad_length() -> Result<()> {
        let result = TableBuilder::default()
            .rows(2)
            .cols(2)
            .values(vec![1.0, 2.0, 3.0])
            .build();
        if result.is_ok() {
            return Err(format_err!("3 values must not fill a 2x2 table"));
        }
        Ok(())
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[1.02, 0.98, 1.05]), Some((0.98, 1.05)));
        assert_eq!(min_max::<f64>(&[]), None);
        assert_eq!(sum::<f64>(&[]), 0.0);
    }

    #[test]
    fn test_min_max_keeps_nan() -> Result<()> {
        let (lo, hi) = min_max(&[f64::NAN, 0.98]).ok_or(format_err!("empty"))?;
        assert!(lo.is_nan() && hi.is_nan());
        let (lo, hi) = min_max(&[1.0, 0.98, f64::NAN]).ok_or(format_err!("empty"))?;
        assert!(lo.is_nan() && hi.is_nan());
        Ok(())
    }
}
