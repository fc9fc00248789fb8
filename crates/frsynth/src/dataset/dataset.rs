//! Dataset container.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, Axis};

use super::error::DatasetError;

/// Named columns of real values, co-indexed by row.
///
/// # Storage Layout
///
/// Values are stored as `[n_columns, n_rows]` (feature-major). Column order
/// is the declared order and is preserved by every constructor.
///
/// A `Dataset` is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Column names, unique, in declared order.
    names: Vec<String>,

    /// Values: `[n_columns, n_rows]`.
    values: Array2<f64>,
}

impl Dataset {
    /// Create a dataset from column names and a feature-major matrix.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if:
    /// - No columns are provided
    /// - The name count differs from the matrix row count
    /// - Two columns share a name
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self, DatasetError> {
        if names.is_empty() {
            return Err(DatasetError::EmptyColumns);
        }
        if names.len() != values.nrows() {
            return Err(DatasetError::ShapeMismatch {
                expected: names.len(),
                got: values.nrows(),
                field: "columns",
            });
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(DatasetError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self { names, values })
    }

    /// Create a dataset from `(name, values)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`Dataset::new`], plus [`DatasetError::ShapeMismatch`] when
    /// columns have different lengths.
    pub fn from_columns<S, I>(columns: I) -> Result<Self, DatasetError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let columns: Vec<(String, Vec<f64>)> = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect();
        let Some((_, first)) = columns.first() else {
            return Err(DatasetError::EmptyColumns);
        };
        let n_rows = first.len();

        let mut values = Array2::zeros((columns.len(), n_rows));
        let mut names = Vec::with_capacity(columns.len());
        for (i, (name, column)) in columns.into_iter().enumerate() {
            if column.len() != n_rows {
                return Err(DatasetError::ShapeMismatch {
                    expected: n_rows,
                    got: column.len(),
                    field: "rows",
                });
            }
            values.row_mut(i).assign(&ArrayView1::from(column.as_slice()));
            names.push(name);
        }

        Self::new(names, values)
    }

    /// Number of columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.values.nrows()
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.values.ncols()
    }

    /// Column names in declared order.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of column `idx`.
    #[inline]
    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    /// Position of the column called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Values of column `idx` across all rows.
    #[inline]
    pub fn column(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(idx)
    }

    /// Copy of this dataset without the column called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownColumn`] if there is no such column, or
    /// [`DatasetError::EmptyColumns`] if it is the only one.
    pub fn without_column(&self, name: &str) -> Result<Self, DatasetError> {
        let dropped = self
            .index_of(name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))?;
        let keep: Vec<usize> = (0..self.n_columns()).filter(|&c| c != dropped).collect();
        let names = keep.iter().map(|&c| self.names[c].clone()).collect();
        Self::new(names, self.values.select(Axis(0), &keep))
    }

    /// Indices of every row, in order.
    pub fn all_rows(&self) -> Vec<usize> {
        (0..self.n_rows()).collect()
    }

    /// Gather column `idx` at the given rows.
    pub fn gather(&self, idx: usize, rows: &[usize]) -> Vec<f64> {
        let column = self.column(idx);
        rows.iter().map(|&r| column[r]).collect()
    }

    /// Rows (from `rows`) whose value in column `idx` satisfies `pred`.
    pub fn filter_rows<P>(&self, idx: usize, rows: &[usize], pred: P) -> Vec<usize>
    where
        P: Fn(f64) -> bool,
    {
        let column = self.column(idx);
        rows.iter().copied().filter(|&r| pred(column[r])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0, 4.0]),
            ("b", vec![10.0, 20.0, 30.0, 40.0]),
        ])
        .unwrap()
    }

    #[test]
    fn from_columns_keeps_declared_order() {
        let ds = sample();
        assert_eq!(ds.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(ds.n_rows(), 4);
        assert_eq!(ds.column(1).to_vec(), vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn new_rejects_duplicates_and_shape_mismatch() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        let dup = Dataset::new(vec!["x".into(), "x".into()], values.clone());
        assert!(matches!(dup, Err(DatasetError::DuplicateColumn(name)) if name == "x"));

        let short = Dataset::new(vec!["x".into()], values);
        assert!(matches!(short, Err(DatasetError::ShapeMismatch { .. })));

        let empty = Dataset::from_columns(Vec::<(String, Vec<f64>)>::new());
        assert!(matches!(empty, Err(DatasetError::EmptyColumns)));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let result = Dataset::from_columns(vec![("a", vec![1.0, 2.0]), ("b", vec![1.0])]);
        assert!(matches!(
            result,
            Err(DatasetError::ShapeMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn gather_and_filter_follow_row_subsets() {
        let ds = sample();
        let rows = ds.filter_rows(0, &ds.all_rows(), |v| v > 2.0);
        assert_eq!(rows, vec![2, 3]);
        assert_eq!(ds.gather(1, &rows), vec![30.0, 40.0]);

        let nested = ds.filter_rows(1, &rows, |v| v <= 30.0);
        assert_eq!(nested, vec![2]);
    }

    #[test]
    fn without_column_keeps_remaining_order() {
        let ds = Dataset::from_columns(vec![("a", vec![1.0]), ("b", vec![2.0]), ("c", vec![3.0])]).unwrap();
        let dropped = ds.without_column("b").unwrap();
        assert_eq!(dropped.names(), &["a".to_string(), "c".to_string()]);
        assert_eq!(dropped.column(1)[0], 3.0);
        assert!(matches!(ds.without_column("z"), Err(DatasetError::UnknownColumn(_))));

        let single = Dataset::from_columns(vec![("a", vec![1.0])]).unwrap();
        assert!(matches!(single.without_column("a"), Err(DatasetError::EmptyColumns)));
    }
}
