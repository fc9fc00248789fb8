//! CSV loading.
//!
//! The first record is the header of column names; every other cell must
//! parse as `f64`. Surrounding whitespace is trimmed.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use ndarray::Array2;

use super::dataset::Dataset;
use super::error::DatasetError;

impl Dataset {
    /// Load a dataset from a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] on I/O failure, malformed CSV, ragged rows or
    /// non-numeric cells.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading dataset");
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Load a dataset from any CSV source with a header row.
    ///
    /// # Errors
    ///
    /// See [`Dataset::from_csv_path`].
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let names: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let n_columns = names.len();

        // Row-major while reading, transposed once at the end.
        let mut flat = Vec::new();
        let mut n_rows = 0usize;
        for (row_idx, result) in rdr.records().enumerate() {
            let record = result?;
            if record.len() != n_columns {
                return Err(DatasetError::RaggedRow {
                    row: row_idx + 1,
                    expected: n_columns,
                    got: record.len(),
                });
            }
            for (col_idx, cell) in record.iter().enumerate() {
                let value: f64 = cell.parse().map_err(|_| DatasetError::NonNumeric {
                    row: row_idx + 1,
                    column: names[col_idx].clone(),
                    value: cell.to_string(),
                })?;
                flat.push(value);
            }
            n_rows += 1;
        }

        let row_major = Array2::from_shape_vec((n_rows, n_columns), flat).map_err(|_| {
            DatasetError::ShapeMismatch {
                expected: n_rows * n_columns,
                got: 0,
                field: "cells",
            }
        })?;
        let values = row_major.t().as_standard_layout().into_owned();

        tracing::debug!(n_rows, n_columns, "dataset loaded");
        Self::new(names, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_numeric_cells() {
        let csv = "ethnicity,colRank,yExp\n1.5,2,3\n-4, 5.25 ,6\n";
        let ds = Dataset::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(ds.names(), &["ethnicity", "colRank", "yExp"]);
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.column(0).to_vec(), vec![1.5, -4.0]);
        assert_eq!(ds.column(1).to_vec(), vec![2.0, 5.25]);
    }

    #[test]
    fn reports_non_numeric_cell_position() {
        let csv = "a,b\n1,2\n3,oops\n";
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        match err {
            DatasetError::NonNumeric { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "b");
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reports_ragged_rows() {
        let csv = "a,b\n1,2\n3\n";
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::RaggedRow { row: 2, expected: 2, got: 1 }));
    }

    #[test]
    fn header_only_yields_empty_rows() {
        let ds = Dataset::from_csv_reader("a,b\n".as_bytes()).unwrap();
        assert_eq!(ds.n_columns(), 2);
        assert_eq!(ds.n_rows(), 0);
    }
}
