//! I/O utilities for reading univariate series.

use std::path::Path;

use ndarray::Array1;

use crate::error::{DataError, Result};

/// Read a series from a NumPy .npy file holding a 1-D array.
///
/// `f64` arrays are converted to `f32`.
pub fn read_npy_series<P: AsRef<Path>>(path: P) -> Result<Vec<f32>> {
    use ndarray_npy::ReadNpyExt;

    let file = std::fs::File::open(path.as_ref())?;
    let reader = std::io::BufReader::new(file);

    match Array1::<f32>::read_npy(reader) {
        Ok(arr) => Ok(arr.to_vec()),
        Err(e) => {
            let file = std::fs::File::open(path.as_ref())?;
            let reader = std::io::BufReader::new(file);
            let arr_f64 = Array1::<f64>::read_npy(reader)
                .map_err(|_| DataError::FormatError(format!("Failed to read npy file: {}", e)))?;
            Ok(arr_f64.iter().map(|&x| x as f32).collect())
        }
    }
}

/// Read one numeric column of a CSV file with a header row.
///
/// # Arguments
///
/// * `path` - Path to the CSV file
/// * `column` - Column name; `None` takes the last column
///
/// Missing values are rejected rather than imputed.
#[cfg(feature = "polars-io")]
pub fn read_csv_series<P: AsRef<Path>>(path: P, column: Option<&str>) -> Result<Vec<f32>> {
    use polars::prelude::*;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))
        .map_err(|e| DataError::FormatError(format!("Failed to create CSV reader: {}", e)))?
        .finish()
        .map_err(|e| DataError::FormatError(format!("Failed to read CSV: {}", e)))?;

    let col = match column {
        Some(name) => df
            .column(name)
            .map_err(|e| DataError::FormatError(format!("Column '{}' not found: {}", name, e)))?,
        None => df
            .get_columns()
            .last()
            .ok_or_else(|| DataError::FormatError("CSV has no columns".to_string()))?,
    };

    let values = col
        .cast(&DataType::Float32)
        .map_err(|e| DataError::FormatError(format!("Failed to cast column: {}", e)))?;
    let values = values
        .f32()
        .map_err(|e| DataError::FormatError(format!("Failed to get f32 values: {}", e)))?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| DataError::FormatError(format!("Missing value at row {}", row)))
        })
        .collect()
}

/// Split a series chronologically into a training head and a validation
/// tail.
///
/// `valid_ratio` is the fraction of observations assigned to the tail.
///
/// # Errors
///
/// Returns [`DataError::InvalidParameter`] unless `0.0 < valid_ratio < 1.0`.
pub fn split_series(series: &[f32], valid_ratio: f32) -> Result<(&[f32], &[f32])> {
    if !(valid_ratio > 0.0 && valid_ratio < 1.0) {
        return Err(DataError::InvalidParameter(format!(
            "valid_ratio must be in (0, 1), got {}",
            valid_ratio
        )));
    }
    let n_valid = (series.len() as f32 * valid_ratio).round() as usize;
    Ok(series.split_at(series.len() - n_valid.min(series.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::WriteNpyExt;

    #[test]
    fn test_read_npy_f32_and_f64() {
        let dir = tempfile::tempdir().unwrap();

        let f32_path = dir.path().join("a.npy");
        let arr = Array1::from(vec![1.5f32, 2.5, 3.5]);
        arr.write_npy(std::fs::File::create(&f32_path).unwrap()).unwrap();
        assert_eq!(read_npy_series(&f32_path).unwrap(), vec![1.5, 2.5, 3.5]);

        let f64_path = dir.path().join("b.npy");
        let arr = Array1::from(vec![0.25f64, -1.0]);
        arr.write_npy(std::fs::File::create(&f64_path).unwrap()).unwrap();
        assert_eq!(read_npy_series(&f64_path).unwrap(), vec![0.25, -1.0]);
    }

    #[test]
    fn test_read_npy_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_npy_series(dir.path().join("nope.npy")).unwrap_err();
        assert!(matches!(err, DataError::IoError(_)));
    }

    #[test]
    fn test_split_series_is_chronological() {
        let series: Vec<f32> = (0..10).map(|v| v as f32).collect();
        let (train, valid) = split_series(&series, 0.2).unwrap();
        assert_eq!(train, &series[..8]);
        assert_eq!(valid, &[8.0, 9.0]);
    }

    #[test]
    fn test_split_series_rejects_bad_ratio() {
        let series = [1.0, 2.0];
        assert!(split_series(&series, 0.0).is_err());
        assert!(split_series(&series, 1.0).is_err());
        assert!(split_series(&series, f32::NAN).is_err());
    }
}
