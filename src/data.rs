//! Training table loading and preparation

use crate::error::{Result, UnderwriterError};
use ndarray::Array1;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Load a training table from a CSV file with header and schema inference.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let file = File::open(path.as_ref())
        .map_err(|e| UnderwriterError::Data(format!("failed to open training table: {}", e)))?;

    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file);

    reader
        .finish()
        .map_err(|e| UnderwriterError::Data(e.to_string()))
}

/// Split a training table into a feature frame and a binary label array.
///
/// Drops the identifier column (if named and present), maps the label column
/// to 1.0 for `positive_label` and 0.0 otherwise, and returns the remaining
/// columns untouched.
pub fn prepare_training(
    df: &DataFrame,
    label_column: &str,
    id_column: Option<&str>,
    positive_label: &str,
) -> Result<(DataFrame, Array1<f64>)> {
    let label_series = df
        .column(label_column)
        .map_err(|_| UnderwriterError::Schema(format!("label column '{}' not found", label_column)))?
        .as_materialized_series()
        .clone();

    let labels = binary_labels(&label_series, positive_label)?;

    let mut features = df.clone();
    features = features
        .drop(label_column)
        .map_err(|e| UnderwriterError::Data(e.to_string()))?;

    if let Some(id) = id_column {
        if features.column(id).is_ok() {
            features = features
                .drop(id)
                .map_err(|e| UnderwriterError::Data(e.to_string()))?;
        }
    }

    if features.width() == 0 {
        return Err(UnderwriterError::Schema(
            "no feature columns remain after dropping label and identifier".to_string(),
        ));
    }

    Ok((features, labels))
}

fn binary_labels(series: &Series, positive_label: &str) -> Result<Array1<f64>> {
    let as_str = series
        .cast(&DataType::String)
        .map_err(|e| UnderwriterError::Data(e.to_string()))?;
    let ca = as_str
        .str()
        .map_err(|e| UnderwriterError::Data(e.to_string()))?;

    let mut labels = Vec::with_capacity(series.len());
    for val in ca.into_iter() {
        match val {
            Some(v) => labels.push(if v == positive_label { 1.0 } else { 0.0 }),
            None => {
                return Err(UnderwriterError::Schema(
                    "label column contains missing values".to_string(),
                ))
            }
        }
    }

    Ok(Array1::from_vec(labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df!(
            "Loan_ID" => &["L001", "L002", "L003"],
            "Income" => &[1000.0, 2500.0, 4000.0],
            "Area" => &["Urban", "Rural", "Urban"],
            "Loan_Status" => &["Y", "N", "Y"]
        )
        .unwrap()
    }

    #[test]
    fn test_prepare_training_drops_label_and_id() {
        let df = sample_frame();
        let (features, labels) = prepare_training(&df, "Loan_Status", Some("Loan_ID"), "Y").unwrap();

        assert_eq!(features.width(), 2);
        assert!(features.column("Loan_ID").is_err());
        assert!(features.column("Loan_Status").is_err());
        assert_eq!(labels.to_vec(), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_prepare_training_missing_label_column() {
        let df = sample_frame();
        let result = prepare_training(&df, "Approved", None, "Y");
        assert!(matches!(result, Err(UnderwriterError::Schema(_))));
    }

    #[test]
    fn test_prepare_training_no_features_left() {
        let df = df!(
            "Loan_ID" => &["L001"],
            "Loan_Status" => &["Y"]
        )
        .unwrap();
        let result = prepare_training(&df, "Loan_Status", Some("Loan_ID"), "Y");
        assert!(matches!(result, Err(UnderwriterError::Schema(_))));
    }
}
