//! Numeric transform stage: median imputation + standard scaling

use crate::error::{Result, UnderwriterError};
use crate::preprocessing::FieldValue;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fitted parameters for one numeric column.
///
/// `mean` and `std` are computed on the median-imputed column, so the scaled
/// output of an imputed value is exactly what a literal median would produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericParams {
    pub median: f64,
    pub mean: f64,
    pub std: f64,
}

/// Numeric stage: imputes missing values with the training-time median, then
/// scales to zero mean / unit variance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumericStage {
    params: HashMap<String, NumericParams>,
    is_fitted: bool,
}

impl NumericStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the stage on the given columns of the training frame.
    ///
    /// A column with all values missing yields median 0 and std 0; it never
    /// errors and its outputs degenerate to 0.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for name in columns {
            let values = column_values(df, name)?;
            self.params.insert(name.clone(), fit_column(&values));
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Scaled values for one column of a frame, in row order.
    pub fn transform_column(&self, df: &DataFrame, column: &str) -> Result<Vec<f64>> {
        let params = self.column_params(column)?;
        let values = column_values(df, column)?;
        Ok(values
            .into_iter()
            .map(|v| scale(params, v.unwrap_or(params.median)))
            .collect())
    }

    /// Scaled value for one field of a record.
    pub fn apply(&self, column: &str, value: &FieldValue) -> Result<f64> {
        let params = self.column_params(column)?;
        let v = value.as_numeric(column)?.unwrap_or(params.median);
        Ok(scale(params, v))
    }

    pub fn params(&self, column: &str) -> Option<&NumericParams> {
        self.params.get(column)
    }

    fn column_params(&self, column: &str) -> Result<&NumericParams> {
        if !self.is_fitted {
            return Err(UnderwriterError::NotFitted);
        }
        self.params
            .get(column)
            .ok_or_else(|| UnderwriterError::Data(format!("unknown numeric column '{}'", column)))
    }
}

fn scale(params: &NumericParams, value: f64) -> f64 {
    if params.std > f64::EPSILON {
        (value - params.mean) / params.std
    } else {
        0.0
    }
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| UnderwriterError::Data(format!("column '{}' not found", name)))?;
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| UnderwriterError::Data(e.to_string()))?;
    let ca = series
        .f64()
        .map_err(|e| UnderwriterError::Data(e.to_string()))?;
    Ok(ca.into_iter().collect())
}

fn fit_column(values: &[Option<f64>]) -> NumericParams {
    let mut present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let median = if present.is_empty() {
        0.0
    } else if present.len() % 2 == 1 {
        present[present.len() / 2]
    } else {
        let mid = present.len() / 2;
        (present[mid - 1] + present[mid]) / 2.0
    };

    // Mean and std over the median-imputed column (population variance,
    // matching the scaling applied at serve time).
    let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(median)).collect();
    let n = imputed.len().max(1) as f64;
    let mean = imputed.iter().sum::<f64>() / n;
    let variance = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    NumericParams {
        median,
        mean,
        std: variance.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted_stage() -> NumericStage {
        let df = df!(
            "Income" => &[Some(1000.0), None, Some(3000.0), Some(5000.0)]
        )
        .unwrap();
        let mut stage = NumericStage::new();
        stage.fit(&df, &["Income".to_string()]).unwrap();
        stage
    }

    #[test]
    fn test_fit_median_ignores_missing() {
        let stage = fitted_stage();
        let params = stage.params("Income").unwrap();
        assert_eq!(params.median, 3000.0);
        assert_eq!(params.mean, 3000.0);
        assert!((params.std - 2_000_000f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_apply_missing_equals_literal_median() {
        let stage = fitted_stage();
        let from_missing = stage.apply("Income", &FieldValue::Missing).unwrap();
        let from_median = stage.apply("Income", &FieldValue::Number(3000.0)).unwrap();
        assert_eq!(from_missing, from_median);
        assert_eq!(from_missing, 0.0);
    }

    #[test]
    fn test_apply_scales() {
        let stage = fitted_stage();
        let z = stage.apply("Income", &FieldValue::Number(5000.0)).unwrap();
        assert!((z - 2000.0 / 2_000_000f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_all_missing_column_degenerates_to_zero() {
        let df = df!(
            "LoanAmount" => &[None::<f64>, None, None]
        )
        .unwrap();
        let mut stage = NumericStage::new();
        stage.fit(&df, &["LoanAmount".to_string()]).unwrap();

        let params = stage.params("LoanAmount").unwrap();
        assert_eq!(params.median, 0.0);
        assert_eq!(params.std, 0.0);
        assert_eq!(
            stage.apply("LoanAmount", &FieldValue::Number(123.0)).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_zero_variance_outputs_zero() {
        let df = df!(
            "Credit_History" => &[1.0, 1.0, 1.0]
        )
        .unwrap();
        let mut stage = NumericStage::new();
        stage.fit(&df, &["Credit_History".to_string()]).unwrap();
        assert_eq!(
            stage.apply("Credit_History", &FieldValue::Number(1.0)).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_transform_column_matches_apply() {
        let df = df!(
            "Income" => &[Some(1000.0), None, Some(3000.0), Some(5000.0)]
        )
        .unwrap();
        let stage = fitted_stage();
        let transformed = stage.transform_column(&df, "Income").unwrap();

        let expected: Vec<f64> = [
            FieldValue::Number(1000.0),
            FieldValue::Missing,
            FieldValue::Number(3000.0),
            FieldValue::Number(5000.0),
        ]
        .iter()
        .map(|v| stage.apply("Income", v).unwrap())
        .collect();

        assert_eq!(transformed, expected);
    }

    #[test]
    fn test_unfitted_stage_rejected() {
        let stage = NumericStage::new();
        assert!(matches!(
            stage.apply("Income", &FieldValue::Number(1.0)),
            Err(UnderwriterError::NotFitted)
        ));
    }
}
