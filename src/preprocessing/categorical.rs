//! Categorical transform stage: most-frequent imputation + indicator expansion

use crate::error::{Result, UnderwriterError};
use crate::preprocessing::FieldValue;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fitted parameters for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryParams {
    /// Most frequent present value, ties broken by first encounter.
    pub fill: String,
    /// Distinct present values in first-encounter order. Indicator positions
    /// follow this order.
    pub vocabulary: Vec<String>,
}

/// Categorical stage: imputes missing values with the training-time most
/// frequent value, then expands to one indicator per vocabulary entry.
///
/// A value not seen at fit time produces an all-zero indicator block rather
/// than an error; this is what lets inference tolerate unseen categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoricalStage {
    params: HashMap<String, CategoryParams>,
    is_fitted: bool,
}

impl CategoricalStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the stage on the given columns of the training frame.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for name in columns {
            let values = column_values(df, name)?;
            self.params.insert(name.clone(), fit_column(&values));
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Indicator rows for one column of a frame: one block per row, each of
    /// the column's vocabulary width.
    pub fn transform_column(&self, df: &DataFrame, column: &str) -> Result<Vec<Vec<f64>>> {
        let params = self.column_params(column)?;
        let values = column_values(df, column)?;
        Ok(values
            .into_iter()
            .map(|v| encode(params, v.as_deref()))
            .collect())
    }

    /// Indicator block for one field of a record.
    pub fn apply(&self, column: &str, value: &FieldValue) -> Result<Vec<f64>> {
        let params = self.column_params(column)?;
        let category = value.as_category();
        Ok(encode(params, category.as_deref()))
    }

    /// Vocabulary width of one column's indicator block.
    pub fn block_width(&self, column: &str) -> usize {
        self.params
            .get(column)
            .map(|p| p.vocabulary.len())
            .unwrap_or(0)
    }

    pub fn params(&self, column: &str) -> Option<&CategoryParams> {
        self.params.get(column)
    }

    fn column_params(&self, column: &str) -> Result<&CategoryParams> {
        if !self.is_fitted {
            return Err(UnderwriterError::NotFitted);
        }
        self.params.get(column).ok_or_else(|| {
            UnderwriterError::Data(format!("unknown categorical column '{}'", column))
        })
    }
}

/// Encode one (possibly missing) value against the fitted vocabulary.
fn encode(params: &CategoryParams, value: Option<&str>) -> Vec<f64> {
    let v = value.unwrap_or(params.fill.as_str());
    params
        .vocabulary
        .iter()
        .map(|entry| if entry == v { 1.0 } else { 0.0 })
        .collect()
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| UnderwriterError::Data(format!("column '{}' not found", name)))?;
    let series = column
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| UnderwriterError::Data(e.to_string()))?;
    let ca = series
        .str()
        .map_err(|e| UnderwriterError::Data(e.to_string()))?;
    Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}

fn fit_column(values: &[Option<String>]) -> CategoryParams {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut vocabulary: Vec<String> = Vec::new();

    for value in values.iter().flatten() {
        if !counts.contains_key(value.as_str()) {
            vocabulary.push(value.clone());
        }
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }

    // Strictly-greater comparison in first-encounter order: ties keep the
    // earliest value.
    let mut fill = String::new();
    let mut best = 0usize;
    for entry in &vocabulary {
        let count = counts[entry.as_str()];
        if count > best {
            best = count;
            fill = entry.clone();
        }
    }

    CategoryParams { fill, vocabulary }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted_stage() -> CategoricalStage {
        let df = df!(
            "Area" => &["Urban", "Rural", "Urban", "Semiurban"]
        )
        .unwrap();
        let mut stage = CategoricalStage::new();
        stage.fit(&df, &["Area".to_string()]).unwrap();
        stage
    }

    #[test]
    fn test_fit_vocabulary_order_and_fill() {
        let stage = fitted_stage();
        let params = stage.params("Area").unwrap();
        assert_eq!(params.fill, "Urban");
        assert_eq!(
            params.vocabulary,
            vec!["Urban".to_string(), "Rural".to_string(), "Semiurban".to_string()]
        );
    }

    #[test]
    fn test_tie_broken_by_first_encounter() {
        let df = df!(
            "Gender" => &["Male", "Female", "Female", "Male"]
        )
        .unwrap();
        let mut stage = CategoricalStage::new();
        stage.fit(&df, &["Gender".to_string()]).unwrap();
        assert_eq!(stage.params("Gender").unwrap().fill, "Male");
    }

    #[test]
    fn test_apply_known_category() {
        let stage = fitted_stage();
        let block = stage
            .apply("Area", &FieldValue::Text("Rural".to_string()))
            .unwrap();
        assert_eq!(block, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_apply_missing_uses_most_frequent() {
        let stage = fitted_stage();
        let from_missing = stage.apply("Area", &FieldValue::Missing).unwrap();
        let from_fill = stage
            .apply("Area", &FieldValue::Text("Urban".to_string()))
            .unwrap();
        assert_eq!(from_missing, from_fill);
        assert_eq!(from_missing, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unseen_category_is_all_zero_not_error() {
        let stage = fitted_stage();
        let block = stage
            .apply("Area", &FieldValue::Text("Offshore".to_string()))
            .unwrap();
        assert_eq!(block, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fit_ignores_missing_values() {
        let df = df!(
            "Married" => &[Some("Yes"), None, Some("No"), Some("Yes")]
        )
        .unwrap();
        let mut stage = CategoricalStage::new();
        stage.fit(&df, &["Married".to_string()]).unwrap();

        let params = stage.params("Married").unwrap();
        assert_eq!(params.fill, "Yes");
        assert_eq!(params.vocabulary, vec!["Yes".to_string(), "No".to_string()]);
    }

    #[test]
    fn test_transform_column_matches_apply() {
        let df = df!(
            "Area" => &[Some("Urban"), None, Some("Semiurban")]
        )
        .unwrap();
        let stage = fitted_stage();
        let rows = stage.transform_column(&df, "Area").unwrap();

        assert_eq!(rows[0], stage.apply("Area", &FieldValue::Text("Urban".into())).unwrap());
        assert_eq!(rows[1], stage.apply("Area", &FieldValue::Missing).unwrap());
        assert_eq!(
            rows[2],
            stage.apply("Area", &FieldValue::Text("Semiurban".into())).unwrap()
        );
    }
}
