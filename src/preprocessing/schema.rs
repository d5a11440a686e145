//! Feature schema derivation

use crate::error::{Result, UnderwriterError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered partition of the training columns into numeric and categorical.
///
/// Derived once from the training table and immutable thereafter. The two
/// partitions are exhaustive and disjoint over the feature columns; column
/// order follows the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    numeric: Vec<String>,
    categorical: Vec<String>,
}

impl FeatureSchema {
    /// Derive a schema from a feature frame (label and identifier columns
    /// must already be dropped).
    ///
    /// A column is numeric if its dtype is an integer or float; everything
    /// else, including boolean-like string flags, is categorical.
    pub fn derive(df: &DataFrame) -> Result<Self> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            match col.dtype() {
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64 => numeric.push(name),
                _ => categorical.push(name),
            }
        }

        if numeric.is_empty() && categorical.is_empty() {
            return Err(UnderwriterError::Schema(
                "training table has no usable feature columns".to_string(),
            ));
        }

        Ok(Self {
            numeric,
            categorical,
        })
    }

    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// All schema columns, numeric first, in schema order.
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.numeric.iter().chain(self.categorical.iter())
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_by_dtype() {
        let df = df!(
            "Income" => &[1000.0, 2000.0],
            "Dependents" => &[0i64, 2],
            "Area" => &["Urban", "Rural"]
        )
        .unwrap();

        let schema = FeatureSchema::derive(&df).unwrap();
        assert_eq!(schema.numeric(), &["Income".to_string(), "Dependents".to_string()]);
        assert_eq!(schema.categorical(), &["Area".to_string()]);
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_boolean_flag_is_categorical() {
        let df = df!(
            "Self_Employed" => &[true, false]
        )
        .unwrap();

        let schema = FeatureSchema::derive(&df).unwrap();
        assert!(schema.numeric().is_empty());
        assert_eq!(schema.categorical(), &["Self_Employed".to_string()]);
    }

    #[test]
    fn test_empty_table_rejected() {
        let df = DataFrame::empty();
        assert!(matches!(
            FeatureSchema::derive(&df),
            Err(UnderwriterError::Schema(_))
        ));
    }
}
