//! Feature preprocessing
//!
//! Turns raw tabular records into numeric feature vectors:
//! - [`FeatureSchema`] partitions columns into numeric and categorical
//! - [`NumericStage`] imputes (median) and scales to zero mean / unit variance
//! - [`CategoricalStage`] imputes (most frequent) and expands to indicators
//! - [`ColumnRouter`] dispatches columns to stages and concatenates outputs
//!   in a fixed, reproducible order

mod categorical;
mod numeric;
mod router;
mod schema;

pub use categorical::{CategoricalStage, CategoryParams};
pub use numeric::{NumericParams, NumericStage};
pub use router::ColumnRouter;
pub use schema::FeatureSchema;

use crate::error::{Result, UnderwriterError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One prediction request: feature name to raw value.
///
/// Every schema column must be present as a key; values may be null.
pub type Record = HashMap<String, FieldValue>;

/// A raw field value as it arrives in a record.
///
/// JSON numbers map to `Number`, strings to `Text`, and `null` to `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Interpret the value as numeric. `Missing` yields `None`; text is
    /// accepted when it parses as a float.
    pub fn as_numeric(&self, column: &str) -> Result<Option<f64>> {
        match self {
            FieldValue::Missing => Ok(None),
            FieldValue::Number(v) => Ok(Some(*v)),
            FieldValue::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                UnderwriterError::InvalidValue {
                    column: column.to_string(),
                    value: s.clone(),
                }
            }),
        }
    }

    /// Interpret the value as a category. Numbers are rendered via their
    /// display form so a numeric-looking flag still matches its vocabulary
    /// entry.
    pub fn as_category(&self) -> Option<String> {
        match self {
            FieldValue::Missing => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(v) => Some(v.to_string()),
        }
    }
}
