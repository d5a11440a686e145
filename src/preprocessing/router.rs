//! Column router: schema-driven dispatch to the transform stages

use crate::error::{Result, UnderwriterError};
use crate::preprocessing::{CategoricalStage, FeatureSchema, NumericStage, Record};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Routes each column to its transform stage and concatenates the outputs
/// into one numeric vector.
///
/// Output layout is fixed at fit time and identical for `transform` and
/// `apply`: numeric columns in schema order, then each categorical column's
/// indicator block in schema order, vocabulary order. The classifier layer
/// depends on this ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnRouter {
    schema: Option<FeatureSchema>,
    numeric: NumericStage,
    categorical: CategoricalStage,
    is_fitted: bool,
}

impl ColumnRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the schema (unless already present) and fit both stages on
    /// their column subsets.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if self.schema.is_none() {
            self.schema = Some(FeatureSchema::derive(df)?);
        }
        let schema = self.schema.as_ref().unwrap().clone();

        if !schema.numeric().is_empty() {
            self.numeric.fit(df, schema.numeric())?;
        }
        if !schema.categorical().is_empty() {
            self.categorical.fit(df, schema.categorical())?;
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform a whole frame into the training matrix.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let schema = self.fitted_schema()?;
        let n_rows = df.height();
        let mut matrix = Array2::zeros((n_rows, self.output_dim()));

        let mut offset = 0;
        for name in schema.numeric() {
            let values = self.numeric.transform_column(df, name)?;
            for (row, v) in values.into_iter().enumerate() {
                matrix[[row, offset]] = v;
            }
            offset += 1;
        }

        for name in schema.categorical() {
            let width = self.categorical.block_width(name);
            let blocks = self.categorical.transform_column(df, name)?;
            for (row, block) in blocks.into_iter().enumerate() {
                for (j, v) in block.into_iter().enumerate() {
                    matrix[[row, offset + j]] = v;
                }
            }
            offset += width;
        }

        Ok(matrix)
    }

    /// Transform one record into a feature vector.
    ///
    /// Every schema column must be present as a key (its value may be null).
    /// Absent keys fail with `MissingColumn` naming all of them, before any
    /// computation.
    pub fn apply(&self, record: &Record) -> Result<Vec<f64>> {
        let schema = self.fitted_schema()?;

        let absent: Vec<String> = schema
            .columns()
            .filter(|name| !record.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !absent.is_empty() {
            return Err(UnderwriterError::MissingColumn { columns: absent });
        }

        let mut vector = Vec::with_capacity(self.output_dim());
        for name in schema.numeric() {
            vector.push(self.numeric.apply(name, &record[name])?);
        }
        for name in schema.categorical() {
            vector.extend(self.categorical.apply(name, &record[name])?);
        }

        Ok(vector)
    }

    /// Width of the output vector.
    pub fn output_dim(&self) -> usize {
        let Some(schema) = self.schema.as_ref() else {
            return 0;
        };
        schema.numeric().len()
            + schema
                .categorical()
                .iter()
                .map(|name| self.categorical.block_width(name))
                .sum::<usize>()
    }

    /// Human-readable name for each output position, e.g. `Income` or
    /// `Area=Urban`.
    pub fn output_labels(&self) -> Vec<String> {
        let Some(schema) = self.schema.as_ref() else {
            return Vec::new();
        };
        let mut labels: Vec<String> = schema.numeric().to_vec();
        for name in schema.categorical() {
            if let Some(params) = self.categorical.params(name) {
                for entry in &params.vocabulary {
                    labels.push(format!("{}={}", name, entry));
                }
            }
        }
        labels
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.schema.as_ref()
    }

    pub fn numeric_stage(&self) -> &NumericStage {
        &self.numeric
    }

    pub fn categorical_stage(&self) -> &CategoricalStage {
        &self.categorical
    }

    fn fitted_schema(&self) -> Result<&FeatureSchema> {
        if !self.is_fitted {
            return Err(UnderwriterError::NotFitted);
        }
        self.schema.as_ref().ok_or(UnderwriterError::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::FieldValue;

    fn loan_frame() -> DataFrame {
        df!(
            "Income" => &[Some(1000.0), None, Some(3000.0), Some(5000.0)],
            "Area" => &["Urban", "Rural", "Urban", "Semiurban"]
        )
        .unwrap()
    }

    fn record(income: FieldValue, area: FieldValue) -> Record {
        let mut r = Record::new();
        r.insert("Income".to_string(), income);
        r.insert("Area".to_string(), area);
        r
    }

    #[test]
    fn test_output_layout() {
        let mut router = ColumnRouter::new();
        router.fit(&loan_frame()).unwrap();

        assert_eq!(router.output_dim(), 4);
        assert_eq!(
            router.output_labels(),
            vec!["Income", "Area=Urban", "Area=Rural", "Area=Semiurban"]
        );
    }

    #[test]
    fn test_scenario_null_income_unknown_area() {
        let mut router = ColumnRouter::new();
        router.fit(&loan_frame()).unwrap();

        let v = router
            .apply(&record(
                FieldValue::Missing,
                FieldValue::Text("Unknown".to_string()),
            ))
            .unwrap();
        assert_eq!(v, vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut router = ColumnRouter::new();
        router.fit(&loan_frame()).unwrap();

        let r = record(FieldValue::Number(5000.0), FieldValue::Text("Rural".into()));
        let first = router.apply(&r).unwrap();
        let second = router.apply(&r).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_key_names_column_and_rejects() {
        let mut router = ColumnRouter::new();
        router.fit(&loan_frame()).unwrap();

        let mut r = Record::new();
        r.insert("Income".to_string(), FieldValue::Number(2000.0));

        let err = router.apply(&r).unwrap_err();
        match err {
            UnderwriterError::MissingColumn { columns } => {
                assert_eq!(columns, vec!["Area".to_string()]);
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_null_valued_key_is_not_missing_column() {
        let mut router = ColumnRouter::new();
        router.fit(&loan_frame()).unwrap();

        let v = router
            .apply(&record(FieldValue::Missing, FieldValue::Missing))
            .unwrap();
        // Null income scales to the median (0.0); null area fills with Urban.
        assert_eq!(v, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_transform_matches_apply_per_row() {
        let mut router = ColumnRouter::new();
        let df = loan_frame();
        router.fit(&df).unwrap();

        let matrix = router.transform(&df).unwrap();
        let records = [
            record(FieldValue::Number(1000.0), FieldValue::Text("Urban".into())),
            record(FieldValue::Missing, FieldValue::Text("Rural".into())),
            record(FieldValue::Number(3000.0), FieldValue::Text("Urban".into())),
            record(FieldValue::Number(5000.0), FieldValue::Text("Semiurban".into())),
        ];

        for (i, r) in records.iter().enumerate() {
            let row: Vec<f64> = matrix.row(i).to_vec();
            assert_eq!(row, router.apply(r).unwrap(), "row {}", i);
        }
    }
}
