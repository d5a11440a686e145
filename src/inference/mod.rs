//! Inference service
//!
//! Loads exactly one artifact at startup and answers stateless `predict`
//! calls. The artifact is held behind an atomically swappable reference so
//! concurrent predictions never observe a half-replaced router/classifier
//! pair during a reload.

use crate::artifact::PipelineArtifact;
use crate::error::Result;
use crate::preprocessing::Record;
use ndarray::Array2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Prediction outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Approved,
    Denied,
}

/// One prediction: the label plus the model's confidence in it. Ephemeral;
/// persistence is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f64,
}

/// Stateless prediction front-end over an immutable, hot-swappable artifact.
pub struct InferenceService {
    current: RwLock<Arc<PipelineArtifact>>,
}

impl InferenceService {
    /// Wrap an already-loaded artifact.
    pub fn new(artifact: PipelineArtifact) -> Self {
        Self {
            current: RwLock::new(Arc::new(artifact)),
        }
    }

    /// Load the artifact from disk. Any failure here is fatal to startup:
    /// the service must not come up without a valid model.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let artifact = PipelineArtifact::load(path.as_ref())?;
        info!(
            path = %path.as_ref().display(),
            classifier = artifact.classifier.name(),
            trained_at = %artifact.trained_at,
            "loaded pipeline artifact"
        );
        Ok(Self::new(artifact))
    }

    /// Predict one record. Read-only: routes the record through the fitted
    /// column router, applies the classifier's decision function, and maps
    /// the positive class to `Approved`.
    pub fn predict(&self, record: &Record) -> Result<Prediction> {
        let artifact = self.artifact();

        let vector = artifact.router.apply(record)?;
        let width = vector.len();
        let x = Array2::from_shape_vec((1, width), vector)
            .map_err(|e| crate::error::UnderwriterError::Data(e.to_string()))?;

        let proba = artifact.classifier.predict_proba(&x)?[0];
        let label = if proba >= 0.5 {
            Label::Approved
        } else {
            Label::Denied
        };

        Ok(Prediction {
            label,
            confidence: if label == Label::Approved {
                proba
            } else {
                1.0 - proba
            },
        })
    }

    /// Atomically replace the served artifact. In-flight predictions keep
    /// the Arc they cloned and finish on the old pair.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let artifact = PipelineArtifact::load(path.as_ref())?;
        info!(
            path = %path.as_ref().display(),
            classifier = artifact.classifier.name(),
            trained_at = %artifact.trained_at,
            "reloaded pipeline artifact"
        );
        *self.current.write() = Arc::new(artifact);
        Ok(())
    }

    /// Snapshot of the currently served artifact.
    pub fn artifact(&self) -> Arc<PipelineArtifact> {
        self.current.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{ColumnRouter, FieldValue};
    use crate::training::{default_candidates, ModelSelector};
    use ndarray::Array1;
    use polars::prelude::*;
    use super::Label;

    fn service() -> InferenceService {
        let df = df!(
            "Income" => &[Some(900.0), Some(1100.0), None, Some(1000.0),
                          Some(5000.0), Some(5200.0), Some(4800.0), Some(5100.0)],
            "Area" => &["Rural", "Rural", "Rural", "Rural",
                        "Urban", "Urban", "Urban", "Urban"]
        )
        .unwrap();
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);

        let mut router = ColumnRouter::new();
        router.fit(&df).unwrap();
        let x = router.transform(&df).unwrap();
        let (classifier, evaluations) = ModelSelector::default()
            .select(&x, &y, default_candidates())
            .unwrap();

        InferenceService::new(PipelineArtifact::new(router, classifier, evaluations))
    }

    fn record(income: FieldValue, area: FieldValue) -> Record {
        let mut r = Record::new();
        r.insert("Income".to_string(), income);
        r.insert("Area".to_string(), area);
        r
    }

    #[test]
    fn test_predict_labels() {
        let svc = service();

        let approved = svc
            .predict(&record(
                FieldValue::Number(5100.0),
                FieldValue::Text("Urban".into()),
            ))
            .unwrap();
        assert_eq!(approved.label, Label::Approved);
        assert!(approved.confidence >= 0.5);

        let denied = svc
            .predict(&record(
                FieldValue::Number(950.0),
                FieldValue::Text("Rural".into()),
            ))
            .unwrap();
        assert_eq!(denied.label, Label::Denied);
        assert!(denied.confidence >= 0.5);
    }

    #[test]
    fn test_unseen_category_still_predicts() {
        let svc = service();
        let result = svc.predict(&record(
            FieldValue::Number(5000.0),
            FieldValue::Text("Offshore".into()),
        ));
        assert!(result.is_ok());
    }

    #[test]
    fn test_malformed_record_is_typed_error_and_service_survives() {
        let svc = service();

        let mut partial = Record::new();
        partial.insert("Income".to_string(), FieldValue::Number(5000.0));
        assert!(svc.predict(&partial).is_err());

        // The same service keeps answering well-formed requests.
        let ok = svc.predict(&record(
            FieldValue::Number(5000.0),
            FieldValue::Text("Urban".into()),
        ));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_reload_swaps_artifact() {
        let svc = service();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.bin");

        let replacement = service().artifact();
        replacement.save(&path).unwrap();

        svc.reload_from_path(&path).unwrap();
        assert_eq!(svc.artifact().trained_at, replacement.trained_at);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Label::Approved).unwrap(), "\"approved\"");
        assert_eq!(serde_json::to_string(&Label::Denied).unwrap(), "\"denied\"");
    }
}
