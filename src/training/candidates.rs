//! Candidate classifiers and their common dispatch surface

use crate::error::Result;
use crate::training::cross_validation::CvSummary;
use crate::training::forest::RandomForest;
use crate::training::logistic::LogisticRegression;
use crate::training::mlp::MlpClassifier;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// One candidate classifier, fitted or not.
///
/// The variants mirror the fixed candidate set: a linear model, a tree
/// ensemble, and a small neural network, declared in that order. Declaration
/// order is the tie-break for model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    Logistic(LogisticRegression),
    Forest(RandomForest),
    Mlp(MlpClassifier),
}

impl Classifier {
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::Logistic(_) => "logistic_regression",
            Classifier::Forest(_) => "random_forest",
            Classifier::Mlp(_) => "mlp",
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Classifier::Logistic(m) => m.fit(x, y),
            Classifier::Forest(m) => m.fit(x, y),
            Classifier::Mlp(m) => m.fit(x, y),
        }
    }

    /// Positive-class probabilities.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::Logistic(m) => m.predict_proba(x),
            Classifier::Forest(m) => m.predict_proba(x),
            Classifier::Mlp(m) => m.predict_proba(x),
        }
    }

    /// Hard 0/1 predictions at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::Logistic(m) => m.predict(x),
            Classifier::Forest(m) => m.predict(x),
            Classifier::Mlp(m) => m.predict(x),
        }
    }
}

/// The fixed candidate set, in declaration order.
pub fn default_candidates() -> Vec<Classifier> {
    vec![
        Classifier::Logistic(LogisticRegression::new()),
        Classifier::Forest(RandomForest::new(100)),
        Classifier::Mlp(MlpClassifier::default()),
    ]
}

/// Cross-validated score of one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub candidate: String,
    pub fold_accuracies: Vec<f64>,
    pub mean_accuracy: f64,
    pub std_accuracy: f64,
}

impl EvaluationResult {
    pub fn new(candidate: impl Into<String>, summary: CvSummary) -> Self {
        Self {
            candidate: candidate.into(),
            mean_accuracy: summary.mean,
            std_accuracy: summary.std,
            fold_accuracies: summary.scores,
        }
    }
}

/// Fraction of predictions matching the labels.
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}
