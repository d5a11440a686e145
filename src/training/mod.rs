//! Model training
//!
//! Candidate classifiers (logistic regression, random forest, MLP), the
//! stratified cross-validation splitter, and the selector that picks one
//! winner and refits it on the full dataset.

pub mod candidates;
pub mod cross_validation;
pub mod forest;
pub mod logistic;
pub mod mlp;
pub mod selector;
pub mod tree;

pub use candidates::{accuracy, default_candidates, Classifier, EvaluationResult};
pub use cross_validation::{CvSplit, CvSummary, StratifiedKFold};
pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use mlp::{Activation, MlpClassifier, MlpConfig};
pub use selector::{select_best, ModelSelector};
pub use tree::{DecisionTree, TreeNode};

use crate::artifact::PipelineArtifact;
use crate::data::prepare_training;
use crate::error::Result;
use crate::preprocessing::ColumnRouter;
use polars::prelude::DataFrame;
use tracing::info;

/// Training configuration. Everything has a documented default; callers only
/// need the table itself.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Label column with two categorical outcomes
    pub label_column: String,
    /// Row-identifier column to drop before feature derivation
    pub id_column: Option<String>,
    /// Label value mapped to the positive (approved) class
    pub positive_label: String,
    /// Cross-validation fold count
    pub folds: usize,
    /// Seed for fold shuffling
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            label_column: "Loan_Status".to_string(),
            id_column: Some("Loan_ID".to_string()),
            positive_label: "Y".to_string(),
            folds: 4,
            seed: 42,
        }
    }
}

/// Train the full pipeline on a training table: fit the column router,
/// cross-validate the candidate set, refit the winner on all rows, and
/// assemble the artifact.
pub fn train(df: &DataFrame, config: &TrainConfig) -> Result<PipelineArtifact> {
    let (features, labels) = prepare_training(
        df,
        &config.label_column,
        config.id_column.as_deref(),
        &config.positive_label,
    )?;

    let mut router = ColumnRouter::new();
    router.fit(&features)?;
    let x = router.transform(&features)?;

    info!(
        rows = x.nrows(),
        features = x.ncols(),
        "fitted column router"
    );

    let selector = ModelSelector::new(config.folds, config.seed);
    let (classifier, evaluations) = selector.select(&x, &labels, default_candidates())?;

    Ok(PipelineArtifact::new(router, classifier, evaluations))
}
