//! Model selection by cross-validated accuracy

use crate::error::{Result, UnderwriterError};
use crate::training::candidates::{accuracy, Classifier, EvaluationResult};
use crate::training::cross_validation::{CvSummary, StratifiedKFold};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use tracing::info;

/// Runs stratified k-fold cross-validation per candidate and picks the
/// winner by mean accuracy.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    pub folds: usize,
    pub seed: u64,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self { folds: 4, seed: 42 }
    }
}

impl ModelSelector {
    pub fn new(folds: usize, seed: u64) -> Self {
        Self { folds, seed }
    }

    /// Cross-validate every candidate, in declaration order.
    pub fn evaluate(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        candidates: &[Classifier],
    ) -> Result<Vec<EvaluationResult>> {
        let splits = StratifiedKFold::new(self.folds, self.seed).split(y)?;

        let evaluations: Result<Vec<EvaluationResult>> = candidates
            .par_iter()
            .map(|candidate| {
                let mut scores = Vec::with_capacity(splits.len());
                for split in &splits {
                    let x_train = gather_rows(x, &split.train_indices);
                    let y_train = gather_labels(y, &split.train_indices);
                    let x_test = gather_rows(x, &split.test_indices);
                    let y_test = gather_labels(y, &split.test_indices);

                    let mut fold_model = candidate.clone();
                    fold_model.fit(&x_train, &y_train)?;
                    let y_pred = fold_model.predict(&x_test)?;
                    scores.push(accuracy(&y_test, &y_pred));
                }
                Ok(EvaluationResult::new(
                    candidate.name(),
                    CvSummary::from_scores(scores),
                ))
            })
            .collect();
        let evaluations = evaluations?;

        for eval in &evaluations {
            info!(
                candidate = %eval.candidate,
                acc_mean = format!("{:.4}", eval.mean_accuracy).as_str(),
                acc_std = format!("{:.4}", eval.std_accuracy).as_str(),
                "cross-validated candidate"
            );
        }

        Ok(evaluations)
    }

    /// Evaluate all candidates, pick the winner, and refit it on the entire
    /// dataset (cross-validation chooses the model; the deployed parameters
    /// come from the full-data fit).
    pub fn select(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        candidates: Vec<Classifier>,
    ) -> Result<(Classifier, Vec<EvaluationResult>)> {
        if candidates.is_empty() {
            return Err(UnderwriterError::Training(
                "candidate set is empty".to_string(),
            ));
        }

        let evaluations = self.evaluate(x, y, &candidates)?;
        let winner_idx = select_best(&evaluations).ok_or_else(|| {
            UnderwriterError::Training("no candidate produced an evaluation".to_string())
        })?;

        info!(
            candidate = %evaluations[winner_idx].candidate,
            acc_mean = format!("{:.4}", evaluations[winner_idx].mean_accuracy).as_str(),
            "selected best candidate"
        );

        let mut winner = candidates.into_iter().nth(winner_idx).ok_or_else(|| {
            UnderwriterError::Training("winner index out of range".to_string())
        })?;
        winner.fit(x, y)?;

        Ok((winner, evaluations))
    }
}

/// Index of the winning evaluation: strictly highest mean accuracy, ties
/// resolved in favor of the earliest (first-declared) candidate.
pub fn select_best(evaluations: &[EvaluationResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, eval) in evaluations.iter().enumerate() {
        match best {
            None => best = Some(idx),
            Some(b) if eval.mean_accuracy > evaluations[b].mean_accuracy => best = Some(idx),
            _ => {}
        }
    }
    best
}

fn gather_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    Array2::from_shape_fn((indices.len(), x.ncols()), |(i, j)| x[[indices[i], j]])
}

fn gather_labels(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    Array1::from_shape_fn(indices.len(), |i| y[indices[i]])
}
