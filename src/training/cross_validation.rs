//! Stratified k-fold cross-validation

use crate::error::{Result, UnderwriterError};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter: each fold preserves the class distribution of
/// the full dataset.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Generate train/test splits from the label array.
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(UnderwriterError::Training(
                "fold count must be at least 2".to_string(),
            ));
        }
        if y.len() < self.n_splits {
            return Err(UnderwriterError::Training(format!(
                "dataset of {} rows cannot be split into {} folds",
                y.len(),
                self.n_splits
            )));
        }

        // Bucket sample indices by class.
        let mut class_indices: HashMap<i64, Vec<usize>> = HashMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // Iterate classes in a fixed order so the split is reproducible.
        let mut classes: Vec<i64> = class_indices.keys().copied().collect();
        classes.sort_unstable();

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for class in classes {
            let indices = class_indices.get_mut(&class).unwrap();
            indices.shuffle(&mut rng);
            for (i, &idx) in indices.iter().enumerate() {
                folds[i % self.n_splits].push(idx);
            }
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let test_indices = folds[fold_idx].clone();
                let train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                CvSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Per-fold scores of one candidate, summarized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvSummary {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CvSummary {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len().max(1) as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            scores,
            mean,
            std: variance.sqrt(),
        }
    }
}
