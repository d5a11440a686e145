//! Random forest classifier

use crate::error::{Result, UnderwriterError};
use crate::training::tree::DecisionTree;
use ndarray::{Array1, Array2};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Bagged ensemble of Gini trees with sqrt-feature subsampling per split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the forest: one bootstrap sample and one tree per estimator,
    /// built in parallel.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(UnderwriterError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(UnderwriterError::Training("empty training set".to_string()));
        }

        let max_features = ((x.ncols() as f64).sqrt().ceil() as usize).max(1);
        let base_seed = self.seed;

        let trees: Result<Vec<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() as usize) % n_samples)
                    .collect();

                let x_boot = Array2::from_shape_fn((n_samples, x.ncols()), |(i, j)| {
                    x[[sample_indices[i], j]]
                });
                let y_boot =
                    Array1::from_shape_fn(n_samples, |i| y[sample_indices[i]]);

                let mut tree = DecisionTree::new();
                tree.max_depth = self.max_depth;
                tree.min_samples_split = self.min_samples_split;
                tree.min_samples_leaf = self.min_samples_leaf;
                tree.fit(&x_boot, &y_boot, Some(max_features), &mut rng)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        Ok(())
    }

    /// Positive-class probability: mean of the trees' leaf fractions.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(UnderwriterError::NotFitted);
        }

        let mut proba = Array1::zeros(x.nrows());
        for (i, row) in x.outer_iter().enumerate() {
            let mut sum = 0.0;
            for tree in &self.trees {
                sum += tree.predict_row(row)?;
            }
            proba[i] = sum / self.trees.len() as f64;
        }
        Ok(proba)
    }

    /// Hard 0/1 predictions at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}
