//! Gini decision tree for binary classification

use crate::error::{Result, UnderwriterError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf holding the positive-class fraction of its samples
    Leaf { value: f64, n_samples: usize },
    /// Internal split: left when `value <= threshold`
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Binary classification tree split on Gini impurity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Fit the tree. `max_features` limits the features considered per split
    /// (sampled with `rng`); `None` considers all of them.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        max_features: Option<usize>,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(UnderwriterError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(UnderwriterError::Training("empty training set".to_string()));
        }

        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build(x, y, &indices, 0, max_features, rng));
        Ok(())
    }

    /// Positive-class probability for one row.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let mut node = self.root.as_ref().ok_or(UnderwriterError::NotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return Ok(*value),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        max_features: Option<usize>,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let positives = indices.iter().filter(|&&i| y[i] > 0.5).count();
        let leaf = |n: usize, pos: usize| TreeNode::Leaf {
            value: pos as f64 / n.max(1) as f64,
            n_samples: n,
        };

        let pure = positives == 0 || positives == n_samples;
        let depth_reached = self.max_depth.map_or(false, |d| depth >= d);
        if pure || depth_reached || n_samples < self.min_samples_split {
            return leaf(n_samples, positives);
        }

        let Some((feature_idx, threshold)) = self.best_split(x, y, indices, max_features, rng)
        else {
            return leaf(n_samples, positives);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf
        {
            return leaf(n_samples, positives);
        }

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build(x, y, &left_indices, depth + 1, max_features, rng)),
            right: Box::new(self.build(x, y, &right_indices, depth + 1, max_features, rng)),
        }
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        max_features: Option<usize>,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n_features = x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        if let Some(k) = max_features {
            if k < n_features {
                features.shuffle(rng);
                features.truncate(k);
                features.sort_unstable();
            }
        }

        let n = indices.len();
        let total_pos = indices.iter().filter(|&&i| y[i] > 0.5).count();

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature in &features {
            let mut sorted: Vec<(f64, bool)> = indices
                .iter()
                .map(|&i| (x[[i, feature]], y[i] > 0.5))
                .collect();
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_n = 0usize;
            let mut left_pos = 0usize;

            for w in 0..n - 1 {
                left_n += 1;
                if sorted[w].1 {
                    left_pos += 1;
                }
                // Only split between distinct values.
                if sorted[w].0 == sorted[w + 1].0 {
                    continue;
                }

                let right_n = n - left_n;
                let right_pos = total_pos - left_pos;
                let score = (left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(right_pos, right_n))
                    / n as f64;

                if best.map_or(true, |(_, _, s)| score < s) {
                    let threshold = (sorted[w].0 + sorted[w + 1].0) / 2.0;
                    best = Some((feature, threshold, score));
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}
