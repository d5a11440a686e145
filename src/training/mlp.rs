//! Multi-layer perceptron classifier

use crate::error::{Result, UnderwriterError};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Hidden-layer activation function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    Sigmoid,
    Relu,
    Tanh,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    pub hidden_layers: Vec<usize>,
    pub activation: Activation,
    pub learning_rate: f64,
    pub max_epochs: usize,
    pub batch_size: usize,
    /// L2 regularization
    pub alpha: f64,
    pub momentum: f64,
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![256, 128, 64],
            activation: Activation::Sigmoid,
            learning_rate: 0.01,
            max_epochs: 200,
            batch_size: 32,
            alpha: 1e-4,
            momentum: 0.9,
            seed: 42,
        }
    }
}

/// Feedforward network with a sigmoid output unit, trained by mini-batch
/// gradient descent with momentum on the log loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    pub config: MlpConfig,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_features: usize,
    is_fitted: bool,
}

impl Default for MlpClassifier {
    fn default() -> Self {
        Self::new(MlpConfig::default())
    }
}

impl MlpClassifier {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(UnderwriterError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        self.n_features = x.ncols();
        self.initialize_weights();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        let mut velocities_w: Vec<Array2<f64>> = self
            .weights
            .iter()
            .map(|w| Array2::zeros(w.raw_dim()))
            .collect();
        let mut velocities_b: Vec<Array1<f64>> = self
            .biases
            .iter()
            .map(|b| Array1::zeros(b.len()))
            .collect();

        let mut indices: Vec<usize> = (0..n_samples).collect();

        for _epoch in 0..self.config.max_epochs {
            indices.shuffle(&mut rng);

            for batch_start in (0..n_samples).step_by(self.config.batch_size) {
                let batch_end = (batch_start + self.config.batch_size).min(n_samples);
                let batch = &indices[batch_start..batch_end];

                let x_batch =
                    Array2::from_shape_fn((batch.len(), self.n_features), |(i, j)| {
                        x[[batch[i], j]]
                    });
                let y_batch = Array1::from_shape_fn(batch.len(), |i| y[batch[i]]);

                let (activations, z_values) = self.forward(&x_batch);
                let gradients = self.backward(&y_batch, &activations, &z_values);

                let lr = self.config.learning_rate;
                for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    velocities_w[i] =
                        &velocities_w[i] * self.config.momentum - &grad_w * lr;
                    velocities_b[i] =
                        &velocities_b[i] * self.config.momentum - &grad_b * lr;

                    self.weights[i] = &self.weights[i] + &velocities_w[i];
                    self.biases[i] = &self.biases[i] + &velocities_b[i];
                    // L2 weight decay
                    self.weights[i] = &self.weights[i] * (1.0 - self.config.alpha * lr);
                }
            }
        }

        self.is_fitted = true;
        Ok(())
    }

    /// Positive-class probabilities.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(UnderwriterError::NotFitted);
        }
        let (activations, _) = self.forward(x);
        Ok(activations.last().unwrap().column(0).to_owned())
    }

    /// Hard 0/1 predictions at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn initialize_weights(&mut self) {
        self.weights.clear();
        self.biases.clear();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        let mut layer_sizes = vec![self.n_features];
        layer_sizes.extend(&self.config.hidden_layers);
        layer_sizes.push(1);

        for i in 0..layer_sizes.len() - 1 {
            let n_in = layer_sizes[i];
            let n_out = layer_sizes[i + 1];

            // Xavier/Glorot initialization
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let weights: Vec<f64> = (0..n_in * n_out)
                .map(|_| rng.gen::<f64>() * 2.0 * scale - scale)
                .collect();

            self.weights
                .push(Array2::from_shape_vec((n_in, n_out), weights).unwrap());
            self.biases.push(Array1::zeros(n_out));
        }
    }

    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let mut activations = vec![x.clone()];
        let mut z_values = Vec::new();

        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations.last().unwrap().dot(w) + b;
            z_values.push(z.clone());

            let a = if i < self.weights.len() - 1 {
                self.activate(&z)
            } else {
                // Sigmoid output for binary classification
                z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
            };
            activations.push(a);
        }

        (activations, z_values)
    }

    fn backward(
        &self,
        y: &Array1<f64>,
        activations: &[Array2<f64>],
        z_values: &[Array2<f64>],
    ) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y.len() as f64;
        let y_2d = y.clone().insert_axis(Axis(1));

        // Sigmoid output + log loss: the output delta reduces to (a - y) / n.
        let output = activations.last().unwrap();
        let mut delta = (output - &y_2d) / n;

        let mut gradients = Vec::with_capacity(self.weights.len());
        for i in (0..self.weights.len()).rev() {
            let grad_w = activations[i].t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            gradients.push((grad_w, grad_b));

            if i > 0 {
                delta = delta.dot(&self.weights[i].t()) * self.activate_derivative(&z_values[i - 1]);
            }
        }

        gradients.reverse();
        gradients
    }

    fn activate(&self, z: &Array2<f64>) -> Array2<f64> {
        match self.config.activation {
            Activation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
            Activation::Relu => z.mapv(|v| v.max(0.0)),
            Activation::Tanh => z.mapv(|v| v.tanh()),
        }
    }

    fn activate_derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        match self.config.activation {
            Activation::Sigmoid => z.mapv(|v| {
                let s = 1.0 / (1.0 + (-v).exp());
                s * (1.0 - s)
            }),
            Activation::Relu => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Tanh => z.mapv(|v| 1.0 - v.tanh().powi(2)),
        }
    }
}
