//! Underwriter - loan approval prediction pipeline
//!
//! Trains a binary loan-approval classifier from tabular applicant data and
//! serves single-record predictions from the resulting artifact.
//!
//! # Modules
//!
//! - [`preprocessing`] - feature schema, transform stages, column router
//! - [`training`] - candidate classifiers, cross-validation, model selection
//! - [`artifact`] - the serialized train/serve contract
//! - [`inference`] - artifact loading and the `predict` front-end
//! - [`server`] - REST API over the inference service
//! - [`data`] - training table loading and preparation

pub mod artifact;
pub mod data;
pub mod error;
pub mod inference;
pub mod preprocessing;
pub mod server;
pub mod training;

pub use error::{Result, UnderwriterError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::artifact::PipelineArtifact;
    pub use crate::error::{Result, UnderwriterError};
    pub use crate::inference::{InferenceService, Label, Prediction};
    pub use crate::preprocessing::{ColumnRouter, FeatureSchema, FieldValue, Record};
    pub use crate::training::{train, Classifier, EvaluationResult, ModelSelector, TrainConfig};
}
