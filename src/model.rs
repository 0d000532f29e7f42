//! Model artifact boundary
//!
//! The trained regressor is an external collaborator: a `life.model.v1`
//! JSON artifact exported by the training process. This crate only consumes
//! it — one load at startup, immutable afterwards. The artifact exposes the
//! three things the pipeline needs: the declared feature order, single-row
//! prediction, and per-feature importances.
//!
//! Prediction is tree-ensemble evaluation: `base_score` plus the leaf value
//! reached in each regression tree by threshold traversal (left when
//! `value < threshold`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Current model artifact version
pub const MODEL_VERSION: &str = "life.model.v1";

/// The operations the pipeline needs from any trained regressor.
///
/// The model is opaque beyond this surface; callers never see its structure.
pub trait RegressionModel {
    /// Declared feature names, in the order `predict` expects them
    fn feature_names(&self) -> &[String];

    /// Predict one scalar from one row in declared feature order
    fn predict(&self, row: &[f64]) -> Result<f64, PredictError>;

    /// One non-negative importance score per feature, in declared order.
    /// Relative ranking only; not guaranteed to sum to 1.
    fn feature_importances(&self) -> &[f64];
}

/// One node of a regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal split: go `left` when `row[feature] < threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal leaf contributing `value` to the ensemble sum
    Leaf { value: f64 },
}

/// One regression tree stored as a flat node array (root at index 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk the tree for one feature row.
    ///
    /// The node array length bounds the walk, so a malformed tree that
    /// slipped past validation terminates with an error instead of looping.
    fn evaluate(&self, row: &[f64]) -> Result<f64, PredictError> {
        let mut index = 0usize;

        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = *row.get(*feature).ok_or_else(|| {
                        PredictError::InvalidModel(format!(
                            "split references feature index {feature} beyond row width {}",
                            row.len()
                        ))
                    })?;
                    index = if value < *threshold { *left } else { *right };
                }
                None => {
                    return Err(PredictError::InvalidModel(format!(
                        "tree walk reached missing node index {index}"
                    )))
                }
            }
        }

        Err(PredictError::InvalidModel(
            "tree walk exceeded node count (cycle in node graph)".to_string(),
        ))
    }
}

/// Pre-trained tree-ensemble regressor loaded from a `life.model.v1` artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsembleModel {
    /// Must equal [`MODEL_VERSION`]
    pub model_version: String,
    /// Identifier of the training run that produced this artifact
    pub model_id: String,
    /// Declared feature names, fixed order
    pub features: Vec<String>,
    /// Prediction baseline added to every tree sum
    pub base_score: f64,
    /// The ensemble
    pub trees: Vec<RegressionTree>,
    /// Per-feature importance scores, same order as `features`
    pub importances: Vec<f64>,
}

impl TreeEnsembleModel {
    /// Parse an artifact from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let model: TreeEnsembleModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Load an artifact from disk. Done once at process start.
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let json = fs::read_to_string(path)
            .map_err(|e| PredictError::ModelLoad(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Structural checks run at load time. Any failure here is a fatal
    /// configuration error; nothing is retried per request.
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.model_version != MODEL_VERSION {
            return Err(PredictError::InvalidModel(format!(
                "unsupported model version {} (expected {MODEL_VERSION})",
                self.model_version
            )));
        }

        if self.features.is_empty() {
            return Err(PredictError::InvalidModel(
                "artifact declares no features".to_string(),
            ));
        }

        if self.importances.len() != self.features.len() {
            return Err(PredictError::InvalidModel(format!(
                "{} importances for {} features",
                self.importances.len(),
                self.features.len()
            )));
        }

        if let Some(score) = self.importances.iter().find(|s| !(**s >= 0.0)) {
            return Err(PredictError::InvalidModel(format!(
                "negative or non-finite importance score {score}"
            )));
        }

        if self.trees.is_empty() {
            return Err(PredictError::InvalidModel(
                "artifact contains no trees".to_string(),
            ));
        }

        for (tree_index, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(PredictError::InvalidModel(format!(
                    "tree {tree_index} has no nodes"
                )));
            }
            for node in &tree.nodes {
                if let TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } = node
                {
                    if *feature >= self.features.len() {
                        return Err(PredictError::InvalidModel(format!(
                            "tree {tree_index} splits on feature index {feature} but only {} features are declared",
                            self.features.len()
                        )));
                    }
                    if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                        return Err(PredictError::InvalidModel(format!(
                            "tree {tree_index} has child index out of range"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

impl RegressionModel for TreeEnsembleModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, row: &[f64]) -> Result<f64, PredictError> {
        if row.len() != self.features.len() {
            return Err(PredictError::FeatureMismatch {
                expected: self.features.join(", "),
                actual: format!("row of width {}", row.len()),
            });
        }

        let mut sum = self.base_score;
        for tree in &self.trees {
            sum += tree.evaluate(row)?;
        }
        Ok(sum)
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}
