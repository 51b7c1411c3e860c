//! Oblivious decision-tree ensemble in the training pipeline's JSON export
//! layout.
//!
//! Each tree applies one split per depth level to every sample. Split `d`
//! sets bit `d` of the leaf index when the feature value is strictly
//! greater than the split border. The raw score is the scaled sum of leaf
//! values plus a bias, and the probability is its logistic sigmoid.
//!
//! Only float features and single-dimension leaves (binary classification)
//! are supported.

use std::path::Path;

use log::info;
use serde::Deserialize;

use super::Classifier;
use crate::error::util::safe_read_to_string;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct ModelJson {
    features_info: FeaturesInfo,
    #[serde(default)]
    oblivious_trees: Vec<TreeJson>,
    #[serde(default)]
    scale_and_bias: Option<(f64, BiasJson)>,
}

#[derive(Debug, Deserialize)]
struct FeaturesInfo {
    #[serde(default)]
    float_features: Vec<FloatFeatureJson>,
    #[serde(default)]
    categorical_features: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FloatFeatureJson {
    flat_feature_index: usize,
    #[serde(default)]
    feature_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeJson {
    #[serde(default)]
    splits: Vec<SplitJson>,
    leaf_values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct SplitJson {
    float_feature_index: usize,
    border: f64,
    #[serde(default)]
    split_type: Option<String>,
}

/// Bias is a bare number in older exports and a one-element list in newer
/// ones
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BiasJson {
    Scalar(f64),
    Vector(Vec<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Split {
    feature: usize,
    border: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct ObliviousTree {
    splits: Vec<Split>,
    leaf_values: Vec<f64>,
}

impl ObliviousTree {
    fn leaf_value(&self, features: &[f64]) -> f64 {
        let index = self
            .splits
            .iter()
            .enumerate()
            .fold(0usize, |index, (depth, split)| {
                if features[split.feature] > split.border {
                    index | (1 << depth)
                } else {
                    index
                }
            });
        self.leaf_values[index]
    }
}

/// Gradient-boosted ensemble of oblivious trees
#[derive(Debug, Clone, PartialEq)]
pub struct ObliviousForest {
    n_features: usize,
    feature_names: Option<Vec<String>>,
    trees: Vec<ObliviousTree>,
    scale: f64,
    bias: f64,
}

impl ObliviousForest {
    /// Read and check a model exported as JSON
    pub fn load(path: &Path) -> Result<Self> {
        let contents = safe_read_to_string(path, "classifier artifact")?;
        let forest = Self::from_json(&contents)?;
        info!(
            "Loaded classifier with {} trees over {} features from {}",
            forest.trees.len(),
            forest.n_features,
            path.display()
        );
        Ok(forest)
    }

    /// Parse and check a model from its JSON text
    pub fn from_json(contents: &str) -> Result<Self> {
        let model: ModelJson = serde_json::from_str(contents)
            .map_err(|e| Error::Model(format!("Malformed model JSON: {e}")))?;

        if !model.features_info.categorical_features.is_empty() {
            return Err(Error::Model(
                "Categorical features are not supported".to_string(),
            ));
        }

        let mut float_features = model.features_info.float_features;
        if float_features.is_empty() {
            return Err(Error::Model("Model declares no features".to_string()));
        }
        let n_features = float_features.len();
        float_features.sort_by_key(|f| f.flat_feature_index);
        if float_features
            .iter()
            .enumerate()
            .any(|(idx, f)| f.flat_feature_index != idx)
        {
            return Err(Error::Model(
                "Feature indices must be contiguous from zero".to_string(),
            ));
        }

        let feature_names = float_features
            .iter()
            .map(|f| f.feature_id.clone().filter(|id| !id.is_empty()))
            .collect::<Option<Vec<String>>>();

        let trees = model
            .oblivious_trees
            .into_iter()
            .enumerate()
            .map(|(idx, tree)| Self::check_tree(idx, tree, n_features))
            .collect::<Result<Vec<_>>>()?;

        let (scale, bias) = match model.scale_and_bias {
            None => (1.0, 0.0),
            Some((scale, BiasJson::Scalar(bias))) => (scale, bias),
            Some((scale, BiasJson::Vector(bias))) => match bias.as_slice() {
                [] => (scale, 0.0),
                [bias] => (scale, *bias),
                _ => {
                    return Err(Error::Model(
                        "Multi-dimensional bias is not supported".to_string(),
                    ));
                }
            },
        };

        Ok(Self {
            n_features,
            feature_names,
            trees,
            scale,
            bias,
        })
    }

    fn check_tree(idx: usize, tree: TreeJson, n_features: usize) -> Result<ObliviousTree> {
        if tree.splits.len() >= usize::BITS as usize {
            return Err(Error::Model(format!("Tree {idx} is too deep")));
        }
        let expected_leaves = 1usize << tree.splits.len();
        if tree.leaf_values.len() != expected_leaves {
            return Err(Error::Model(format!(
                "Tree {idx} has {} leaf values, expected {expected_leaves}",
                tree.leaf_values.len()
            )));
        }

        let splits = tree
            .splits
            .into_iter()
            .map(|split| {
                if let Some(kind) = split.split_type.as_deref() {
                    if kind != "FloatFeature" {
                        return Err(Error::Model(format!(
                            "Tree {idx} uses unsupported split type '{kind}'"
                        )));
                    }
                }
                if split.float_feature_index >= n_features {
                    return Err(Error::Model(format!(
                        "Tree {idx} splits on feature {} of {n_features}",
                        split.float_feature_index
                    )));
                }
                Ok(Split {
                    feature: split.float_feature_index,
                    border: split.border,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ObliviousTree {
            splits,
            leaf_values: tree.leaf_values,
        })
    }

    /// Number of trees in the ensemble
    #[must_use]
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw additive score before the sigmoid
    #[must_use]
    pub fn raw_score(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.leaf_value(features)).sum();
        self.scale * sum + self.bias
    }
}

impl Classifier for ObliviousForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.raw_score(features))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
