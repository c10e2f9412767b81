use crate::features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

// --- Public Data Structures ---
// These structs define the human-readable format of the trained classifier
// when serialized to a TOML file.

/// The binary eligibility label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Label 1: eligible for the credit scheme.
    Credible,
    /// Label 0: not currently eligible.
    AtRisk,
}

impl Verdict {
    pub fn label(self) -> u8 {
        match self {
            Verdict::Credible => 1,
            Verdict::AtRisk => 0,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Credible => f.write_str("Credible"),
            Verdict::AtRisk => f.write_str("At-Risk"),
        }
    }
}

/// One node of a decision tree. Splits send `x[feature] <= threshold` left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Probability of the positive (Credible) class at this leaf.
        probability: f64,
    },
}

/// A decision tree stored as a flat node list; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

/// The fitted classifier itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// `sigmoid(intercept + coefficients · x) > threshold` predicts Credible.
    Logistic {
        intercept: f64,
        coefficients: Vec<f64>,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    /// Mean leaf probability across trees `> 0.5` predicts Credible.
    Forest { trees: Vec<DecisionTree> },
}

fn default_threshold() -> f64 {
    0.5
}

/// The top-level, self-contained classifier artifact loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedClassifier {
    /// Column order the classifier was trained with. Must equal [`FEATURE_NAMES`].
    pub feature_names: Vec<String>,
    pub classifier: Classifier,
}

/// Custom error type for classifier loading, saving and prediction.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error(
        "The model was trained on features {found:?}, but this build encodes {expected:?}. The artifact is incompatible."
    )]
    SchemaMismatch {
        found: Vec<String>,
        expected: Vec<String>,
    },
    #[error("Input has {found} feature columns, but the model was trained on {expected}.")]
    MismatchedFeatureCount { found: usize, expected: usize },
    #[error("The classifier returned no label for a single input row.")]
    EmptyPrediction,
    #[error("Logistic model has {found} coefficients, but {expected} features.")]
    MismatchedCoefficientCount { found: usize, expected: usize },
    #[error("Forest model contains no trees.")]
    EmptyForest,
    #[error("Tree {tree}, node {node} is malformed: {reason}")]
    MalformedTree {
        tree: usize,
        node: usize,
        reason: String,
    },
    #[error("Model parameter '{0}' is not a finite number.")]
    NonFiniteParameter(&'static str),
}

/// Anything that maps trained-schema rows to eligibility labels.
pub trait Predictor {
    /// Predicts one label per row of a `[n, FEATURE_COUNT]` matrix.
    fn predict_rows(&self, rows: ArrayView2<f64>) -> Result<Vec<Verdict>, ModelError>;

    fn predict(&self, features: &FeatureVector) -> Result<Verdict, ModelError> {
        let row = features.to_array().insert_axis(Axis(0));
        let mut labels = self.predict_rows(row.view())?;
        labels.pop().ok_or(ModelError::EmptyPrediction)
    }
}

impl Predictor for TrainedClassifier {
    fn predict_rows(&self, rows: ArrayView2<f64>) -> Result<Vec<Verdict>, ModelError> {
        if rows.ncols() != FEATURE_COUNT {
            return Err(ModelError::MismatchedFeatureCount {
                found: rows.ncols(),
                expected: FEATURE_COUNT,
            });
        }

        let verdicts = rows
            .rows()
            .into_iter()
            .map(|row| {
                let credible = match &self.classifier {
                    Classifier::Logistic {
                        intercept,
                        coefficients,
                        threshold,
                    } => internal::logistic_probability(*intercept, coefficients, row) > *threshold,
                    Classifier::Forest { trees } => internal::forest_probability(trees, row) > 0.5,
                };
                if credible {
                    Verdict::Credible
                } else {
                    Verdict::AtRisk
                }
            })
            .collect();

        Ok(verdicts)
    }
}

impl TrainedClassifier {
    /// Checks the artifact against the trained schema and its own structure.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ModelError::SchemaMismatch {
                found: self.feature_names.clone(),
                expected: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
            });
        }

        match &self.classifier {
            Classifier::Logistic {
                intercept,
                coefficients,
                threshold,
            } => {
                if coefficients.len() != FEATURE_COUNT {
                    return Err(ModelError::MismatchedCoefficientCount {
                        found: coefficients.len(),
                        expected: FEATURE_COUNT,
                    });
                }
                if !intercept.is_finite() {
                    return Err(ModelError::NonFiniteParameter("intercept"));
                }
                if coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::NonFiniteParameter("coefficients"));
                }
                if !threshold.is_finite() {
                    return Err(ModelError::NonFiniteParameter("threshold"));
                }
            }
            Classifier::Forest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::EmptyForest);
                }
                for (index, tree) in trees.iter().enumerate() {
                    internal::validate_tree(index, tree)?;
                }
            }
        }

        Ok(())
    }

    /// Saves the classifier to a file in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads and validates a classifier from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        log::info!("Loading classifier from '{}'", path.display());
        let toml_string = fs::read_to_string(path)?;
        let model: TrainedClassifier = toml::from_str(&toml_string)?;
        model.validate()?;
        match &model.classifier {
            Classifier::Logistic { .. } => log::info!("Loaded logistic classifier"),
            Classifier::Forest { trees } => {
                log::info!("Loaded forest classifier with {} trees", trees.len())
            }
        }
        Ok(model)
    }
}

/// Internal module for prediction-specific implementation details.
mod internal {
    use super::*;

    pub(super) fn logistic_probability(
        intercept: f64,
        coefficients: &[f64],
        row: ArrayView1<f64>,
    ) -> f64 {
        let eta = intercept
            + coefficients
                .iter()
                .zip(row.iter())
                .map(|(beta, x)| beta * x)
                .sum::<f64>();
        // Clamp eta to prevent overflow in exp()
        let eta = eta.clamp(-700.0, 700.0);
        1.0 / (1.0 + f64::exp(-eta))
    }

    pub(super) fn forest_probability(trees: &[DecisionTree], row: ArrayView1<f64>) -> f64 {
        let total: f64 = trees.iter().map(|tree| tree_probability(tree, row)).sum();
        total / trees.len() as f64
    }

    /// Walks from the root to a leaf. Validation guarantees children sit after
    /// their parent, so the walk always terminates.
    fn tree_probability(tree: &DecisionTree, row: ArrayView1<f64>) -> f64 {
        let mut index = 0;
        loop {
            match &tree.nodes[index] {
                TreeNode::Leaf { probability } => return *probability,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub(super) fn validate_tree(tree_index: usize, tree: &DecisionTree) -> Result<(), ModelError> {
        let malformed = |node: usize, reason: String| ModelError::MalformedTree {
            tree: tree_index,
            node,
            reason,
        };

        if tree.nodes.is_empty() {
            return Err(malformed(0, "tree has no nodes".to_string()));
        }

        for (index, node) in tree.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(probability) {
                        return Err(malformed(
                            index,
                            format!("leaf probability {probability} is outside [0, 1]"),
                        ));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(malformed(
                            index,
                            format!("feature index {feature} is out of range"),
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(malformed(index, "threshold is not finite".to_string()));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= tree.nodes.len() {
                            return Err(malformed(
                                index,
                                format!(
                                    "child {child} must come after its parent and within {} nodes",
                                    tree.nodes.len()
                                ),
                            ));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
