//! Decision tree ensembles exported as flat node arrays.
//!
//! Node 0 is the root of every tree. A split sends a row to `left` when
//! `row[feature] <= threshold`, otherwise to `right`. Leaves hold per-class
//! weights (counts or fractions); they are normalised before averaging.

use serde::Deserialize;

use crate::common::error::{PredictorError, PredictorResult};

use super::domain::{check_row, ArtefactHeader, Classifier, ModelKind};

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Clone, Debug, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, idx: usize, n_features: usize, n_classes: usize) -> PredictorResult<()> {
        if self.nodes.is_empty() {
            return Err(PredictorError::invalid_model(format!("tree {idx} has no nodes")));
        }

        for (pos, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(PredictorError::invalid_model(format!(
                            "tree {idx} node {pos} splits on feature {feature} of {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(PredictorError::invalid_model(format!(
                            "tree {idx} node {pos} has a non-finite threshold"
                        )));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(PredictorError::invalid_model(format!(
                            "tree {idx} node {pos} points past the end of the tree"
                        )));
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(PredictorError::invalid_model(format!(
                            "tree {idx} leaf {pos} has {} values for {n_classes} classes",
                            value.len()
                        )));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(PredictorError::invalid_model(format!(
                            "tree {idx} leaf {pos} has negative or non-finite weights"
                        )));
                    }
                    if value.iter().sum::<f64>() <= 0.0 {
                        return Err(PredictorError::invalid_model(format!(
                            "tree {idx} leaf {pos} has zero total weight"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Walk from the root to a leaf and return its weights.
    fn leaf_for(&self, row: &[f64]) -> PredictorResult<&[f64]> {
        let mut at = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(at) {
                Some(Node::Leaf { value }) => return Ok(value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(PredictorError::inference(format!(
                        "node index {at} is out of range"
                    )))
                }
            }
        }
        Err(PredictorError::inference("tree traversal did not reach a leaf"))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ForestModel {
    #[serde(flatten)]
    pub header: ArtefactHeader,
    pub trees: Vec<Tree>,
}

impl ForestModel {
    pub fn validate(&self) -> PredictorResult<()> {
        if self.trees.is_empty() {
            return Err(PredictorError::invalid_model("forest has no trees"));
        }
        let n_classes = self.header.classes.len();
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(idx, tree)| tree.validate(idx, self.header.n_features, n_classes))
    }

    /// Class probabilities averaged over all trees.
    pub fn probabilities(&self, row: &[f64]) -> PredictorResult<Vec<f64>> {
        check_row(row, self.header.n_features)?;

        let mut acc = vec![0.0; self.header.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_for(row)?;
            let total: f64 = leaf.iter().sum();
            for (slot, weight) in acc.iter_mut().zip(leaf) {
                *slot += weight / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        acc.iter_mut().for_each(|p| *p /= n_trees);
        if acc.iter().any(|p| !p.is_finite()) {
            return Err(PredictorError::inference("ensemble produced a non-finite probability"));
        }
        Ok(acc)
    }
}

/// Index of the largest probability; the first one wins ties.
fn argmax(probs: &[f64]) -> usize {
    probs
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (idx, &p)| {
            if p > best.1 {
                (idx, p)
            } else {
                best
            }
        })
        .0
}

impl Classifier for ForestModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Forest
    }

    fn n_features(&self) -> usize {
        self.header.n_features
    }

    fn predict(&self, rows: &[Vec<f64>]) -> PredictorResult<Vec<f64>> {
        rows.iter()
            .map(|row| {
                let probs = self.probabilities(row)?;
                Ok(self.header.classes[argmax(&probs)])
            })
            .collect()
    }
}
