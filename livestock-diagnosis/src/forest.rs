//! Bagged ensemble of decision trees.
//!
//! Each tree is grown on a bootstrap resample of the training rows using its
//! own RNG derived from the configured seed, so two forests trained with the
//! same seed on the same rows are identical. Prediction is a majority vote
//! over all trees; equal vote counts go to the label that sorts first.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::encoder::FeatureVector;
use crate::error::{DiagnosisError, Result};
use crate::rng::make_rng;
use crate::tree::{DecisionTree, TrainingSet, TreeParams, majority_class};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureRule {
    /// Square root of the feature dimension, at least one
    Sqrt,
    /// Every feature at every split
    All,
}

/// How many features each split examines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxFeatures {
    Count(usize),
    Rule(FeatureRule),
}

impl Default for MaxFeatures {
    fn default() -> Self {
        MaxFeatures::Rule(FeatureRule::Sqrt)
    }
}

impl MaxFeatures {
    pub fn resolve(&self, dimension: usize) -> usize {
        let n = match self {
            MaxFeatures::Count(n) => (*n).min(dimension),
            MaxFeatures::Rule(FeatureRule::Sqrt) => (dimension as f64).sqrt().floor() as usize,
            MaxFeatures::Rule(FeatureRule::All) => dimension,
        };
        n.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
    /// Unbounded when absent
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::default(),
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(DiagnosisError::InvalidConfig(
                "forest.n_trees must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(DiagnosisError::InvalidConfig(
                "forest.min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(DiagnosisError::InvalidConfig(
                "forest.max_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trained, immutable classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
    dimension: usize,
}

impl RandomForest {
    pub fn train<S: AsRef<str>>(
        features: &[FeatureVector],
        labels: &[S],
        config: &ForestConfig,
    ) -> Result<Self> {
        config.validate()?;
        if features.is_empty() {
            return Err(DiagnosisError::EmptyTrainingSet);
        }
        if features.len() != labels.len() {
            return Err(DiagnosisError::InvalidConfig(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }

        let dimension = features[0].dimension();
        if let Some(bad) = features.iter().find(|f| f.dimension() != dimension) {
            return Err(DiagnosisError::DimensionMismatch {
                expected: dimension,
                found: bad.dimension(),
            });
        }

        let classes: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let class_of: Vec<usize> = labels
            .iter()
            .map(|l| {
                classes
                    .binary_search_by(|c| c.as_str().cmp(l.as_ref()))
                    .unwrap_or_default()
            })
            .collect();

        let data = TrainingSet {
            features,
            classes: &class_of,
            n_classes: classes.len(),
            dimension,
        };
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: config.max_features.resolve(dimension),
        };

        let n_rows = features.len();
        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .map(|i| {
                let mut rng = make_rng(config.seed, &format!("tree-{i}"));
                let sample: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree::fit(&data, sample, &params, &mut rng)
            })
            .collect();

        info!(
            "Trained random forest: {} trees, {} rows, {} classes, {} features",
            trees.len(),
            n_rows,
            classes.len(),
            dimension
        );

        Ok(Self {
            classes,
            trees,
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Labels in class index order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn check_dimension(&self, x: &FeatureVector) -> Result<()> {
        if x.dimension() != self.dimension {
            return Err(DiagnosisError::DimensionMismatch {
                expected: self.dimension,
                found: x.dimension(),
            });
        }
        Ok(())
    }

    fn votes(&self, x: &FeatureVector) -> Result<Vec<usize>> {
        self.check_dimension(x)?;
        let mut votes = vec![0usize; self.classes.len()];
        for tree in &self.trees {
            votes[tree.predict(x)] += 1;
        }
        Ok(votes)
    }

    pub fn predict(&self, x: &FeatureVector) -> Result<&str> {
        self.predict_with_share(x).map(|(label, _)| label)
    }

    /// Winning label together with the share of trees that voted for it
    pub fn predict_with_share(&self, x: &FeatureVector) -> Result<(&str, f64)> {
        let votes = self.votes(x)?;
        let winner = majority_class(&votes);
        let label = self.classes[winner].as_str();
        debug!("Forest votes {:?} -> {}", votes, label);
        Ok((label, votes[winner] as f64 / self.trees.len() as f64))
    }

    /// Fraction of trees voting for each label, in class index order
    pub fn vote_shares(&self, x: &FeatureVector) -> Result<Vec<(&str, f64)>> {
        let votes = self.votes(x)?;
        let total = self.trees.len() as f64;
        Ok(self
            .classes
            .iter()
            .zip(votes)
            .map(|(label, v)| (label.as_str(), v as f64 / total))
            .collect())
    }

    /// Share of rows whose predicted label matches the given label
    pub fn accuracy<S: AsRef<str>>(&self, features: &[FeatureVector], labels: &[S]) -> Result<f64> {
        if features.is_empty() {
            return Ok(0.0);
        }
        let mut correct = 0usize;
        for (x, label) in features.iter().zip(labels) {
            if self.predict(x)? == label.as_ref() {
                correct += 1;
            }
        }
        Ok(correct as f64 / features.len() as f64)
    }
}
