//! CART classification trees grown on Gini impurity.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::encoder::FeatureVector;

/// Training rows with labels already mapped to class indices
pub(crate) struct TrainingSet<'a> {
    pub features: &'a [FeatureVector],
    pub classes: &'a [usize],
    pub n_classes: usize,
    pub dimension: usize,
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features examined per split before settling on the best one found
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        class: usize,
    },
    /// Rows with `value <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `rows`. Rows may repeat, as they do
    /// in a bootstrap sample.
    pub(crate) fn fit<R: Rng>(
        data: &TrainingSet<'_>,
        rows: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let root = build_node(data, rows, 0, params, rng);
        Self { root }
    }

    pub fn predict(&self, x: &FeatureVector) -> usize {
        fn descend(node: &TreeNode, x: &FeatureVector) -> usize {
            match node {
                TreeNode::Leaf { class } => *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if f64::from(x.get(*feature)) <= *threshold {
                        descend(left, x)
                    } else {
                        descend(right, x)
                    }
                }
            }
        }
        descend(&self.root, x)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn depth(&self) -> usize {
        fn depth_node(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth_node(left).max(depth_node(right)),
            }
        }
        depth_node(&self.root)
    }

    pub fn node_count(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + count(left) + count(right),
            }
        }
        count(&self.root)
    }
}

fn build_node<R: Rng>(
    data: &TrainingSet<'_>,
    rows: Vec<usize>,
    depth: usize,
    params: &TreeParams,
    rng: &mut R,
) -> TreeNode {
    let counts = class_counts(data, &rows);
    let at_depth_limit = params.max_depth.is_some_and(|max| depth >= max);

    if at_depth_limit || rows.len() < params.min_samples_split || is_pure(&counts) {
        return TreeNode::Leaf {
            class: majority_class(&counts),
        };
    }

    let Some(best) = find_best_split(data, &rows, params.max_features, rng) else {
        return TreeNode::Leaf {
            class: majority_class(&counts),
        };
    };

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .into_iter()
        .partition(|&row| f64::from(data.features[row].get(best.feature)) <= best.threshold);

    TreeNode::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(build_node(data, left_rows, depth + 1, params, rng)),
        right: Box::new(build_node(data, right_rows, depth + 1, params, rng)),
    }
}

fn class_counts(data: &TrainingSet<'_>, rows: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; data.n_classes];
    for &row in rows {
        counts[data.classes[row]] += 1;
    }
    counts
}

fn is_pure(counts: &[usize]) -> bool {
    counts.iter().filter(|&&c| c > 0).count() <= 1
}

/// Most frequent class; ties go to the lowest class index
pub(crate) fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

fn gini_impurity(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Visit features in random order. Once `max_features` have been examined
/// and at least one valid split exists, stop and keep the best.
fn find_best_split<R: Rng>(
    data: &TrainingSet<'_>,
    rows: &[usize],
    max_features: usize,
    rng: &mut R,
) -> Option<BestSplit> {
    let mut features: Vec<usize> = (0..data.dimension).collect();
    features.shuffle(rng);

    let mut best: Option<BestSplit> = None;
    for (visited, &feature) in features.iter().enumerate() {
        if visited >= max_features && best.is_some() {
            break;
        }
        if let Some(candidate) = best_split_on_feature(data, rows, feature) {
            if best
                .as_ref()
                .is_none_or(|b| candidate.impurity < b.impurity)
            {
                best = Some(candidate);
            }
        }
    }
    best
}

fn best_split_on_feature(
    data: &TrainingSet<'_>,
    rows: &[usize],
    feature: usize,
) -> Option<BestSplit> {
    let mut values: Vec<(u32, usize)> = rows
        .iter()
        .map(|&row| (data.features[row].get(feature), data.classes[row]))
        .collect();
    values.sort_unstable_by_key(|&(value, _)| value);

    let total = values.len();
    let mut left_counts = vec![0usize; data.n_classes];
    let mut right_counts = vec![0usize; data.n_classes];
    for &(_, class) in &values {
        right_counts[class] += 1;
    }

    let mut best: Option<BestSplit> = None;
    for i in 0..total.saturating_sub(1) {
        let (value, class) = values[i];
        left_counts[class] += 1;
        right_counts[class] -= 1;

        let next_value = values[i + 1].0;
        if next_value == value {
            continue;
        }

        let n_left = i + 1;
        let n_right = total - n_left;
        let impurity = (n_left as f64 * gini_impurity(&left_counts, n_left)
            + n_right as f64 * gini_impurity(&right_counts, n_right))
            / total as f64;

        if best.as_ref().is_none_or(|b| impurity < b.impurity) {
            best = Some(BestSplit {
                feature,
                threshold: (f64::from(value) + f64::from(next_value)) / 2.0,
                impurity,
            });
        }
    }
    best
}
