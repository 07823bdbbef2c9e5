//! Pre-trained regression model.
//!
//! Models are exported from the training notebook as JSON. Two estimators are
//! supported: a linear model and a random forest whose trees use the
//! scikit-learn array layout (`children_left`, `children_right`, `feature`,
//! `threshold`, `value`; a node is a leaf when `children_left == -1`).
//! `value` may be flat or keep sklearn's `[n_nodes][n_outputs][1]` nesting.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::descriptors::FeatureMatrix;
use crate::{BioactivityError, Result};

const LEAF: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Biological target the model was trained against, e.g. "MGMT".
    #[serde(default)]
    pub target: Option<String>,
    /// Training column order. Empty when the export did not record it.
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    RandomForest {
        n_features: usize,
        trees: Vec<RegressionTree>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    #[serde(deserialize_with = "node_values")]
    pub value: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodeValue {
    Scalar(f64),
    Nested(Vec<NodeValue>),
}

impl NodeValue {
    /// Single-output regression: the first number at any depth.
    fn scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Nested(items) => items.first().and_then(Self::scalar),
        }
    }
}

fn node_values<'de, D>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<NodeValue>::deserialize(deserializer)?
        .iter()
        .enumerate()
        .map(|(node, v)| {
            v.scalar()
                .ok_or_else(|| de::Error::custom(format!("node {node} has an empty value")))
        })
        .collect()
}

impl RegressionTree {
    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [self.children_right.len(), self.feature.len(), self.threshold.len(), self.value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err("tree arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                continue;
            }
            // Children always come after their parent in the export order.
            for child in [left, right] {
                if child <= node as i64 || child as usize >= n {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {node} splits on feature {feature}, model has {n_features}"));
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. Assumes `validate` passed.
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}

impl TrainedModel {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BioactivityError::Model(format!("model file not found: {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let model = Self::from_json(&content)?;
        info!(
            "Loaded {} model for {} ({} features) from {:?}",
            model.kind(),
            model.target.as_deref().unwrap_or("unknown target"),
            model.n_features(),
            path
        );
        Ok(model)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let model: TrainedModel = serde_json::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self.estimator {
            Estimator::Linear { .. } => "linear",
            Estimator::RandomForest { .. } => "random forest",
        }
    }

    pub fn n_features(&self) -> usize {
        match &self.estimator {
            Estimator::Linear { coefficients, .. } => coefficients.len(),
            Estimator::RandomForest { n_features, .. } => *n_features,
        }
    }

    fn validate(&self) -> Result<()> {
        let n_features = self.n_features();
        if n_features == 0 {
            return Err(BioactivityError::Model("model has no input features".to_string()));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != n_features {
            return Err(BioactivityError::Model(format!(
                "model lists {} feature names but expects {} features",
                self.feature_names.len(),
                n_features
            )));
        }
        if let Estimator::RandomForest { trees, .. } = &self.estimator {
            if trees.is_empty() {
                return Err(BioactivityError::Model("random forest has no trees".to_string()));
            }
            for (i, tree) in trees.iter().enumerate() {
                tree.validate(n_features)
                    .map_err(|e| BioactivityError::Model(format!("tree {i}: {e}")))?;
            }
        }
        Ok(())
    }

    /// One prediction per matrix row.
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        if matrix.columns.len() != self.n_features() {
            return Err(BioactivityError::Model(format!(
                "model expects {} descriptors, got {}",
                self.n_features(),
                matrix.columns.len()
            )));
        }
        if !self.feature_names.is_empty() && self.feature_names != matrix.columns {
            return Err(BioactivityError::Model(
                "descriptor columns do not match the model's training columns".to_string(),
            ));
        }

        debug!("Predicting {} molecules with {} model", matrix.values.len(), self.kind());
        let predictions = matrix
            .values
            .iter()
            .map(|row| self.predict_row(row))
            .collect();
        Ok(predictions)
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        match &self.estimator {
            Estimator::Linear { intercept, coefficients } => {
                intercept + coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>()
            }
            Estimator::RandomForest { trees, .. } => {
                let total: f64 = trees.iter().map(|t| t.predict_row(row)).sum();
                total / trees.len() as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(columns: &[&str], values: Vec<Vec<f64>>) -> FeatureMatrix {
        FeatureMatrix {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            row_names: vec![String::new(); values.len()],
            values,
        }
    }

    // Two stumps on PubchemFP0 / PubchemFP1.
    const FOREST: &str = r#"{
        "target": "MGMT",
        "feature_names": ["PubchemFP0", "PubchemFP1"],
        "estimator": {
            "kind": "random_forest",
            "n_features": 2,
            "trees": [
                {"children_left": [1, -1, -1], "children_right": [2, -1, -1],
                 "feature": [0, -2, -2], "threshold": [0.5, -2.0, -2.0], "value": [5.0, 4.0, 6.0]},
                {"children_left": [1, -1, -1], "children_right": [2, -1, -1],
                 "feature": [1, -2, -2], "threshold": [0.5, -2.0, -2.0], "value": [5.0, 5.0, 7.0]}
            ]
        }
    }"#;

    #[test]
    fn test_forest_averages_trees() {
        let model = TrainedModel::from_json(FOREST).unwrap();
        assert_eq!(model.kind(), "random forest");
        assert_eq!(model.target.as_deref(), Some("MGMT"));

        let m = matrix(&["PubchemFP0", "PubchemFP1"], vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ]);
        assert_eq!(model.predict(&m).unwrap(), vec![4.5, 5.5, 6.5]);
    }

    #[test]
    fn test_threshold_goes_left_when_equal() {
        let model = TrainedModel::from_json(FOREST).unwrap();
        let m = matrix(&["PubchemFP0", "PubchemFP1"], vec![vec![0.5, 0.5]]);
        assert_eq!(model.predict(&m).unwrap(), vec![4.5]);
    }

    #[test]
    fn test_linear_model() {
        let model = TrainedModel::from_json(
            r#"{"estimator": {"kind": "linear", "intercept": 4.0, "coefficients": [0.5, -1.0]}}"#,
        )
        .unwrap();
        let m = matrix(&["a", "b"], vec![vec![2.0, 1.0]]);
        assert_eq!(model.predict(&m).unwrap(), vec![4.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let model = TrainedModel::from_json(FOREST).unwrap();
        let err = model.predict(&matrix(&["PubchemFP0"], vec![vec![1.0]])).unwrap_err();
        assert!(err.to_string().contains("expects 2 descriptors, got 1"));
    }

    #[test]
    fn test_column_order_must_match_training() {
        let model = TrainedModel::from_json(FOREST).unwrap();
        let err = model
            .predict(&matrix(&["PubchemFP1", "PubchemFP0"], vec![vec![1.0, 0.0]]))
            .unwrap_err();
        assert!(matches!(err, BioactivityError::Model(_)));
    }

    #[test]
    fn test_rejects_out_of_range_child() {
        let json = FOREST.replacen("\"children_right\": [2", "\"children_right\": [9", 1);
        let err = TrainedModel::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("tree 0"));
    }

    #[test]
    fn test_accepts_nested_sklearn_values() {
        let json = FOREST
            .replace("\"value\": [5.0, 4.0, 6.0]", "\"value\": [[[5.0]], [[4.0]], [[6.0]]]")
            .replace("\"value\": [5.0, 5.0, 7.0]", "\"value\": [[[5.0]], [[5.0]], [[7.0]]]");
        let model = TrainedModel::from_json(&json).unwrap();
        let m = matrix(&["PubchemFP0", "PubchemFP1"], vec![vec![1.0, 1.0]]);
        assert_eq!(model.predict(&m).unwrap(), vec![6.5]);
    }

    #[test]
    fn test_rejects_empty_node_value() {
        let json = FOREST.replace("\"value\": [5.0, 4.0, 6.0]", "\"value\": [[], [[4.0]], [[6.0]]]");
        let err = TrainedModel::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("node 0 has an empty value"));
    }

    #[test]
    fn test_rejects_cycle() {
        let json = r#"{"estimator": {"kind": "random_forest", "n_features": 1, "trees": [
            {"children_left": [1, 0], "children_right": [1, 0],
             "feature": [0, 0], "threshold": [0.5, 0.5], "value": [1.0, 2.0]}]}}"#;
        assert!(TrainedModel::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_empty_forest() {
        let json = r#"{"estimator": {"kind": "random_forest", "n_features": 3, "trees": []}}"#;
        let err = TrainedModel::from_json(json).unwrap_err();
        assert!(err.to_string().contains("no trees"));
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrainedModel::load(&dir.path().join("MGMT_model.json")).unwrap_err();
        assert!(err.to_string().contains("model file not found"));
    }
}
