//! Pure-Rust evaluation of XGBoost models saved with `save_model("*.json")`.
//!
//! Supports `gbtree` and `dart` boosters with logistic or softmax objectives
//! over numeric splits, which covers every classifier this crate serves.
pub mod json;
pub mod tree;

pub use tree::RegTree;

use std::fs;
use std::path::Path;

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{ModelError, PredictError};
use crate::explain::{tree_shap, Contributions};
use crate::math::{Array1, Array2};
use crate::models::classifier_trait::ClassifierModel;
use json::{GradientBooster, XgbModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// `binary:logistic` / `reg:logistic`: one margin per row, sigmoid link.
    Logistic,
    /// `multi:softprob` / `multi:softmax`: one margin per class, softmax link.
    Softmax,
}

impl Objective {
    fn parse(name: &str) -> Result<Self, ModelError> {
        match name {
            "binary:logistic" | "reg:logistic" => Ok(Objective::Logistic),
            "multi:softprob" | "multi:softmax" => Ok(Objective::Softmax),
            other => Err(ModelError::Unsupported(format!("objective '{}'", other))),
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Tree ensemble classifier loaded from XGBoost's JSON format.
#[derive(Debug, Clone)]
pub struct XGBoostClassifier {
    trees: Vec<RegTree>,
    tree_group: Vec<usize>,
    tree_weight: Vec<f32>,
    base_margin: Vec<f32>,
    objective: Objective,
    num_features: usize,
    feature_names: Vec<String>,
}

impl XGBoostClassifier {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let model = Self::from_json_str(&raw)?;
        info!(
            "[Prognos::XGBoost] Loaded {} trees ({} classes, {} features) from {}",
            model.trees.len(),
            model.num_classes(),
            model.num_features,
            path.display()
        );
        Ok(model)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        let model: XgbModel = serde_json::from_str(raw)?;
        Self::from_model(model)
    }

    pub fn from_model(model: XgbModel) -> Result<Self, ModelError> {
        let learner = model.learner;
        let objective = Objective::parse(&learner.objective.name)?;
        let params = learner.learner_model_param;

        let n_groups = match objective {
            Objective::Logistic => 1,
            Objective::Softmax if params.num_class >= 2 => params.num_class as usize,
            Objective::Softmax => {
                return Err(ModelError::Malformed(format!(
                    "softmax objective with num_class = {}",
                    params.num_class
                )))
            }
        };

        let (trees_def, weights) = match learner.gradient_booster {
            GradientBooster::Gbtree { model } => {
                let n = model.trees.len();
                (model, vec![1.0; n])
            }
            GradientBooster::Dart {
                gbtree,
                weight_drop,
            } => {
                if weight_drop.len() != gbtree.model.trees.len() {
                    return Err(ModelError::Malformed(format!(
                        "{} dart weights for {} trees",
                        weight_drop.len(),
                        gbtree.model.trees.len()
                    )));
                }
                (gbtree.model, weight_drop)
            }
            GradientBooster::Other => {
                return Err(ModelError::Unsupported(
                    "only gbtree and dart boosters can be evaluated".to_string(),
                ))
            }
        };

        if trees_def.tree_info.len() != trees_def.trees.len() {
            return Err(ModelError::Malformed(format!(
                "tree_info has {} entries for {} trees",
                trees_def.tree_info.len(),
                trees_def.trees.len()
            )));
        }
        let tree_group = trees_def
            .tree_info
            .iter()
            .map(|&g| {
                if g < 0 || g as usize >= n_groups {
                    Err(ModelError::Malformed(format!(
                        "tree assigned to group {} of {}",
                        g, n_groups
                    )))
                } else {
                    Ok(g as usize)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let trees = trees_def
            .trees
            .into_iter()
            .map(RegTree::from_def)
            .collect::<Result<Vec<_>, _>>()?;

        let base_score = match params.base_score.len() {
            1 => vec![params.base_score[0]; n_groups],
            n if n == n_groups => params.base_score,
            n => {
                return Err(ModelError::Malformed(format!(
                    "base_score has {} entries for {} output groups",
                    n, n_groups
                )))
            }
        };
        let base_margin = match objective {
            Objective::Logistic => base_score
                .iter()
                .map(|&p| {
                    if p > 0.0 && p < 1.0 {
                        Ok((p / (1.0 - p)).ln())
                    } else {
                        Err(ModelError::Malformed(format!(
                            "base_score {} outside (0, 1) for a logistic objective",
                            p
                        )))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            Objective::Softmax => base_score,
        };

        if params.num_feature < 0 {
            return Err(ModelError::Malformed(format!(
                "num_feature = {}",
                params.num_feature
            )));
        }
        debug!(
            "[Prognos::XGBoost] objective {:?}, base margin {:?}, model version {:?}",
            objective, base_margin, model.version
        );

        Ok(Self {
            trees,
            tree_group,
            tree_weight: weights,
            base_margin,
            objective,
            num_features: params.num_feature as usize,
            feature_names: learner.feature_names,
        })
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Number of output groups: 1 for binary models, `num_class` otherwise.
    pub fn num_groups(&self) -> usize {
        self.base_margin.len()
    }

    /// Number of classes `predict_proba` reports.
    pub fn num_classes(&self) -> usize {
        match self.objective {
            Objective::Logistic => 2,
            Objective::Softmax => self.num_groups(),
        }
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    fn check_shape(&self, x: &Array2<f32>) -> Result<(), PredictError> {
        if x.ncols() != self.num_features {
            return Err(PredictError::Schema(format!(
                "Feature shape mismatch, expected: {}, got {}",
                self.num_features,
                x.ncols()
            )));
        }
        Ok(())
    }

    fn row_margin(&self, row: &[f32]) -> Vec<f32> {
        let mut margin: Vec<f64> = self.base_margin.iter().map(|&m| m as f64).collect();
        for ((tree, &group), &weight) in self
            .trees
            .iter()
            .zip(&self.tree_group)
            .zip(&self.tree_weight)
        {
            margin[group] += (tree.predict(row) * weight) as f64;
        }
        margin.into_iter().map(|m| m as f32).collect()
    }

    /// Raw scores before the link function, shape `(n_samples, n_groups)`.
    pub fn predict_margin(&self, x: &Array2<f32>) -> Result<Array2<f32>, PredictError> {
        self.check_shape(x)?;
        let data: Vec<f32> = (0..x.nrows())
            .into_par_iter()
            .flat_map_iter(|r| self.row_margin(x.row_slice(r)))
            .collect();
        Ok(Array2::from_raw(x.nrows(), self.num_groups(), data))
    }

    fn row_contributions(&self, row: &[f32]) -> Vec<f32> {
        let width = self.num_features + 1;
        let mut phi = vec![0.0f64; self.num_groups() * width];
        for ((tree, &group), &weight) in self
            .trees
            .iter()
            .zip(&self.tree_group)
            .zip(&self.tree_weight)
        {
            let slot = &mut phi[group * width..(group + 1) * width];
            tree_shap::tree_contributions(tree, row, slot, weight as f64);
        }
        for (group, &m) in self.base_margin.iter().enumerate() {
            phi[group * width + self.num_features] += m as f64;
        }
        phi.into_iter().map(|v| v as f32).collect()
    }
}

/// Softmax over one row of margins.
fn softmax(margins: &[f32]) -> Vec<f32> {
    let max = margins.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = margins.iter().map(|m| (m - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: &[f32]) -> u32 {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best as u32
}

impl ClassifierModel for XGBoostClassifier {
    fn predict(&self, x: &Array2<f32>) -> Result<Array1<u32>, PredictError> {
        let margins = self.predict_margin(x)?;
        let labels = match self.objective {
            Objective::Logistic => margins
                .rows()
                .map(|m| if sigmoid(m[0]) > 0.5 { 1 } else { 0 })
                .collect(),
            Objective::Softmax => margins.rows().map(argmax).collect(),
        };
        Ok(labels)
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f32>, PredictError> {
        let margins = self.predict_margin(x)?;
        let mut data = Vec::with_capacity(x.nrows() * self.num_classes());
        for m in margins.rows() {
            match self.objective {
                Objective::Logistic => {
                    let p = sigmoid(m[0]);
                    data.push(1.0 - p);
                    data.push(p);
                }
                Objective::Softmax => data.extend(softmax(m)),
            }
        }
        Ok(Array2::from_raw(x.nrows(), self.num_classes(), data))
    }

    fn predict_contributions(&self, x: &Array2<f32>) -> Result<Contributions, PredictError> {
        self.check_shape(x)?;
        let values: Vec<f32> = (0..x.nrows())
            .into_par_iter()
            .flat_map_iter(|r| self.row_contributions(x.row_slice(r)))
            .collect();
        Contributions::new(values, x.nrows(), self.num_groups(), self.num_features).ok_or_else(
            || PredictError::Inference("contribution buffer has the wrong size".to_string()),
        )
    }

    fn feature_names(&self) -> Option<&[String]> {
        if self.feature_names.is_empty() {
            None
        } else {
            Some(&self.feature_names)
        }
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn name(&self) -> &str {
        "xgboost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn leaf(value: f32) -> Value {
        json!({
            "tree_param": {"num_nodes": "1"},
            "left_children": [-1], "right_children": [-1],
            "split_indices": [0], "split_conditions": [value],
            "default_left": [0], "sum_hessian": [1.0]
        })
    }

    fn stump(feature: i64, threshold: f32, left: f32, right: f32) -> Value {
        json!({
            "tree_param": {"num_nodes": "3"},
            "left_children": [1, -1, -1], "right_children": [2, -1, -1],
            "split_indices": [feature, 0, 0], "split_conditions": [threshold, left, right],
            "default_left": [1, 0, 0], "sum_hessian": [10.0, 5.0, 5.0]
        })
    }

    fn model_json(
        objective: &str,
        num_class: usize,
        base_score: Value,
        trees: Vec<Value>,
    ) -> String {
        let tree_info: Vec<usize> = (0..trees.len())
            .map(|i| if num_class > 1 { i % num_class } else { 0 })
            .collect();
        json!({
            "version": [2, 0, 3],
            "learner": {
                "feature_names": ["a", "b"],
                "gradient_booster": {
                    "name": "gbtree",
                    "model": {"trees": trees, "tree_info": tree_info}
                },
                "objective": {"name": objective},
                "learner_model_param": {
                    "base_score": base_score,
                    "num_class": num_class.to_string(),
                    "num_feature": "2"
                }
            }
        })
        .to_string()
    }

    fn binary_model() -> XGBoostClassifier {
        let raw = model_json(
            "binary:logistic",
            0,
            json!("5E-1"),
            vec![stump(0, 0.5, -1.0, 1.0), stump(1, 2.0, 0.25, -0.25)],
        );
        XGBoostClassifier::from_json_str(&raw).unwrap()
    }

    fn matrix(rows: &[[f32; 2]]) -> Array2<f32> {
        Array2::from_shape_vec((rows.len(), 2), rows.iter().flatten().copied().collect()).unwrap()
    }

    #[test]
    fn binary_probabilities_follow_sigmoid_of_margin() {
        let model = binary_model();
        let x = matrix(&[[0.2, 3.0], [0.9, 1.0]]);
        let proba = model.predict_proba(&x).unwrap();
        // margins: -1 - 0.25 and 1 + 0.25
        let p0 = sigmoid(-1.25);
        assert!((proba[(0, 1)] - p0).abs() < 1e-6);
        assert!((proba[(0, 0)] + proba[(0, 1)] - 1.0).abs() < 1e-6);
        assert_eq!(model.predict(&x).unwrap().to_vec(), vec![0, 1]);
    }

    #[test]
    fn binary_contributions_add_up_to_margin() {
        let model = binary_model();
        let x = matrix(&[[0.2, 3.0], [0.9, 1.0], [f32::NAN, f32::NAN]]);
        let margins = model.predict_margin(&x).unwrap();
        let contribs = model.predict_contributions(&x).unwrap();
        assert_eq!(contribs.n_groups(), 1);
        for r in 0..x.nrows() {
            let total: f32 = contribs.row(r, 0).iter().sum();
            assert!((total - margins[(r, 0)]).abs() < 1e-5);
        }
        // row 0: a contributes -1, b contributes -0.25
        assert!((contribs.get(0, 0, 0) + 1.0).abs() < 1e-6);
        assert!((contribs.get(0, 0, 1) + 0.25).abs() < 1e-6);
    }

    #[test]
    fn multiclass_uses_softmax_and_first_max() {
        let raw = model_json(
            "multi:softprob",
            3,
            json!("5E-1"),
            vec![leaf(0.1), leaf(0.6), leaf(0.2)],
        );
        let model = XGBoostClassifier::from_json_str(&raw).unwrap();
        let x = matrix(&[[0.0, 0.0]]);
        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.shape(), (1, 3));
        let total: f32 = proba.row_slice(0).iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert_eq!(model.predict(&x).unwrap().to_vec(), vec![1]);

        let tied = model_json(
            "multi:softmax",
            3,
            json!(0.5),
            vec![leaf(0.3), leaf(0.3), leaf(0.3)],
        );
        let model = XGBoostClassifier::from_json_str(&tied).unwrap();
        assert_eq!(model.predict(&x).unwrap().to_vec(), vec![0]);
    }

    #[test]
    fn multiclass_base_score_vector_is_per_group() {
        let raw = model_json(
            "multi:softprob",
            3,
            json!("[1E-1,9E-1,2E-1]"),
            vec![leaf(0.0), leaf(0.0), leaf(0.0)],
        );
        let model = XGBoostClassifier::from_json_str(&raw).unwrap();
        let margins = model.predict_margin(&matrix(&[[0.0, 0.0]])).unwrap();
        assert!((margins[(0, 1)] - 0.9).abs() < 1e-6);
        assert_eq!(model.predict(&matrix(&[[0.0, 0.0]])).unwrap().to_vec(), vec![1]);
    }

    #[test]
    fn dart_weights_scale_leaves() {
        let raw = json!({
            "learner": {
                "gradient_booster": {
                    "name": "dart",
                    "gbtree": {"model": {"trees": [leaf(2.0)], "tree_info": [0]}},
                    "weight_drop": [0.5]
                },
                "objective": {"name": "binary:logistic"},
                "learner_model_param": {"base_score": "5E-1", "num_class": "0", "num_feature": "2"}
            }
        })
        .to_string();
        let model = XGBoostClassifier::from_json_str(&raw).unwrap();
        let margins = model.predict_margin(&matrix(&[[0.0, 0.0]])).unwrap();
        assert!((margins[(0, 0)] - 1.0).abs() < 1e-6);
        assert!(model.feature_names().is_none());
    }

    #[test]
    fn rejects_unsupported_models() {
        let raw = model_json("binary:logitraw", 0, json!(0.5), vec![leaf(0.0)]);
        assert!(matches!(
            XGBoostClassifier::from_json_str(&raw),
            Err(ModelError::Unsupported(_))
        ));

        let raw = model_json("binary:logistic", 0, json!(1.0), vec![leaf(0.0)]);
        assert!(matches!(
            XGBoostClassifier::from_json_str(&raw),
            Err(ModelError::Malformed(_))
        ));

        assert!(matches!(
            XGBoostClassifier::from_json_str("{not json"),
            Err(ModelError::Json(_))
        ));
    }

    #[test]
    fn feature_validation_uses_recorded_names() {
        let model = binary_model();
        assert!(model.validate_features(&["a".to_string(), "b".to_string()]).is_ok());
        let err = model
            .validate_features(&["b".to_string(), "c".to_string()])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("feature_names mismatch"));
        assert!(msg.contains("a"));
        assert!(msg.contains("c"));

        let err = model.predict(&Array2::from_shape_vec((1, 1), vec![0.0]).unwrap());
        assert!(matches!(err, Err(PredictError::Schema(_))));
    }
}
