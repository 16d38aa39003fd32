//! Serde definitions for the XGBoost JSON model format.
//!
//! Only the fields needed for inference are modelled. XGBoost writes many
//! scalar parameters as strings (`"3"`, `"5E-1"`, `"[5E-1]"`), so those go
//! through lenient deserializers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn scalar_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

/// `base_score` as number, string, array, or bracketed string such as
/// `"[5E-1]"` or `"[1E-1,2E-1]"`.
fn deserialize_base_score<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Array(items) => items.iter().map(scalar_f32).collect::<Option<Vec<_>>>(),
        Value::String(s) => {
            let t = s.trim();
            if t.starts_with('[') && t.ends_with(']') {
                t[1..t.len() - 1]
                    .split(',')
                    .map(|p| p.trim().parse::<f32>().ok())
                    .collect::<Option<Vec<_>>>()
            } else {
                scalar_f32(&value).map(|v| vec![v])
            }
        }
        _ => scalar_f32(&value).map(|v| vec![v]),
    };
    match parsed {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SerdeError::custom(format!("cannot parse base_score from {}", value))),
    }
}

fn deserialize_i64_any<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| SerdeError::custom("invalid integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| SerdeError::custom(format!("cannot parse integer from '{}'", s))),
        _ => Err(SerdeError::custom("expected an integer or a string")),
    }
}

/// Per-node flags written either as booleans or as 0/1 integers.
fn deserialize_flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|v| match v {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
            other => Err(SerdeError::custom(format!("invalid flag value {}", other))),
        })
        .collect()
}

fn default_num_class() -> i64 {
    0
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeParam {
    #[serde(deserialize_with = "deserialize_i64_any")]
    pub num_nodes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeDef {
    pub tree_param: TreeParam,
    pub left_children: Vec<i32>,
    pub right_children: Vec<i32>,
    pub split_indices: Vec<i64>,
    pub split_conditions: Vec<f32>,
    #[serde(deserialize_with = "deserialize_flags")]
    pub default_left: Vec<bool>,
    pub sum_hessian: Vec<f64>,
    #[serde(default)]
    pub split_type: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTrees {
    pub trees: Vec<TreeDef>,
    pub tree_info: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GbtreeDef {
    pub model: ModelTrees,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum GradientBooster {
    Gbtree {
        model: ModelTrees,
    },
    Dart {
        gbtree: GbtreeDef,
        weight_drop: Vec<f32>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectiveDef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LearnerModelParam {
    #[serde(deserialize_with = "deserialize_base_score")]
    pub base_score: Vec<f32>,
    #[serde(default = "default_num_class", deserialize_with = "deserialize_i64_any")]
    pub num_class: i64,
    #[serde(deserialize_with = "deserialize_i64_any")]
    pub num_feature: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Learner {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub gradient_booster: GradientBooster,
    pub objective: ObjectiveDef,
    pub learner_model_param: LearnerModelParam,
}

/// Top-level document written by `Booster.save_model("model.json")`.
#[derive(Debug, Clone, Deserialize)]
pub struct XgbModel {
    #[serde(default)]
    pub version: Vec<u32>,
    pub learner: Learner,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_score_accepts_number_string_and_brackets() {
        for raw in [json!(0.5), json!("5E-1"), json!([0.5]), json!("[5E-1]")] {
            let p: LearnerModelParam = serde_json::from_value(
                json!({"base_score": raw, "num_class": "0", "num_feature": "2"}),
            )
            .unwrap();
            assert_eq!(p.base_score, vec![0.5]);
        }
    }

    #[test]
    fn base_score_vector_keeps_every_entry() {
        let p: LearnerModelParam = serde_json::from_value(
            json!({"base_score": "[1E-1,2E-1,7E-1]", "num_class": "3", "num_feature": "4"}),
        )
        .unwrap();
        assert_eq!(p.base_score, vec![0.1, 0.2, 0.7]);
        assert_eq!(p.num_class, 3);
    }

    #[test]
    fn default_left_accepts_ints_and_bools() {
        let t: TreeDef = serde_json::from_value(json!({
            "tree_param": {"num_nodes": "3"},
            "left_children": [1, -1, -1],
            "right_children": [2, -1, -1],
            "split_indices": [0, 0, 0],
            "split_conditions": [0.5, -0.1, 0.1],
            "default_left": [1, false, 0],
            "sum_hessian": [10.0, 5.0, 5.0]
        }))
        .unwrap();
        assert_eq!(t.default_left, vec![true, false, false]);
        assert!(t.split_type.is_empty());
    }

    #[test]
    fn unknown_booster_is_other() {
        let raw = json!({"name": "gblinear", "model": {"weights": [0.1]}});
        let b: GradientBooster = serde_json::from_value(raw).unwrap();
        assert!(matches!(b, GradientBooster::Other));
    }
}
