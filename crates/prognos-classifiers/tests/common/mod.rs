#![allow(dead_code)]

use std::path::{Path, PathBuf};

use prognos_classifiers::preprocessing::HOSPITAL_FEATURES;
use serde_json::{json, Value};

pub fn stump(feature: usize, threshold: f32, left: f32, right: f32) -> Value {
    json!({
        "tree_param": {"num_nodes": "3", "num_feature": "0", "size_leaf_vector": "1"},
        "left_children": [1, -1, -1],
        "right_children": [2, -1, -1],
        "parents": [2147483647, 0, 0],
        "split_indices": [feature, 0, 0],
        "split_conditions": [threshold, left, right],
        "default_left": [1, 0, 0],
        "sum_hessian": [12.0, 7.0, 5.0],
        "base_weights": [0.0, left, right],
        "loss_changes": [1.0, 0.0, 0.0],
        "split_type": [0, 0, 0],
        "categories": [], "categories_nodes": [], "categories_segments": [], "categories_sizes": []
    })
}

/// `x[a] < ta ? (x[b] < tb ? ll : lr) : r`
pub fn two_level(a: usize, ta: f32, b: usize, tb: f32, ll: f32, lr: f32, r: f32) -> Value {
    json!({
        "tree_param": {"num_nodes": "5"},
        "left_children": [1, 3, -1, -1, -1],
        "right_children": [2, 4, -1, -1, -1],
        "split_indices": [a, b, 0, 0, 0],
        "split_conditions": [ta, tb, r, ll, lr],
        "default_left": [0, 1, 0, 0, 0],
        "sum_hessian": [20.0, 12.0, 8.0, 3.0, 9.0]
    })
}

pub fn model(
    feature_names: &[String],
    objective: &str,
    num_class: usize,
    trees: Vec<Value>,
    tree_info: Vec<usize>,
) -> Value {
    json!({
        "version": [2, 1, 0],
        "learner": {
            "attributes": {"scikit_learn": "{}"},
            "feature_names": feature_names,
            "feature_types": feature_names.iter().map(|_| "float").collect::<Vec<_>>(),
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "gbtree_model_param": {
                        "num_parallel_tree": "1",
                        "num_trees": trees.len().to_string()
                    },
                    "iteration_indptr": [0, trees.len()],
                    "tree_info": tree_info,
                    "trees": trees
                }
            },
            "learner_model_param": {
                "base_score": "5E-1",
                "boost_from_average": "1",
                "num_class": num_class.to_string(),
                "num_feature": feature_names.len().to_string(),
                "num_target": "1"
            },
            "objective": {
                "name": objective,
                "softmax_multiclass_param": {"num_class": num_class.to_string()}
            }
        }
    })
}

pub fn hospital_feature_names() -> Vec<String> {
    HOSPITAL_FEATURES.iter().map(|f| f.to_string()).collect()
}

/// Three-class readmission model: class 0 for short stays, class 1 for
/// heavy medication, class 2 otherwise.
pub fn hospital_model() -> Value {
    let trees = vec![
        stump(6, 5.0, 0.8, -0.2),   // time_in_hospital
        stump(9, 10.0, 0.1, 0.9),   // num_medications
        two_level(0, 0.5, 6, 2.0, 0.2, 0.3, 0.4),
    ];
    model(&hospital_feature_names(), "multi:softprob", 3, trees, vec![0, 1, 2])
}

pub fn otu_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("OTU_{}", i)).collect()
}

/// Binary autism model over `OTU_1..=OTU_6`; only OTU_1, OTU_2, OTU_3 and
/// OTU_5 are ever split on.
pub fn bacteria_model() -> Value {
    let trees = vec![
        stump(0, 10.0, -1.0, 1.0),
        stump(2, 5.0, -0.5, 0.5),
        two_level(1, 3.0, 4, 1.0, -0.2, 0.1, 0.3),
    ];
    model(&otu_names(6), "binary:logistic", 0, trees, vec![0, 0, 0])
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// One hospital row per `(time_in_hospital, num_medications)` pair, with the
/// columns shuffled and two extra columns.
pub fn hospital_csv(rows: &[(u32, u32)]) -> String {
    let mut headers: Vec<&str> = vec!["encounter_id"];
    headers.extend(HOSPITAL_FEATURES.iter().rev());
    headers.push("readmitted");
    let mut out = headers.join(",");
    out.push('\n');
    for (i, (stay, meds)) in rows.iter().enumerate() {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| match *h {
                "encounter_id" => (1000 + i).to_string(),
                "race" => (if i % 2 == 0 { "Caucasian" } else { "AfricanAmerican" }).to_string(),
                "gender" => "Female".to_string(),
                "age" => "[70-80)".to_string(),
                "time_in_hospital" => stay.to_string(),
                "num_medications" => meds.to_string(),
                "max_glu_serum" => ">300".to_string(),
                "A1Cresult" => ">7".to_string(),
                "metformin" => "No".to_string(),
                "insulin" => "Steady".to_string(),
                "change" => "Ch".to_string(),
                "diabetesMed" => "Yes".to_string(),
                "readmitted" => "NO".to_string(),
                _ => "1".to_string(),
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}
