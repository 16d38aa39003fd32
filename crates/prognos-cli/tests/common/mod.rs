#![allow(dead_code)]

use std::path::{Path, PathBuf};

use prognos_classifiers::preprocessing::HOSPITAL_FEATURES;
use prognos_cli::config::ServerConfig;
use serde_json::{json, Value};

fn stump(feature: usize, threshold: f32, left: f32, right: f32) -> Value {
    json!({
        "tree_param": {"num_nodes": "3"},
        "left_children": [1, -1, -1],
        "right_children": [2, -1, -1],
        "split_indices": [feature, 0, 0],
        "split_conditions": [threshold, left, right],
        "default_left": [1, 0, 0],
        "sum_hessian": [10.0, 6.0, 4.0]
    })
}

fn model(
    names: Vec<String>,
    objective: &str,
    num_class: usize,
    trees: Vec<Value>,
    info: Vec<usize>,
) -> Value {
    json!({
        "version": [2, 1, 0],
        "learner": {
            "feature_names": names.clone(),
            "gradient_booster": {"name": "gbtree", "model": {"trees": trees, "tree_info": info}},
            "objective": {"name": objective},
            "learner_model_param": {
                "base_score": "5E-1",
                "num_class": num_class.to_string(),
                "num_feature": names.len().to_string()
            }
        }
    })
}

pub fn hospital_model() -> Value {
    let names = HOSPITAL_FEATURES.iter().map(|f| f.to_string()).collect();
    model(
        names,
        "multi:softprob",
        3,
        vec![
            stump(6, 5.0, 0.8, -0.2),
            stump(9, 10.0, 0.1, 0.9),
            stump(0, 0.5, 0.3, 0.3),
        ],
        vec![0, 1, 2],
    )
}

pub fn bacteria_model() -> Value {
    let names = (1..=6).map(|i| format!("OTU_{}", i)).collect();
    model(
        names,
        "binary:logistic",
        0,
        vec![stump(0, 10.0, -1.0, 1.0), stump(2, 5.0, -0.5, 0.5)],
        vec![0, 0],
    )
}

pub const ABUNDANCE_CSV: &str = "\
OTU,taxonomy,A01,A02,C01
OTU_1,k__Bacteria,20,15,2
OTU_2,k__Bacteria,5,1,0
OTU_3,k__Bacteria,8,9,1
OTU_4,k__Bacteria,1,1,1
OTU_5,k__Bacteria,0,2,0
OTU_6,k__Bacteria,3,3,3
";

pub fn hospital_csv(rows: &[(u32, u32)]) -> String {
    let mut out = String::from("encounter_id,");
    out.push_str(&HOSPITAL_FEATURES.join(","));
    out.push('\n');
    for (i, (stay, meds)) in rows.iter().enumerate() {
        let mut cells = vec![(1000 + i).to_string()];
        for f in HOSPITAL_FEATURES.iter() {
            cells.push(match *f {
                "race" => "Caucasian".to_string(),
                "gender" => "Male".to_string(),
                "age" => "[50-60)".to_string(),
                "time_in_hospital" => stay.to_string(),
                "num_medications" => meds.to_string(),
                "max_glu_serum" | "A1Cresult" => "Norm".to_string(),
                "metformin" | "insulin" => "No".to_string(),
                "change" => "No".to_string(),
                "diabetesMed" => "Yes".to_string(),
                _ => "2".to_string(),
            });
        }
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Write both models and a taxonomy mapping into `dir` and return a config
/// pointing at them, with uploads going to `dir/data`.
pub fn fixture_config(dir: &Path) -> ServerConfig {
    let hospital = dir.join("xgb_model.json");
    let bacteria = dir.join("abund-16S-model.json");
    let taxonomy = dir.join("taxonomy_mapping.csv");
    std::fs::write(&hospital, hospital_model().to_string()).unwrap();
    std::fs::write(&bacteria, bacteria_model().to_string()).unwrap();
    std::fs::write(&taxonomy, "OTU,taxonomy\nOTU_1,k__Bacteria; g__Blautia\n").unwrap();
    ServerConfig {
        data_dir: dir.join("data"),
        hospital_model: hospital,
        bacteria_model: bacteria,
        taxonomy,
        ..ServerConfig::default()
    }
}

pub fn write_config(dir: &Path, config: &ServerConfig) -> PathBuf {
    let path = dir.join("prognos.json");
    std::fs::write(&path, serde_json::to_string_pretty(config).unwrap()).unwrap();
    path
}

pub fn uploads_in(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
            .collect(),
        Err(_) => Vec::new(),
    }
}
