mod common;

use prognos_classifiers::io::Table;
use prognos_classifiers::preprocessing::prepare_hospital;
use prognos_classifiers::{HospitalPredictor, PredictError};

fn predictor(dir: &std::path::Path) -> HospitalPredictor {
    let path = common::write_json(dir, "xgb_model.json", &common::hospital_model());
    HospitalPredictor::from_model_path(path).unwrap()
}

#[test]
fn every_row_gets_a_readmission_label() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = predictor(dir.path());
    let csv = common::write_file(
        dir.path(),
        "input_0badf00d.csv",
        &common::hospital_csv(&[(3, 5), (7, 20), (7, 5), (1, 1), (12, 40)]),
    );

    let report = predictor.predict_path(&csv).unwrap();
    assert_eq!(report.results.len(), 5);
    assert_eq!(report.summary.total_samples, 5);
    for (i, r) in report.results.iter().enumerate() {
        assert_eq!(r.patient_id, i);
        assert!(["<30", ">30", "NO"].contains(&r.readmission_prediction.as_str()));
    }
    let s = &report.summary;
    assert_eq!(s.predicted_lt30 + s.predicted_gt30 + s.predicted_no, 5);
}

#[test]
fn predictions_follow_the_trees() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = predictor(dir.path());
    let csv = common::hospital_csv(&[(3, 5), (7, 20), (7, 5)]);
    let table = Table::from_reader(csv.as_bytes()).unwrap();

    let report = predictor.predict_table(&table).unwrap();
    let labels: Vec<&str> = report
        .results
        .iter()
        .map(|r| r.readmission_prediction.as_str())
        .collect();
    assert_eq!(labels, vec!["<30", ">30", "NO"]);
    assert_eq!(report.summary.predicted_lt30, 1);
    assert_eq!(report.summary.predicted_gt30, 1);
    assert_eq!(report.summary.predicted_no, 1);
}

#[test]
fn single_row_with_constant_categoricals() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = predictor(dir.path());
    let table = Table::from_reader(common::hospital_csv(&[(3, 10)]).as_bytes()).unwrap();

    let report = predictor.predict_table(&table).unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].patient_id, 0);
    assert!(["<30", ">30", "NO"].contains(&report.results[0].readmission_prediction.as_str()));
}

#[test]
fn encoding_is_deterministic() {
    let csv = common::hospital_csv(&[(3, 5), (7, 20), (2, 2)]);
    let table = Table::from_reader(csv.as_bytes()).unwrap();
    let (names_a, a) = prepare_hospital(&table).unwrap();
    let (names_b, b) = prepare_hospital(&table).unwrap();
    assert_eq!(names_a, names_b);
    assert_eq!(a, b);
    assert_eq!(a.shape(), (3, 20));
    // race alternates between two categories
    assert_eq!(a.column(0).to_vec(), vec![0.0, 1.0, 0.0]);
    // time_in_hospital passes through
    assert_eq!(a.column(6).to_vec(), vec![3.0, 7.0, 2.0]);
}

#[test]
fn missing_feature_column_is_a_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = predictor(dir.path());
    let table = Table::from_reader("race,gender\nCaucasian,Male\n".as_bytes()).unwrap();

    let err = predictor.predict_table(&table).unwrap_err();
    assert!(matches!(err, PredictError::Schema(_)));
    let msg = err.to_string();
    assert!(msg.contains("'age'"));
    assert!(msg.contains("'diabetesMed'"));
    assert!(!msg.contains("'race'"));
}

#[test]
fn missing_input_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let predictor = predictor(dir.path());
    let err = predictor
        .predict_path(dir.path().join("input_deadbeef.csv"))
        .unwrap_err();
    assert!(err.to_string().starts_with("File not found:"));
}

#[test]
fn missing_model_file_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let err = HospitalPredictor::from_model_path(dir.path().join("xgb_model.json"))
        .err()
        .unwrap();
    assert!(format!("{:#}", err).contains("failed to read model file"));
}
