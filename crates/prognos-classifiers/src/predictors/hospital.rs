use std::path::Path;

use anyhow::Context;
use log::info;

use crate::error::PredictError;
use crate::io::{read_table, Table};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::load_model;
use crate::preprocessing::prepare_hospital;
use crate::response::HospitalReport;

/// Readmission-risk classifier over the fixed hospital feature set.
pub struct HospitalPredictor {
    model: Box<dyn ClassifierModel>,
}

impl HospitalPredictor {
    pub fn new(model: Box<dyn ClassifierModel>) -> Self {
        Self { model }
    }

    pub fn from_model_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let model = load_model(path)
            .with_context(|| format!("loading hospital model {}", path.display()))?;
        Ok(Self::new(model))
    }

    pub fn predict_table(&self, table: &Table) -> Result<HospitalReport, PredictError> {
        let (names, x) = prepare_hospital(table)?;
        self.model.validate_features(&names)?;
        let classes = self.model.predict(&x)?;
        let report = HospitalReport::from_classes(classes.as_slice())?;
        info!(
            "[Prognos::Hospital] {} patients: {} <30, {} >30, {} NO",
            report.summary.total_samples,
            report.summary.predicted_lt30,
            report.summary.predicted_gt30,
            report.summary.predicted_no
        );
        Ok(report)
    }

    /// Read a CSV from disk and predict every row.
    pub fn predict_path<P: AsRef<Path>>(&self, path: P) -> Result<HospitalReport, PredictError> {
        let table = read_table(path)?;
        self.predict_table(&table)
    }
}
