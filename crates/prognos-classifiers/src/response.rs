//! JSON bodies returned for each prediction request.
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Readmission classes, indexed by the model's class code.
pub const READMISSION_LABELS: [&str; 3] = ["<30", ">30", "NO"];

pub fn readmission_label(class: u32) -> Result<&'static str, PredictError> {
    READMISSION_LABELS
        .get(class as usize)
        .copied()
        .ok_or_else(|| PredictError::Inference(format!("unexpected readmission class {}", class)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalSummary {
    pub total_samples: usize,
    #[serde(rename = "predicted_<30")]
    pub predicted_lt30: usize,
    #[serde(rename = "predicted_>30")]
    pub predicted_gt30: usize,
    #[serde(rename = "predicted_NO")]
    pub predicted_no: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalResult {
    /// Row position in the uploaded table.
    pub patient_id: usize,
    pub readmission_prediction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalReport {
    pub summary: HospitalSummary,
    pub results: Vec<HospitalResult>,
}

impl HospitalReport {
    /// Build the report from per-row class codes.
    pub fn from_classes(classes: &[u32]) -> Result<Self, PredictError> {
        let labels = classes
            .iter()
            .map(|&c| readmission_label(c))
            .collect::<Result<Vec<_>, _>>()?;
        let count = |label: &str| labels.iter().filter(|&&l| l == label).count();

        Ok(Self {
            summary: HospitalSummary {
                total_samples: labels.len(),
                predicted_lt30: count(READMISSION_LABELS[0]),
                predicted_gt30: count(READMISSION_LABELS[1]),
                predicted_no: count(READMISSION_LABELS[2]),
            },
            results: labels
                .iter()
                .enumerate()
                .map(|(patient_id, label)| HospitalResult {
                    patient_id,
                    readmission_prediction: label.to_string(),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacteriaSummary {
    pub total_samples: usize,
    pub autism_predicted: usize,
    pub control_predicted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFeature {
    pub otu: String,
    /// Mean absolute contribution across the uploaded samples.
    pub importance: f64,
    pub taxonomy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacteriaResult {
    pub sample_id: String,
    pub autism_prediction: u32,
    pub autism_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacteriaReport {
    pub summary: BacteriaSummary,
    pub top_5_features: Vec<TopFeature>,
    pub results: Vec<BacteriaResult>,
}

impl BacteriaReport {
    pub fn assemble(
        sample_ids: &[String],
        predictions: &[u32],
        probabilities: &[f32],
        top_features: Vec<TopFeature>,
    ) -> Result<Self, PredictError> {
        if sample_ids.len() != predictions.len() || predictions.len() != probabilities.len() {
            return Err(PredictError::Inference(format!(
                "{} samples but {} predictions and {} probabilities",
                sample_ids.len(),
                predictions.len(),
                probabilities.len()
            )));
        }
        let autism_predicted = predictions.iter().filter(|&&p| p == 1).count();
        let results = sample_ids
            .iter()
            .zip(predictions)
            .zip(probabilities)
            .map(|((id, &pred), &proba)| BacteriaResult {
                sample_id: id.clone(),
                autism_prediction: pred,
                autism_probability: proba as f64,
            })
            .collect();

        Ok(Self {
            summary: BacteriaSummary {
                total_samples: predictions.len(),
                autism_predicted,
                control_predicted: predictions.len() - autism_predicted,
            },
            top_5_features: top_features,
            results,
        })
    }
}
