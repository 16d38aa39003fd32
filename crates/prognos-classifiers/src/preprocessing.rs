//! Table → feature-matrix transforms for the two served models.
//!
//! Text columns are factorized per upload rather than against a training
//! vocabulary, and abundance tables are oriented by comparing their row and
//! column counts.

use std::collections::HashMap;

use log::debug;

use crate::error::PredictError;
use crate::io::{Column, Table};
use crate::math::Array2;

/// Readmission model inputs, in training order.
pub const HOSPITAL_FEATURES: [&str; 20] = [
    "race",
    "gender",
    "age",
    "admission_type_id",
    "discharge_disposition_id",
    "admission_source_id",
    "time_in_hospital",
    "num_lab_procedures",
    "num_procedures",
    "num_medications",
    "number_outpatient",
    "number_emergency",
    "number_inpatient",
    "number_diagnoses",
    "max_glu_serum",
    "A1Cresult",
    "metformin",
    "insulin",
    "change",
    "diabetesMed",
];

/// Row label of the OTU identifier column in abundance tables.
pub const OTU_COLUMN: &str = "OTU";
pub const TAXONOMY_COLUMN: &str = "taxonomy";
pub const AUTISM_COLUMN: &str = "AUTISM";

/// Integer codes in order of first appearance, starting at 0. Missing cells get -1.
pub fn factorize(values: &[Option<String>]) -> Vec<i64> {
    let mut codes: HashMap<&str, i64> = HashMap::new();
    values
        .iter()
        .map(|v| match v {
            Some(s) => {
                let next = codes.len() as i64;
                *codes.entry(s.as_str()).or_insert(next)
            }
            None => -1,
        })
        .collect()
}

/// Replace every text column with its factorized codes. Numeric and boolean
/// columns are left alone.
pub fn encode_categoricals(table: &mut Table) {
    for (name, column) in table.columns_mut() {
        if let Column::Text(values) = &*column {
            let codes = factorize(values);
            debug!(
                "[Prognos::Preprocess] Factorized '{}' into {} levels",
                name,
                codes.iter().max().map(|m| m + 1).unwrap_or(0)
            );
            *column = Column::Numeric(codes.into_iter().map(|c| c as f32).collect());
        }
    }
}

/// Encode a hospital table and select [`HOSPITAL_FEATURES`] in order.
///
/// Returns the selected column names alongside the `(n_samples, 20)` matrix.
pub fn prepare_hospital(table: &Table) -> Result<(Vec<String>, Array2<f32>), PredictError> {
    let mut encoded = table.clone();
    encode_categoricals(&mut encoded);

    let missing: Vec<&str> = HOSPITAL_FEATURES
        .iter()
        .copied()
        .filter(|f| encoded.column_index(f).is_none())
        .collect();
    if !missing.is_empty() {
        let quoted: Vec<String> = missing.iter().map(|m| format!("'{}'", m)).collect();
        return Err(PredictError::Schema(format!(
            "[{}] not in index",
            quoted.join(", ")
        )));
    }

    let indices: Vec<usize> = HOSPITAL_FEATURES
        .iter()
        .filter_map(|f| encoded.column_index(f))
        .collect();
    let x = encoded.to_matrix(&indices)?;
    let names = HOSPITAL_FEATURES.iter().map(|f| f.to_string()).collect();
    Ok((names, x))
}

/// Samples × OTU abundances ready for the bacteria model.
#[derive(Debug, Clone)]
pub struct AbundanceTable {
    pub sample_ids: Vec<String>,
    pub feature_names: Vec<String>,
    pub features: Array2<f32>,
    /// 1 when the sample label starts with `A`. Never passed to the model.
    pub autism: Vec<u8>,
}

impl AbundanceTable {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }
}

/// Orient an OTU abundance table so samples are rows and derive the
/// `AUTISM` label from the sample names.
pub fn prepare_abundance(mut table: Table) -> Result<AbundanceTable, PredictError> {
    if table.column_index(OTU_COLUMN).is_some() {
        table.set_index(OTU_COLUMN)?;
    }
    table.drop_column(TAXONOMY_COLUMN);

    if table.nrows() > table.ncols() {
        debug!(
            "[Prognos::Preprocess] Transposing {}x{} abundance table",
            table.nrows(),
            table.ncols()
        );
        table = table.transpose()?;
    }

    if table.column_index(AUTISM_COLUMN).is_some() {
        return Err(PredictError::Schema(format!(
            "cannot insert {}, already exists",
            AUTISM_COLUMN
        )));
    }
    // Without an OTU column the labels stay positional ("0", "1", ...), so
    // every sample is labelled control rather than failing.
    let autism = table
        .index()
        .iter()
        .map(|id| u8::from(id.starts_with('A')))
        .collect();

    let all: Vec<usize> = (0..table.ncols()).collect();
    let features = table.to_matrix(&all)?;
    Ok(AbundanceTable {
        sample_ids: table.index().to_vec(),
        feature_names: table.headers().to_vec(),
        features,
        autism,
    })
}
