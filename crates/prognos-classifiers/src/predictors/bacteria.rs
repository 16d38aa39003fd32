use std::path::Path;

use anyhow::Context;
use log::{debug, info};

use crate::error::PredictError;
use crate::explain::{mean_abs_importance, top_features};
use crate::io::{read_table, Table, TaxonomyMap};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::load_model;
use crate::preprocessing::prepare_abundance;
use crate::response::{BacteriaReport, TopFeature};

/// Number of OTUs reported in `top_5_features`.
pub const TOP_FEATURES: usize = 5;

/// Autism/control classifier over OTU abundances, with per-OTU explanations.
pub struct BacteriaPredictor {
    model: Box<dyn ClassifierModel>,
    taxonomy: TaxonomyMap,
}

impl BacteriaPredictor {
    pub fn new(model: Box<dyn ClassifierModel>, taxonomy: TaxonomyMap) -> Self {
        Self { model, taxonomy }
    }

    /// Load the model and the OTU taxonomy mapping; a missing mapping file
    /// leaves every OTU as `"Unknown"`.
    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        taxonomy_path: Q,
    ) -> anyhow::Result<Self> {
        let model_path = model_path.as_ref();
        let taxonomy_path = taxonomy_path.as_ref();
        let model = load_model(model_path)
            .with_context(|| format!("loading bacteria model {}", model_path.display()))?;
        let taxonomy = TaxonomyMap::load_or_empty(taxonomy_path)
            .with_context(|| format!("loading taxonomy mapping {}", taxonomy_path.display()))?;
        Ok(Self::new(model, taxonomy))
    }

    pub fn taxonomy(&self) -> &TaxonomyMap {
        &self.taxonomy
    }

    pub fn predict_table(&self, table: Table) -> Result<BacteriaReport, PredictError> {
        let data = prepare_abundance(table)?;
        self.model.validate_features(&data.feature_names)?;

        let predictions = self.model.predict(&data.features)?;
        let proba = self.model.predict_proba(&data.features)?;
        if proba.ncols() != 2 {
            return Err(PredictError::Inference(format!(
                "expected a binary classifier, model reports {} classes",
                proba.ncols()
            )));
        }
        let positive = proba.column(1);

        let contributions = self.model.predict_contributions(&data.features)?;
        let importances = mean_abs_importance(&contributions.without_bias(0));
        let top = top_features(&data.feature_names, &importances, TOP_FEATURES)
            .into_iter()
            .map(|f| TopFeature {
                taxonomy: self.taxonomy.get(&f.name).to_string(),
                otu: f.name,
                importance: f.importance,
            })
            .collect::<Vec<_>>();
        debug!(
            "[Prognos::Bacteria] Top features: {:?}",
            top.iter().map(|f| f.otu.as_str()).collect::<Vec<_>>()
        );

        let report = BacteriaReport::assemble(
            &data.sample_ids,
            predictions.as_slice(),
            positive.as_slice(),
            top,
        )?;
        info!(
            "[Prognos::Bacteria] {} samples: {} autism, {} control",
            report.summary.total_samples,
            report.summary.autism_predicted,
            report.summary.control_predicted
        );
        Ok(report)
    }

    /// Read an abundance CSV from disk and predict every sample.
    pub fn predict_path<P: AsRef<Path>>(&self, path: P) -> Result<BacteriaReport, PredictError> {
        let table = read_table(path)?;
        self.predict_table(table)
    }
}
