//! Per-feature explanations of tree-ensemble predictions.
pub mod tree_shap;

use serde::Serialize;

use crate::math::Array2;

/// Additive feature contributions for a batch of samples.
///
/// Laid out as `[sample][group][feature + 1]`: every output group (one for
/// binary models, `num_class` for multi-class ones) carries one value per
/// feature followed by the bias. Each group's values sum to that group's raw
/// margin.
#[derive(Debug, Clone, PartialEq)]
pub struct Contributions {
    values: Vec<f32>,
    n_samples: usize,
    n_groups: usize,
    n_features: usize,
}

impl Contributions {
    pub fn new(
        values: Vec<f32>,
        n_samples: usize,
        n_groups: usize,
        n_features: usize,
    ) -> Option<Self> {
        if values.len() != n_samples * n_groups * (n_features + 1) {
            return None;
        }
        Some(Self {
            values,
            n_samples,
            n_groups,
            n_features,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn offset(&self, sample: usize, group: usize) -> usize {
        (sample * self.n_groups + group) * (self.n_features + 1)
    }

    /// Contributions of one sample to one group, bias last.
    pub fn row(&self, sample: usize, group: usize) -> &[f32] {
        let start = self.offset(sample, group);
        &self.values[start..start + self.n_features + 1]
    }

    pub fn get(&self, sample: usize, group: usize, feature: usize) -> f32 {
        self.row(sample, group)[feature]
    }

    pub fn bias(&self, sample: usize, group: usize) -> f32 {
        self.row(sample, group)[self.n_features]
    }

    /// `(n_samples, n_features)` matrix of one group with the bias column dropped.
    pub fn without_bias(&self, group: usize) -> Array2<f32> {
        let mut data = Vec::with_capacity(self.n_samples * self.n_features);
        for sample in 0..self.n_samples {
            data.extend_from_slice(&self.row(sample, group)[..self.n_features]);
        }
        Array2::from_raw(self.n_samples, self.n_features, data)
    }
}

/// Mean absolute value of each column.
pub fn mean_abs_importance(contribs: &Array2<f32>) -> Vec<f64> {
    let mut totals = vec![0.0f64; contribs.ncols()];
    for row in contribs.rows() {
        for (total, v) in totals.iter_mut().zip(row) {
            *total += v.abs() as f64;
        }
    }
    let n = contribs.nrows().max(1) as f64;
    totals.iter().map(|t| t / n).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub name: String,
    pub importance: f64,
}

/// The `k` most important features, most important first.
///
/// Equal importances are ordered by descending column position. Fewer than
/// `k` features yields all of them.
pub fn top_features(names: &[String], importances: &[f64], k: usize) -> Vec<FeatureImportance> {
    let mut order: Vec<usize> = (0..importances.len().min(names.len())).collect();
    order.sort_by(|&a, &b| {
        importances[b]
            .partial_cmp(&importances[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.cmp(&a))
    });
    order
        .into_iter()
        .take(k)
        .map(|i| FeatureImportance {
            name: names[i].clone(),
            importance: importances[i],
        })
        .collect()
}
