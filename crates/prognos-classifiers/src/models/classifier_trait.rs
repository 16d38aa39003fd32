use crate::error::PredictError;
use crate::explain::Contributions;
use crate::math::{Array1, Array2};

/// Inference contract shared by the loaded models.
///
/// Implementations are immutable once loaded and are evaluated concurrently
/// from request handlers, hence the `Send + Sync` bound.
pub trait ClassifierModel: Send + Sync {
    /// Predict class indices.
    fn predict(&self, x: &Array2<f32>) -> Result<Array1<u32>, PredictError>;

    /// Predict per-class probabilities, shape `(n_samples, n_classes)`.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f32>, PredictError>;

    /// Per-sample, per-feature contributions to the raw margin, with a
    /// trailing bias column.
    fn predict_contributions(&self, x: &Array2<f32>) -> Result<Contributions, PredictError>;

    /// Feature names recorded at training time, if any.
    fn feature_names(&self) -> Option<&[String]>;

    /// Number of input features the model was trained on.
    fn num_features(&self) -> usize;

    /// Check that a table's columns line up with the training schema.
    ///
    /// With recorded names the match must be exact, order included. Without
    /// them only the column count is compared.
    fn validate_features(&self, names: &[String]) -> Result<(), PredictError> {
        match self.feature_names() {
            Some(expected) if expected != names => {
                let missing: Vec<&str> = expected
                    .iter()
                    .filter(|n| !names.contains(n))
                    .map(|n| n.as_str())
                    .collect();
                let unexpected: Vec<&str> = names
                    .iter()
                    .filter(|n| !expected.contains(n))
                    .map(|n| n.as_str())
                    .collect();
                let mut msg = "feature_names mismatch".to_string();
                if !missing.is_empty() {
                    msg.push_str(&format!("\nexpected {} in input data", missing.join(", ")));
                }
                if !unexpected.is_empty() {
                    msg.push_str(&format!(
                        "\ntraining data did not have the following fields: {}",
                        unexpected.join(", ")
                    ));
                }
                if missing.is_empty() && unexpected.is_empty() {
                    msg.push_str("\ncolumns are not in training order");
                }
                Err(PredictError::Schema(msg))
            }
            Some(_) => Ok(()),
            None if names.len() != self.num_features() => Err(PredictError::Schema(format!(
                "Feature shape mismatch, expected: {}, got {}",
                self.num_features(),
                names.len()
            ))),
            None => Ok(()),
        }
    }

    /// Human readable name for logs.
    fn name(&self) -> &str {
        "classifier"
    }
}
