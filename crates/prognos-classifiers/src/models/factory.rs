use std::path::Path;

use crate::error::ModelError;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::xgboost::XGBoostClassifier;

/// Load a serialized classifier, picking the reader from the file extension.
///
/// Only XGBoost's JSON format is understood; binary (`.ubj`, `.model`)
/// snapshots must be re-saved as JSON first.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Box<dyn ClassifierModel>, ModelError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => Ok(Box::new(XGBoostClassifier::from_file(path)?)),
        other => Err(ModelError::Unsupported(format!(
            "model file {} has extension {:?}; expected .json",
            path.display(),
            other.unwrap_or("")
        ))),
    }
}
