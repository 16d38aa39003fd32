use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure raised while turning an uploaded table into predictions.
///
/// The variants follow the kinds of failure a request can hit; callers at
/// the HTTP boundary usually collapse everything except `InvalidUpload`
/// into a single opaque message.
#[derive(Debug)]
pub enum PredictError {
    /// The upload was rejected before any processing (e.g. wrong extension).
    InvalidUpload(String),
    /// The working file the pipeline was asked to read does not exist.
    MissingInput(PathBuf),
    /// Required columns are absent, misnamed or not numeric.
    Schema(String),
    /// The model could not evaluate the feature matrix.
    Inference(String),
    Io(io::Error),
    Csv(csv::Error),
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PredictError::InvalidUpload(msg) => write!(f, "{}", msg),
            PredictError::MissingInput(path) => write!(f, "File not found: {}", path.display()),
            PredictError::Schema(msg) => write!(f, "{}", msg),
            PredictError::Inference(msg) => write!(f, "{}", msg),
            PredictError::Io(e) => write!(f, "{}", e),
            PredictError::Csv(e) => write!(f, "{}", e),
        }
    }
}

impl Error for PredictError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PredictError::Io(e) => Some(e),
            PredictError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PredictError {
    fn from(e: io::Error) -> Self {
        PredictError::Io(e)
    }
}

impl From<csv::Error> for PredictError {
    fn from(e: csv::Error) -> Self {
        PredictError::Csv(e)
    }
}

/// Failure raised while loading a serialized model at startup.
#[derive(Debug)]
pub enum ModelError {
    Io(io::Error),
    Json(serde_json::Error),
    /// The file parsed but uses a booster, objective or split kind we do not evaluate.
    Unsupported(String),
    /// The file parsed but its trees are internally inconsistent.
    Malformed(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "failed to read model file: {}", e),
            ModelError::Json(e) => write!(f, "failed to parse model JSON: {}", e),
            ModelError::Unsupported(msg) => write!(f, "unsupported model: {}", msg),
            ModelError::Malformed(msg) => write!(f, "malformed model: {}", msg),
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModelError::Io(e) => Some(e),
            ModelError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ModelError {
    fn from(e: io::Error) -> Self {
        ModelError::Io(e)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Json(e)
    }
}
