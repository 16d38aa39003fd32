//! prognos-classifiers: tabular classifiers served by `prognos`.
//!
//! Reads uploaded CSV tables, shapes them into the feature layout each model
//! was trained on, evaluates XGBoost JSON models (with TreeSHAP feature
//! contributions) and assembles the JSON bodies returned to clients.
pub mod error;
pub mod explain;
pub mod io;
pub mod math;
pub mod models;
pub mod predictors;
pub mod preprocessing;
pub mod response;

pub use error::{ModelError, PredictError};
pub use predictors::{BacteriaPredictor, HospitalPredictor};
