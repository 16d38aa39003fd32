//! End-to-end pipelines: CSV file → preprocessing → model → response body.
pub mod bacteria;
pub mod hospital;

pub use bacteria::BacteriaPredictor;
pub use hospital::HospitalPredictor;
