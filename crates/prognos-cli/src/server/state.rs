use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::info;
use prognos_classifiers::{BacteriaPredictor, HospitalPredictor};

use crate::config::ServerConfig;

/// Loaded once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub hospital: Arc<HospitalPredictor>,
    pub bacteria: Arc<BacteriaPredictor>,
    pub data_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(
        hospital: HospitalPredictor,
        bacteria: BacteriaPredictor,
        data_dir: PathBuf,
    ) -> Self {
        AppState {
            hospital: Arc::new(hospital),
            bacteria: Arc::new(bacteria),
            data_dir: Arc::new(data_dir),
        }
    }

    /// Load both models and the taxonomy mapping named by `config`.
    pub fn load(config: &ServerConfig) -> Result<Self> {
        info!(
            "[Prognos::Server] Loading hospital model from {}",
            config.hospital_model.display()
        );
        let hospital = HospitalPredictor::from_model_path(&config.hospital_model)?;
        info!(
            "[Prognos::Server] Loading bacteria model from {}",
            config.bacteria_model.display()
        );
        let bacteria = BacteriaPredictor::from_paths(&config.bacteria_model, &config.taxonomy)?;
        Ok(Self::new(hospital, bacteria, config.data_dir.clone()))
    }
}
