//! Server configuration: JSON file, then command line / environment overrides.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

/// Periodic cleanup of persisted uploads. Disabled unless `max_age_secs` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_age_secs: Option<u64>,
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig {
            max_age_secs: None,
            sweep_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Working directory uploads are written to.
    pub data_dir: PathBuf,
    pub hospital_model: PathBuf,
    pub bacteria_model: PathBuf,
    pub taxonomy: PathBuf,
    pub cors: bool,
    pub max_upload_bytes: usize,
    pub retention: RetentionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:8000".to_string(),
            data_dir: PathBuf::from("data"),
            hospital_model: PathBuf::from("models/xgb_model.json"),
            bacteria_model: PathBuf::from("models/abund-16S-model.json"),
            taxonomy: PathBuf::from("data/taxonomy_mapping.csv"),
            cors: true,
            max_upload_bytes: 100 * 1024 * 1024,
            retention: RetentionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Apply `serve` flags (which also read `PROGNOS_*` variables) on top of
    /// the file configuration.
    pub fn apply_overrides(&mut self, matches: &ArgMatches) {
        if let Some(bind) = matches.get_one::<String>("bind") {
            self.bind = bind.clone();
        }
        if let Some(dir) = matches.get_one::<PathBuf>("data_dir") {
            self.data_dir = dir.clone();
        }
        if let Some(path) = matches.get_one::<PathBuf>("hospital_model") {
            self.hospital_model = path.clone();
        }
        if let Some(path) = matches.get_one::<PathBuf>("bacteria_model") {
            self.bacteria_model = path.clone();
        }
        if let Some(path) = matches.get_one::<PathBuf>("taxonomy") {
            self.taxonomy = path.clone();
        }
        if let Some(&secs) = matches.get_one::<u64>("max_upload_age") {
            self.retention.max_age_secs = Some(secs);
        }
        if matches.get_flag("no_cors") {
            self.cors = false;
        }
    }
}

pub fn load_server_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: ServerConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
