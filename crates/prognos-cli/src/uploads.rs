//! Persisting uploaded CSV files in the working directory and sweeping old ones.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};
use prognos_classifiers::PredictError;

use crate::config::RetentionConfig;

pub const HOSPITAL_PREFIX: &str = "input";
pub const BACTERIA_PREFIX: &str = "input_bacteria";

pub const ONLY_CSV: &str = "Only CSV files are supported.";

/// Only names ending in `.csv` are accepted; the check is case-sensitive.
pub fn is_csv_filename(name: &str) -> bool {
    name.ends_with(".csv")
}

pub fn check_csv_filename(name: &str) -> Result<(), PredictError> {
    if is_csv_filename(name) {
        Ok(())
    } else {
        Err(PredictError::InvalidUpload(ONLY_CSV.to_string()))
    }
}

/// `<prefix>_<8 hex chars>.csv`
pub fn upload_name(prefix: &str) -> String {
    format!("{}_{:08x}.csv", prefix, rand::random::<u32>())
}

/// Write an upload verbatim under a fresh name and return its path.
pub fn save_upload(dir: &Path, prefix: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(upload_name(prefix));
    fs::write(&path, bytes)?;
    debug!(
        "[Prognos::Uploads] Wrote {} bytes to {}",
        bytes.len(),
        path.display()
    );
    Ok(path)
}

fn is_upload_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("input_") && n.ends_with(".csv"))
        .unwrap_or(false)
}

/// Remove one upload if it is at least `max_age` old.
fn sweep_file(path: &Path, now: SystemTime, max_age: Duration) -> io::Result<bool> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Ok(false);
    }
    let age = now
        .duration_since(metadata.modified()?)
        .unwrap_or(Duration::ZERO);
    if age < max_age {
        return Ok(false);
    }
    fs::remove_file(path)?;
    Ok(true)
}

/// Delete `input_*.csv` files whose modification time is at least `max_age`
/// old. Returns how many were removed; entries that cannot be inspected or
/// removed are logged and skipped.
pub fn sweep_uploads(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("[Prognos::Uploads] Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !is_upload_file(&path) {
            continue;
        }
        match sweep_file(&path, now, max_age) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => warn!("[Prognos::Uploads] Could not sweep {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

/// Start the background sweeper when retention is configured.
pub fn spawn_retention_sweeper(
    dir: PathBuf,
    retention: &RetentionConfig,
) -> Option<tokio::task::JoinHandle<()>> {
    let max_age = Duration::from_secs(retention.max_age_secs?);
    let interval = Duration::from_secs(retention.sweep_interval_secs.max(1));
    info!(
        "[Prognos::Uploads] Removing uploads older than {}s from {} every {}s",
        max_age.as_secs(),
        dir.display(),
        interval.as_secs()
    );
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let dir = dir.clone();
            match tokio::task::spawn_blocking(move || sweep_uploads(&dir, max_age)).await {
                Ok(Ok(0)) => {}
                Ok(Ok(n)) => info!("[Prognos::Uploads] Removed {} expired uploads", n),
                Ok(Err(e)) => warn!("[Prognos::Uploads] Sweep failed: {}", e),
                Err(e) => warn!("[Prognos::Uploads] Sweep task failed: {}", e),
            }
        }
    }))
}
