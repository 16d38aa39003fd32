//! OTU → taxonomy lookup used to annotate explained features.
use std::collections::HashMap;
use std::path::Path;

use crate::error::PredictError;

/// Label returned for OTUs without a mapping entry.
pub const UNKNOWN_TAXONOMY: &str = "Unknown";

#[derive(Debug, Clone, Default)]
pub struct TaxonomyMap {
    entries: HashMap<String, String>,
}

impl TaxonomyMap {
    /// Read a CSV with `OTU` and `taxonomy` columns. Later duplicates win.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PredictError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path.as_ref())?;

        let headers = reader.headers()?.clone();
        let otu_idx = headers.iter().position(|h| h == "OTU").ok_or_else(|| {
            PredictError::Schema("taxonomy mapping has no 'OTU' column".to_string())
        })?;
        let taxo_idx = headers.iter().position(|h| h == "taxonomy").ok_or_else(|| {
            PredictError::Schema("taxonomy mapping has no 'taxonomy' column".to_string())
        })?;

        let mut entries = HashMap::new();
        for record in reader.records() {
            let record = record?;
            if let (Some(otu), Some(taxonomy)) = (record.get(otu_idx), record.get(taxo_idx)) {
                entries.insert(otu.to_string(), taxonomy.to_string());
            }
        }
        Ok(Self { entries })
    }

    /// Load the mapping if the file exists, otherwise start empty.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Result<Self, PredictError> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!(
                "[Prognos::Taxonomy] No taxonomy mapping at {}; all OTUs will be reported as {}",
                path.display(),
                UNKNOWN_TAXONOMY
            );
            return Ok(Self::default());
        }
        let map = Self::from_path(path)?;
        log::info!(
            "[Prognos::Taxonomy] Loaded {} OTU descriptions from {}",
            map.len(),
            path.display()
        );
        Ok(map)
    }

    pub fn get(&self, otu: &str) -> &str {
        self.entries
            .get(otu)
            .map(|s| s.as_str())
            .unwrap_or(UNKNOWN_TAXONOMY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for TaxonomyMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
