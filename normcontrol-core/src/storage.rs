use crate::cache::{ReportCacheKey, ReportCacheValue};
use crate::types::PageModel;
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Storage abstraction for caching audit reports
pub trait ReportStorage {
    fn get_report(&self, cache_key: &ReportCacheKey) -> Result<Option<ReportCacheValue>>;
    fn store_report(&self, cache_key: &ReportCacheKey, cache_value: &ReportCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        // Ensure cache directory exists
        fs::create_dir_all(format!("{cache_dir}/reports"))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn report_path(&self, cache_key: &ReportCacheKey) -> String {
        format!("{}/reports/{}.json", self.cache_dir, cache_key.to_cache_hash())
    }
}

impl ReportStorage for FileStorage {
    fn get_report(&self, cache_key: &ReportCacheKey) -> Result<Option<ReportCacheValue>> {
        let path = self.report_path(cache_key);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(&path)?;
            let cache_value: ReportCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached report: {}", e))?;
            if !cache_value.answers(cache_key) {
                debug!("Cached report at {} was stored for another key, ignoring", path);
                return Ok(None);
            }
            Ok(Some(cache_value))
        } else {
            Ok(None)
        }
    }

    fn store_report(&self, cache_key: &ReportCacheKey, cache_value: &ReportCacheValue) -> Result<()> {
        let path = self.report_path(cache_key);
        let json_str = serde_json::to_string_pretty(cache_value)
            .map_err(|e| anyhow!("Failed to serialize report for cache: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// No-op storage implementation that disables all caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl ReportStorage for NoOpStorage {
    fn get_report(&self, _cache_key: &ReportCacheKey) -> Result<Option<ReportCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_report(&self, _cache_key: &ReportCacheKey, _cache_value: &ReportCacheValue) -> Result<()> {
        Ok(()) // No-op
    }
}

/// Fingerprint of the page models, stable across runs for equal content
pub fn calculate_pages_hash(pages: &[PageModel]) -> Result<String> {
    calculate_config_hash(&pages)
}

/// SHA-256 of the JSON serialization of any config-like value
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize value for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
