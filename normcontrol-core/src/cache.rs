use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version constants for cache invalidation
pub mod versions {
    pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
    /// Bump when any rule changes what it reports
    pub const RULESET_VERSION: &str = "1.0.0";
}

/// Content hashes of the three inputs that decide a report
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprints {
    pub pages: String,
    pub config: String,
    pub catalog: String,
}

/// Report cache key: page models, audit config and document-code catalog,
/// plus the engine and ruleset that turned them into a report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReportCacheKey {
    pub pages_hash: String,
    pub config_hash: String,
    pub catalog_hash: String,
    pub engine_version: String,
    pub ruleset_version: String,
}

impl ReportCacheKey {
    pub fn new(fingerprints: &Fingerprints) -> Self {
        Self {
            pages_hash: fingerprints.pages.clone(),
            config_hash: fingerprints.config.clone(),
            catalog_hash: fingerprints.catalog.clone(),
            engine_version: versions::ENGINE_VERSION.to_string(),
            ruleset_version: versions::RULESET_VERSION.to_string(),
        }
    }

    /// Storage name for the entry. Parts are length-prefixed so that moving
    /// characters between neighbouring parts changes the hash.
    pub fn to_cache_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [
            &self.pages_hash,
            &self.config_hash,
            &self.catalog_hash,
            &self.engine_version,
            &self.ruleset_version,
        ] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Cached report, stored together with the key it answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCacheValue {
    pub key: ReportCacheKey,
    pub report: ViolationReport,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl ReportCacheValue {
    pub fn new(key: ReportCacheKey, report: ViolationReport, processing_time_ms: u64) -> Self {
        Self {
            key,
            report,
            created_at: Utc::now(),
            processing_time_ms,
        }
    }

    /// An entry written under another key (hash collision, or a file copied
    /// between cache directories) must not be served
    pub fn answers(&self, key: &ReportCacheKey) -> bool {
        self.key == *key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprints(pages: &str, config: &str, catalog: &str) -> Fingerprints {
        Fingerprints {
            pages: pages.to_string(),
            config: config.to_string(),
            catalog: catalog.to_string(),
        }
    }

    #[test]
    fn test_cache_hash_depends_on_every_part() {
        let base = ReportCacheKey::new(&fingerprints("pages", "config", "catalog"));
        let other_pages = ReportCacheKey::new(&fingerprints("pages2", "config", "catalog"));
        let other_catalog = ReportCacheKey::new(&fingerprints("pages", "config", "catalog2"));
        let mut other_ruleset = base.clone();
        other_ruleset.ruleset_version = "2.0.0".to_string();

        assert_eq!(base.to_cache_hash(), base.clone().to_cache_hash());
        assert_ne!(base.to_cache_hash(), other_pages.to_cache_hash());
        assert_ne!(base.to_cache_hash(), other_catalog.to_cache_hash());
        assert_ne!(base.to_cache_hash(), other_ruleset.to_cache_hash());
        assert_eq!(base.to_cache_hash().len(), 64);
    }

    #[test]
    fn test_shifted_boundaries_hash_differently() {
        let left = ReportCacheKey::new(&fingerprints("ab", "c", "d"));
        let right = ReportCacheKey::new(&fingerprints("a", "bc", "d"));
        assert_ne!(left.to_cache_hash(), right.to_cache_hash());
    }

    #[test]
    fn test_value_answers_only_its_key() {
        let key = ReportCacheKey::new(&fingerprints("p", "c", "k"));
        let other = ReportCacheKey::new(&fingerprints("p", "c", "k2"));
        let value = ReportCacheValue::new(key.clone(), ViolationReport::from_violations(vec![]), 3);
        assert!(value.answers(&key));
        assert!(!value.answers(&other));
    }
}
