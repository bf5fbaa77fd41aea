use crate::cache::{Fingerprints, ReportCacheKey, ReportCacheValue};
use crate::catalog::DocumentCodeCatalog;
use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::rules::RuleEngine;
use crate::sources::{JsonPageSource, PageSource};
use crate::storage::{calculate_config_hash, calculate_pages_hash, FileStorage, NoOpStorage, ReportStorage};
use crate::types::*;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Wall-clock timings of pipeline steps and of individual rules. A disabled
/// profiler runs the steps and records nothing.
pub struct StepProfiler {
    steps: Option<Vec<(String, Duration)>>,
    rules: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            steps: enabled.then(Vec::new),
            rules: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.steps.is_some()
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let Some(steps) = self.steps.as_mut() else {
            return f();
        };

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        info!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());
        steps.push((step_name.to_string(), elapsed));

        result
    }

    /// Time spent in one rule on one page. Rule time is already inside the
    /// enclosing page step, so it is kept apart from the step list.
    pub fn record_rule(&mut self, rule_name: &str, elapsed: Duration) {
        if self.is_enabled() {
            self.rules.push((rule_name.to_string(), elapsed));
        }
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        self.steps.as_deref().unwrap_or(&[])
    }

    pub fn rule_timings(&self) -> &[(String, Duration)] {
        &self.rules
    }

    pub fn total(&self) -> Duration {
        self.timings().iter().map(|(_, d)| *d).sum()
    }

    /// Rule time summed over pages, slowest rule first
    pub fn rule_totals(&self) -> Vec<(&str, Duration)> {
        let mut totals: BTreeMap<&str, Duration> = BTreeMap::new();
        for (name, elapsed) in &self.rules {
            *totals.entry(name.as_str()).or_default() += *elapsed;
        }
        let mut totals: Vec<(&str, Duration)> = totals.into_iter().collect();
        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals
    }

    pub fn log_summary(&self) {
        let total = self.total();
        if self.timings().is_empty() {
            return;
        }

        info!("📊 Audit steps ({}ms total):", total.as_millis());
        for (step, duration) in self.timings() {
            let share = if total.is_zero() {
                0.0
            } else {
                duration.as_secs_f64() / total.as_secs_f64() * 100.0
            };
            info!("   {:.<35} {:>6}ms {:>5.1}%", step, duration.as_millis(), share);
        }
        for (rule, duration) in self.rule_totals() {
            info!("   rule {:.<30} {:>6}ms", rule, duration.as_millis());
        }
    }
}

/// Result of auditing one document, with the fingerprints it was keyed by
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub report: ViolationReport,
    pub fingerprints: Fingerprints,
    pub cached: bool,
}

/// End-to-end audit: page source -> cache lookup -> rule engine -> cache store
pub struct AuditProcessor {
    source: Box<dyn PageSource>,
    storage: Box<dyn ReportStorage + Send + Sync>,
    engine: RuleEngine,
}

impl AuditProcessor {
    /// Create AuditProcessor with full dependency injection
    pub fn new_with_dependencies(
        source: Box<dyn PageSource>,
        storage: Box<dyn ReportStorage + Send + Sync>,
        engine: RuleEngine,
    ) -> Self {
        Self {
            source,
            storage,
            engine,
        }
    }

    /// JSON page source, no caching
    pub fn new(config: AuditConfig, catalog: Arc<DocumentCodeCatalog>) -> Result<Self> {
        Ok(Self::new_with_dependencies(
            Box::new(JsonPageSource::new()),
            Box::new(NoOpStorage::new()),
            RuleEngine::new(config, catalog)?,
        ))
    }

    /// Convenience constructor for CLI usage with a report cache directory
    pub fn new_with_cache(
        config: AuditConfig,
        catalog: Arc<DocumentCodeCatalog>,
        cache_dir: &str,
    ) -> Result<Self> {
        Ok(Self::new_with_dependencies(
            Box::new(JsonPageSource::new()),
            Box::new(FileStorage::new(cache_dir)?),
            RuleEngine::new(config, catalog)?,
        ))
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Audit page models already in memory
    pub fn audit(&self, pages: &[PageModel]) -> ViolationReport {
        self.engine.run_all_checks(pages)
    }

    /// Fingerprints of the input and of everything that shapes the verdict
    pub fn fingerprints(&self, pages: &[PageModel]) -> Result<Fingerprints> {
        Ok(Fingerprints {
            pages: calculate_pages_hash(pages)?,
            config: calculate_config_hash(self.engine.config())?,
            catalog: calculate_config_hash(self.engine.catalog())?,
        })
    }

    /// Load a page-model file and audit it, consulting the report cache.
    ///
    /// A file that cannot be read or parsed yields the no-data report rather
    /// than an error; only an unsupported file type is an error.
    pub fn audit_file(
        &self,
        input_path: &Path,
        enable_profiling: bool,
        skip_cache: bool,
    ) -> Result<AuditOutcome> {
        if !self.source.supports_file_type(input_path) {
            return Err(AuditError::UnknownFormat(input_path.display().to_string()).into());
        }

        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(enable_profiling);

        let pages = match profiler.time_step("Page loading", || self.source.load(input_path)) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Page extraction unavailable for {}: {:#}", input_path.display(), e);
                return Ok(AuditOutcome {
                    report: ViolationReport::no_data(Some(&format!("{e:#}"))),
                    fingerprints: self.fingerprints(&[])?,
                    cached: false,
                });
            }
        };

        let fingerprints = profiler.time_step("Cache Key Generation", || self.fingerprints(&pages))?;
        let cache_key = ReportCacheKey::new(&fingerprints);

        let cached_result = if skip_cache {
            info!("🚫 Skipping cache lookup");
            None
        } else {
            profiler.time_step("Cache Lookup", || self.storage.get_report(&cache_key))?
        };

        if let Some(cached) = cached_result {
            info!("🎯 Cache hit: report for these pages, config and catalog from {}", cached.created_at);
            profiler.log_summary();
            return Ok(AuditOutcome {
                report: cached.report,
                fingerprints,
                cached: true,
            });
        }

        let report = self.engine.run_all_checks_with_profiler(&pages, &mut profiler);

        if !skip_cache {
            profiler.time_step("Cache Storage", || {
                let processing_time = start_time.elapsed().as_millis() as u64;
                let cache_value = ReportCacheValue::new(cache_key.clone(), report.clone(), processing_time);
                self.storage.store_report(&cache_key, &cache_value)
            })?;
        }

        profiler.log_summary();
        info!(
            "⏱️  Total audit time: {:.0}ms",
            start_time.elapsed().as_millis()
        );

        Ok(AuditOutcome {
            report,
            fingerprints,
            cached: false,
        })
    }
}
