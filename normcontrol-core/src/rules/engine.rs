use super::datum::DatumPairingRule;
use super::letters::LetterConsistencyRule;
use super::markers::FootnoteMarkersRule;
use super::orientation::{AngularDimensionOrientationRule, DimensionOrientationRule};
use super::roughness::RoughnessBracketsRule;
use super::title_block::TitleBlockRule;
use super::{AuditRule, PageContext};
use crate::analysis::{PageAnalysis, PageAnalyzer};
use crate::catalog::DocumentCodeCatalog;
use crate::config::AuditConfig;
use crate::processor::StepProfiler;
use crate::types::*;
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Instantiate a rule family from its pipeline name
pub fn rule_by_name(rule_name: &str) -> Option<Box<dyn AuditRule>> {
    let rule: Box<dyn AuditRule> = match rule_name {
        "TitleBlock" => Box::new(TitleBlockRule),
        "LetterConsistency" => Box::new(LetterConsistencyRule),
        "FootnoteMarkers" => Box::new(FootnoteMarkersRule),
        "DimensionOrientation" => Box::new(DimensionOrientationRule),
        "AngularDimensionOrientation" => Box::new(AngularDimensionOrientationRule),
        "DatumPairing" => Box::new(DatumPairingRule),
        "RoughnessBrackets" => Box::new(RoughnessBracketsRule),
        _ => return None,
    };
    Some(rule)
}

pub struct RuleEngine {
    config: AuditConfig,
    catalog: Arc<DocumentCodeCatalog>,
    analyzer: PageAnalyzer,
    rules: Vec<Box<dyn AuditRule>>,
}

impl RuleEngine {
    /// Engine running the enabled rules of `config.pipeline`, in order
    pub fn new(config: AuditConfig, catalog: Arc<DocumentCodeCatalog>) -> Result<Self> {
        let mut rules = Vec::new();
        for rule_config in &config.pipeline.rules {
            if !rule_config.enabled {
                debug!("Skipping disabled rule: {}", rule_config.name);
                continue;
            }
            match rule_by_name(&rule_config.name) {
                Some(rule) => rules.push(rule),
                None => warn!("Unknown rule '{}' in pipeline config, skipping", rule_config.name),
            }
        }
        Self::with_rules(config, catalog, rules)
    }

    /// Engine with an explicit rule list; the pipeline config is ignored
    pub fn with_rules(
        config: AuditConfig,
        catalog: Arc<DocumentCodeCatalog>,
        rules: Vec<Box<dyn AuditRule>>,
    ) -> Result<Self> {
        let analyzer = PageAnalyzer::new(&config)?;
        Ok(Self {
            config,
            catalog,
            analyzer,
            rules,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(AuditConfig::default(), Arc::new(DocumentCodeCatalog::builtin()))
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DocumentCodeCatalog {
        &self.catalog
    }

    pub fn analyzer(&self) -> &PageAnalyzer {
        &self.analyzer
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Technical requirements of the first page with content, used as the
    /// comparison baseline for every page of the document.
    pub fn baseline(&self, pages: &[PageModel]) -> TechRequirements {
        match pages.iter().find(|p| p.has_content()) {
            Some(page) => {
                let baseline = self.analyzer.tech_requirements(page);
                info!(
                    "Technical requirements baseline from page {}: {} chars, {} letters, {} roughness marks",
                    page.page_number,
                    baseline.text.chars().count(),
                    baseline.elements.letters.len(),
                    baseline.elements.roughness.len()
                );
                baseline
            }
            None => TechRequirements::default(),
        }
    }

    /// Run every rule against one analyzed page. A failing rule becomes an
    /// engine-error violation and the remaining rules still run.
    pub fn check_page(
        &self,
        page: &PageModel,
        analysis: &PageAnalysis,
        baseline: &TechRequirements,
    ) -> Vec<Violation> {
        self.check_page_timed(page, analysis, baseline, &mut Vec::new())
    }

    fn check_page_timed(
        &self,
        page: &PageModel,
        analysis: &PageAnalysis,
        baseline: &TechRequirements,
        rule_timings: &mut Vec<(String, Duration)>,
    ) -> Vec<Violation> {
        let ctx = PageContext {
            page,
            analysis,
            baseline,
            catalog: &self.catalog,
            config: &self.config,
        };

        let mut violations = Vec::new();
        for rule in &self.rules {
            let rule_start = Instant::now();
            match rule.check(&ctx) {
                Ok(found) => {
                    debug!(
                        "Page {}: rule {} ({}) found {} violations",
                        page.page_number,
                        rule.id(),
                        rule.name(),
                        found.len()
                    );
                    violations.extend(found);
                }
                Err(e) => {
                    warn!(
                        "Page {}: rule {} ({}) failed: {:#}",
                        page.page_number,
                        rule.id(),
                        rule.name(),
                        e
                    );
                    violations.push(engine_error(rule.as_ref(), page.page_number, &e));
                }
            }
            rule_timings.push((rule.name().to_string(), rule_start.elapsed()));
        }
        violations
    }

    pub fn run_all_checks(&self, pages: &[PageModel]) -> ViolationReport {
        self.run_all_checks_with_profiler(pages, &mut StepProfiler::new(false))
    }

    /// Same as `run_all_checks`, timing the baseline, each page's analysis
    /// and rule stages, and every rule on its own.
    pub fn run_all_checks_with_profiler(
        &self,
        pages: &[PageModel],
        profiler: &mut StepProfiler,
    ) -> ViolationReport {
        if !pages.iter().any(|p| p.has_content()) {
            warn!("No page content to audit ({} pages supplied)", pages.len());
            return ViolationReport::no_data(None);
        }

        let baseline = profiler.time_step("Tech requirements baseline", || self.baseline(pages));
        let mut violations = Vec::new();

        for page in pages {
            if !page.has_content() {
                warn!("Page {} has no content, skipping", page.page_number);
                continue;
            }
            let analysis = profiler.time_step(&format!("Page {} analysis", page.page_number), || {
                self.analyzer.analyze(page)
            });
            let mut rule_timings = Vec::new();
            let found = profiler.time_step(&format!("Page {} rules", page.page_number), || {
                self.check_page_timed(page, &analysis, &baseline, &mut rule_timings)
            });
            for (rule_name, elapsed) in rule_timings {
                profiler.record_rule(&rule_name, elapsed);
            }
            info!("Page {}: {} violations", page.page_number, found.len());
            violations.extend(found);
        }

        ViolationReport::from_violations(violations)
    }
}

fn engine_error(rule: &dyn AuditRule, page: u32, error: &anyhow::Error) -> Violation {
    Violation::new(RULE_ENGINE_ERROR, "Rule evaluation failed", Severity::High)
        .description(format!("Rule {} ({}) could not be evaluated: {:#}", rule.id(), rule.name(), error))
        .location(format!("Page {page}"))
        .recommendation("The remaining checks were completed; re-run the audit after fixing the input or report the failure")
        .on_page(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::error::AuditError;

    struct FailingRule;

    impl AuditRule for FailingRule {
        fn id(&self) -> &str {
            "9.9.9"
        }

        fn name(&self) -> &str {
            "Failing"
        }

        fn check(&self, _ctx: &PageContext) -> Result<Vec<Violation>> {
            Err(AuditError::RuleEvaluation {
                rule_id: "9.9.9".to_string(),
                message: "simulated failure".to_string(),
            }
            .into())
        }
    }

    fn catalog() -> Arc<DocumentCodeCatalog> {
        Arc::new(DocumentCodeCatalog::builtin())
    }

    fn page_without_code() -> PageModel {
        let mut page = PageModel::new(1, 1000.0, 800.0);
        page.spans.push(TextSpan::new("Корпус", BoundingBox::new(800.0, 740.0, 900.0, 750.0)));
        page
    }

    #[test]
    fn test_failing_rule_does_not_stop_others() {
        let rules: Vec<Box<dyn AuditRule>> = vec![Box::new(FailingRule), Box::new(TitleBlockRule)];
        let engine = RuleEngine::with_rules(AuditConfig::default(), catalog(), rules).unwrap();

        let report = engine.run_all_checks(&[page_without_code()]);
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[0].rule_id, RULE_ENGINE_ERROR);
        assert_eq!(report.violations[0].severity, Severity::High);
        assert!(report.violations[0].description.contains("simulated failure"));
        assert_eq!(report.violations[1].rule_id, RULE_TITLE_BLOCK);
        assert!(!report.is_compliant);
    }

    #[test]
    fn test_no_content_short_circuits() {
        let engine = RuleEngine::with_defaults().unwrap();
        for pages in [vec![], vec![PageModel::empty(1), PageModel::empty(2)]] {
            let report = engine.run_all_checks(&pages);
            assert_eq!(report.violations.len(), 1);
            assert_eq!(report.violations[0].rule_id, RULE_NO_DATA);
            assert_eq!(report.statistics.high_severity, 1);
        }
    }

    #[test]
    fn test_pipeline_config_controls_rules() {
        let mut config = AuditConfig::default();
        config.pipeline.rules = vec![
            RuleConfig::enabled("TitleBlock"),
            RuleConfig::enabled("NoSuchRule"),
            RuleConfig {
                name: "DatumPairing".to_string(),
                enabled: false,
            },
        ];
        let engine = RuleEngine::new(config, catalog()).unwrap();
        assert_eq!(engine.rule_names(), vec!["TitleBlock"]);
    }

    #[test]
    fn test_empty_pages_skipped_among_content() {
        let engine = RuleEngine::with_defaults().unwrap();
        let mut second = page_without_code();
        second.page_number = 2;
        let report = engine.run_all_checks(&[PageModel::empty(1), second]);
        assert!(report.violations.iter().all(|v| v.page == Some(2)));
        assert!(!report.violations.is_empty());
    }

    #[test]
    fn test_rule_timings_recorded() {
        let engine = RuleEngine::with_defaults().unwrap();
        let mut profiler = StepProfiler::new(true);
        engine.run_all_checks_with_profiler(&[page_without_code()], &mut profiler);
        assert_eq!(profiler.rule_timings().len(), 7);

        let mut quiet = StepProfiler::new(false);
        engine.run_all_checks_with_profiler(&[page_without_code()], &mut quiet);
        assert!(quiet.rule_timings().is_empty());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_shareable_across_threads() {
        assert_send_sync::<RuleEngine>();

        let engine = Arc::new(RuleEngine::with_defaults().unwrap());
        let expected = engine.run_all_checks(&[page_without_code()]);
        let reports: Vec<ViolationReport> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let engine = Arc::clone(&engine);
                    scope.spawn(move || engine.run_all_checks(&[page_without_code()]))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(reports.iter().all(|report| *report == expected));
    }
}
