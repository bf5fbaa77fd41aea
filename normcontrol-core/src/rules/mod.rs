// Rule system. The engine drives a config-ordered pipeline of rule families:
// - engine.rs: RuleEngine, per-page context, error capture and aggregation
// - title_block.rs: document code vs. catalog name (1.1.1)
// - letters.rs: designator letters vs. technical requirements (1.1.3)
// - markers.rs: footnote asterisk tiers vs. technical requirements (1.1.4)
// - orientation.rs: dimension text inside the 30° zone (1.1.5, 1.1.6)
// - datum.rs: datum letter pairing (1.1.8)
// - roughness.rs: bracketed roughness confirmation (1.1.9)

pub mod datum;
pub mod engine;
pub mod letters;
pub mod markers;
pub mod orientation;
pub mod roughness;
pub mod title_block;

pub use engine::*;

use crate::analysis::PageAnalysis;
use crate::catalog::DocumentCodeCatalog;
use crate::config::AuditConfig;
use crate::types::*;
use anyhow::Result;

/// Read-only inputs of one rule evaluation
pub struct PageContext<'a> {
    pub page: &'a PageModel,
    pub analysis: &'a PageAnalysis,
    /// Document-wide technical requirements, shared by every page
    pub baseline: &'a TechRequirements,
    pub catalog: &'a DocumentCodeCatalog,
    pub config: &'a AuditConfig,
}

impl PageContext<'_> {
    pub fn page_number(&self) -> u32 {
        self.page.page_number
    }

    pub fn location(&self, zone: Zone) -> String {
        format!("Page {}, {}", self.page.page_number, zone)
    }
}

// Rule pipeline infrastructure
pub trait AuditRule: Send + Sync {
    /// Checklist clause the rule enforces, e.g. `1.1.3`
    fn id(&self) -> &str;
    /// Name used in the pipeline config
    fn name(&self) -> &str;
    fn check(&self, ctx: &PageContext) -> Result<Vec<Violation>>;
}

/// Sorted, comma-separated listing for violation messages
pub(crate) fn join_sorted<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
