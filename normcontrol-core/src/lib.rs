// Normcontrol Core Library
//
// Audits engineering-drawing page models against drafting-standard rules.
// Main interface for turning extracted pages into a violation report.

pub mod types;
pub mod error;
pub mod config;
pub mod catalog;
pub mod classifier;
pub mod analysis;
pub mod rules;
pub mod sources;
pub mod processor;
pub mod cache;
pub mod storage;
pub mod report;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{AuditError, AuditResult};
pub use config::{AuditConfig, ConfigManager};
pub use catalog::DocumentCodeCatalog;
pub use classifier::{RegionClassifier, ZonedPage};
pub use rules::{AuditRule, PageContext, RuleEngine};
pub use sources::{JsonPageSource, PageSource};
pub use processor::{AuditOutcome, AuditProcessor, StepProfiler};
pub use cache::Fingerprints;
pub use report::{ReportFormat, ReportSnapshot};
