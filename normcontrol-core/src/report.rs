use crate::cache::Fingerprints;
use crate::error::AuditError;
use crate::types::*;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Yaml,
    Text,
}

impl FromStr for ReportFormat {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            "text" | "txt" => Ok(ReportFormat::Text),
            other => Err(AuditError::UnknownFormat(other.to_string())),
        }
    }
}

impl ViolationReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Plain-text rendering stored alongside a document revision
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => self.to_json(),
            ReportFormat::Yaml => self.to_yaml(),
            ReportFormat::Text => Ok(self.to_text()),
        }
    }

}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.statistics;
        writeln!(f, "NORMCONTROL REPORT")?;
        writeln!(f, "==================")?;
        writeln!(f, "Total violations: {}", stats.total_violations)?;
        writeln!(f, "  High: {}", stats.high_severity)?;
        writeln!(f, "  Medium: {}", stats.medium_severity)?;
        writeln!(f, "  Low: {}", stats.low_severity)?;
        let status = if self.is_compliant { "COMPLIANT" } else { "NOT COMPLIANT" };
        writeln!(f, "Status: {status}")?;

        for (index, violation) in self.violations.iter().enumerate() {
            writeln!(f)?;
            writeln!(
                f,
                "{}. [{}] {}: {}",
                index + 1,
                violation.severity,
                violation.rule_id,
                violation.rule_text
            )?;
            writeln!(f, "   Location: {}", violation.location)?;
            writeln!(f, "   Violation: {}", violation.description)?;
            if let Some(quote) = &violation.quote {
                writeln!(f, "   Quote: {quote}")?;
            }
            writeln!(f, "   Recommendation: {}", violation.recommendation)?;
        }
        Ok(())
    }
}

/// Envelope stored with each document revision. The id and timestamp sit
/// outside the report body, which stays deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub fingerprints: Fingerprints,
    pub report: ViolationReport,
}

impl ReportSnapshot {
    pub fn new(report: ViolationReport, fingerprints: Fingerprints) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            fingerprints,
            report,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => self.to_json(),
            ReportFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            ReportFormat::Text => Ok(format!(
                "Snapshot {} ({})\nPages: {}\nConfig: {}\nCatalog: {}\n\n{}",
                self.id,
                self.created_at.to_rfc3339(),
                self.fingerprints.pages,
                self.fingerprints.config,
                self.fingerprints.catalog,
                self.report
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_report() -> ViolationReport {
        ViolationReport::from_violations(vec![
            Violation::new(RULE_TITLE_BLOCK, "Title block", Severity::High)
                .description("Code АБВГ.123456.002СБ designates 'Сборочный чертеж'")
                .location("Page 1, title block")
                .recommendation("Add the document name \"Сборочный чертеж\" to the title block")
                .on_page(1)
                .quote("АБВГ.123456.002СБ"),
            Violation::new(RULE_LETTERS, "Letters", Severity::Medium)
                .description("Letters on the drawing not explained: Б")
                .location("Page 1, drawing field")
                .recommendation("Explain Б")
                .on_page(1),
        ])
    }

    #[test]
    fn test_statistics_and_compliance() {
        let report = sample_report();
        assert_eq!(report.statistics.total_violations, 2);
        assert_eq!(report.statistics.high_severity, 1);
        assert_eq!(report.statistics.medium_severity, 1);
        assert!(!report.is_compliant);

        let low_only = ViolationReport::from_violations(vec![Violation::new("x", "x", Severity::Low)]);
        assert!(low_only.is_compliant);
    }

    #[test]
    fn test_json_and_yaml_are_lossless() {
        let report = sample_report();
        assert_eq!(ViolationReport::from_json(&report.to_json().unwrap()).unwrap(), report);
        assert_eq!(ViolationReport::from_yaml(&report.to_yaml().unwrap()).unwrap(), report);
        assert!(report.to_json().unwrap().contains("\"severity\": \"high\""));
    }

    #[test]
    fn test_text_rendering() {
        let text = sample_report().to_text();
        assert!(text.contains("Status: NOT COMPLIANT"));
        assert!(text.contains("1. [HIGH] 1.1.1: Title block"));
        assert!(text.contains("   Quote: АБВГ.123456.002СБ"));
        assert!(text.contains("2. [MEDIUM] 1.1.3: Letters"));
    }

    #[test]
    fn test_render_produces_text_without_touching_disk() {
        let report = sample_report();
        let rendered = report.render(ReportFormat::Text).unwrap();
        assert_eq!(rendered, report.to_text());
        assert!(rendered.starts_with("NORMCONTROL REPORT\n==================\n"));
        assert!(rendered.ends_with('\n'));

        let json = report.render(ReportFormat::Json).unwrap();
        assert_eq!(ViolationReport::from_json(&json).unwrap(), report);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let fingerprints = Fingerprints {
            pages: "p".to_string(),
            config: "c".to_string(),
            catalog: "k".to_string(),
        };
        let snapshot = ReportSnapshot::new(sample_report(), fingerprints);
        let restored = ReportSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(restored, snapshot);

        let text = snapshot.render(ReportFormat::Text).unwrap();
        assert!(text.contains("\nCatalog: k\n"));
        assert!(text.ends_with(&sample_report().to_text()));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("yml".parse::<ReportFormat>().unwrap(), ReportFormat::Yaml);
        assert!("pdf".parse::<ReportFormat>().is_err());
    }
}
