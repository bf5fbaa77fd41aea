use thiserror::Error;

/// Errors raised inside the audit core. Boundary code (config loading, page
/// sources, storage) carries these inside `anyhow::Error`.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("no page content could be extracted from the document")]
    ExtractionUnavailable,

    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule {rule_id} failed: {message}")]
    RuleEvaluation { rule_id: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported format: {0}")]
    UnknownFormat(String),
}

pub type AuditResult<T> = std::result::Result<T, AuditError>;

/// Compile a regex, tagging failures with the offending pattern
pub(crate) fn compile(pattern: &str) -> AuditResult<regex::Regex> {
    regex::Regex::new(pattern).map_err(|source| AuditError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
