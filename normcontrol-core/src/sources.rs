// Page sources
//
// This module defines the boundary between page-content extraction (native
// drawing format -> PageModel) and the audit. Extraction itself happens
// outside this crate; a source only reads what the extractor wrote.

use crate::error::AuditError;
use crate::types::PageModel;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// PageSource trait - yields the page models of one document
///
/// Everything after this point works with PageModel and is format-agnostic.
pub trait PageSource: Send + Sync {
    /// Parse an already-read page-model file
    fn parse_bytes(&self, bytes: &[u8], path: &Path) -> Result<Vec<PageModel>>;

    /// Convenience method: read the file and parse it
    fn load(&self, path: &Path) -> Result<Vec<PageModel>> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read page model file {}", path.display()))?;
        let pages = self.parse_bytes(&bytes, path)?;
        info!("Loaded {} pages from {} via {}", pages.len(), path.display(), self.name());
        Ok(pages)
    }

    /// Get source name for debugging/logging
    fn name(&self) -> &str;

    /// Check if the source can read the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageDocument {
    Pages(Vec<PageModel>),
    Wrapped { pages: Vec<PageModel> },
}

impl PageDocument {
    fn into_pages(self) -> Vec<PageModel> {
        match self {
            PageDocument::Pages(pages) | PageDocument::Wrapped { pages } => pages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    Yaml,
}

/// Reads the JSON or YAML serialization of the page models, either a bare
/// list or an object with a `pages` list.
#[derive(Debug, Default, Clone)]
pub struct JsonPageSource;

impl JsonPageSource {
    pub fn new() -> Self {
        Self
    }

    fn encoding(path: &Path) -> Option<Encoding> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Encoding::Json),
            "yaml" | "yml" => Some(Encoding::Yaml),
            _ => None,
        }
    }

    pub fn parse_json(&self, bytes: &[u8]) -> Result<Vec<PageModel>> {
        let document: PageDocument =
            serde_json::from_slice(bytes).context("page model file is not valid JSON")?;
        Ok(document.into_pages())
    }

    pub fn parse_yaml(&self, bytes: &[u8]) -> Result<Vec<PageModel>> {
        let document: PageDocument =
            serde_yaml::from_slice(bytes).context("page model file is not valid YAML")?;
        Ok(document.into_pages())
    }
}

impl PageSource for JsonPageSource {
    fn parse_bytes(&self, bytes: &[u8], path: &Path) -> Result<Vec<PageModel>> {
        match Self::encoding(path) {
            Some(Encoding::Json) => self.parse_json(bytes),
            Some(Encoding::Yaml) => self.parse_yaml(bytes),
            None => Err(AuditError::UnknownFormat(path.display().to_string()).into()),
        }
    }

    fn name(&self) -> &str {
        "json-page-source"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        Self::encoding(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VectorSegment;

    const PAGES_JSON: &str = r#"[
      {
        "page_number": 1,
        "width": 1000.0,
        "height": 800.0,
        "spans": [
          {"text": "25", "bbox": {"x0": 10.0, "y0": 10.0, "x1": 22.0, "y1": 16.0}, "rotation": 90.0, "font_size": 3.5},
          {"text": "lost"}
        ],
        "segments": [
          {"kind": "line", "start": {"x": 0.0, "y": 20.0}, "end": {"x": 50.0, "y": 20.0}},
          {"kind": "rectangle", "rect": {"x0": 0.0, "y0": 0.0, "x1": 5.0, "y1": 5.0}},
          {"kind": "other"}
        ]
      }
    ]"#;

    #[test]
    fn test_parse_json_list() {
        let pages = JsonPageSource.parse_json(PAGES_JSON.as_bytes()).unwrap();
        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.spans[0].rotation, 90.0);
        assert!(page.spans[1].bbox.is_none());
        assert_eq!(page.segments[2], VectorSegment::Other);
    }

    #[test]
    fn test_parse_wrapped_yaml() {
        let yaml = "pages:\n  - page_number: 1\n    width: 100.0\n    height: 50.0\n";
        let pages = JsonPageSource.parse_yaml(yaml.as_bytes()).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(!pages[0].has_content());
    }

    #[test]
    fn test_file_type_dispatch() {
        let source = JsonPageSource::new();
        assert!(source.supports_file_type(Path::new("pages.JSON")));
        assert!(source.supports_file_type(Path::new("pages.yml")));
        assert!(!source.supports_file_type(Path::new("drawing.pdf")));

        let err = source
            .parse_bytes(b"[]", Path::new("drawing.pdf"))
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<AuditError>(), Some(AuditError::UnknownFormat(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = JsonPageSource.load(Path::new("/nonexistent/pages.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read page model file"));
    }
}
