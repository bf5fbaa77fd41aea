// Per-page analysis: zones -> tokens -> geometry -> datum candidates.
// - extractor.rs: pattern-based token families
// - geometry.rs: segment classification and dimension orientation
// - datum.rs: datum-letter confirmation by surrounding graphics
// - tech_requirements.rs: locating the note block that serves as baseline

pub mod datum;
pub mod extractor;
pub mod geometry;
pub mod tech_requirements;

pub use datum::{DatumMatcher, DatumReport, DatumTally};
pub use extractor::ElementExtractor;
pub use geometry::{ClassifiedSegments, GeometricAnalyzer};
pub use tech_requirements::TechRequirementsLocator;

use crate::classifier::RegionClassifier;
use crate::config::AuditConfig;
use crate::error::AuditResult;
use crate::types::*;
use tracing::info;

/// Everything the rules need to know about one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageAnalysis {
    pub page_number: u32,
    pub title_block_text: String,
    pub title_block: ExtractedElements,
    pub drawing_field_text: String,
    pub drawing_field: ExtractedElements,
    pub dimensions: Vec<DimensionElement>,
    pub segments: ClassifiedSegments,
    pub datum: DatumReport,
}

/// Composes the per-page analysis stages under one config
pub struct PageAnalyzer {
    classifier: RegionClassifier,
    extractor: ElementExtractor,
    geometry: GeometricAnalyzer,
    datum: DatumMatcher,
    locator: TechRequirementsLocator,
}

impl PageAnalyzer {
    pub fn new(config: &AuditConfig) -> AuditResult<Self> {
        Ok(Self {
            classifier: RegionClassifier::new(config.zones.clone()),
            extractor: ElementExtractor::new(&config.extraction)?,
            geometry: GeometricAnalyzer::new(&config.geometry)?,
            datum: DatumMatcher::new(&config.datum),
            locator: TechRequirementsLocator::new(config.extraction.tech_requirements_fallback)?,
        })
    }

    pub fn extractor(&self) -> &ElementExtractor {
        &self.extractor
    }

    pub fn geometry(&self) -> &GeometricAnalyzer {
        &self.geometry
    }

    /// Technical requirements of a page, with their extracted tokens
    pub fn tech_requirements(&self, page: &PageModel) -> TechRequirements {
        let zoned = self.classifier.partition(page);
        let text = self.locator.locate(page, &zoned);
        let elements = self.extractor.extract(&text);
        TechRequirements { text, elements }
    }

    pub fn analyze(&self, page: &PageModel) -> PageAnalysis {
        let zoned = self.classifier.partition(page);

        let title_block_text = zoned.title_block_text();
        let drawing_field_text = zoned.drawing_field_text();
        let title_block = self.extractor.extract(&title_block_text);
        let drawing_field = self.extractor.extract(&drawing_field_text);

        // Numerals in the title block and the note block are not dimensions
        let segments = self.geometry.classify_segments(&page.segments);
        let dimensions = self.geometry.analyze_spans(&zoned.drawing_field, &segments);

        let datum = self
            .datum
            .match_letters(&drawing_field.letters, &zoned.drawing_field, &page.segments);

        info!(
            "Page {}: {} codes, {} letters, {} dimensions, {} lines, {} arrows, {} rectangles",
            page.page_number,
            title_block.codes.len(),
            drawing_field.letters.len(),
            dimensions.len(),
            segments.lines.len(),
            segments.arrows.len(),
            segments.rectangles.len()
        );

        PageAnalysis {
            page_number: page.page_number,
            title_block_text,
            title_block,
            drawing_field_text,
            drawing_field,
            dimensions,
            segments,
            datum,
        }
    }
}
