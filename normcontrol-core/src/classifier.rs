use crate::config::ZoneConfig;
use crate::types::*;
use tracing::{debug, warn};

/// Assigns every positioned span of a page to exactly one sheet zone.
pub struct RegionClassifier {
    zones: ZoneConfig,
}

impl Default for RegionClassifier {
    fn default() -> Self {
        Self::new(ZoneConfig::default())
    }
}

/// Spans of one page grouped by zone, in page order
#[derive(Debug, Default)]
pub struct ZonedPage<'a> {
    pub title_block: Vec<&'a TextSpan>,
    pub drawing_field: Vec<&'a TextSpan>,
    pub tech_requirements: Vec<&'a TextSpan>,
    /// Spans with a missing or degenerate bounding box
    pub dropped: usize,
}

impl<'a> ZonedPage<'a> {
    pub fn spans(&self, zone: Zone) -> &[&'a TextSpan] {
        match zone {
            Zone::TitleBlock => &self.title_block,
            Zone::DrawingField => &self.drawing_field,
            Zone::TechRequirements => &self.tech_requirements,
        }
    }

    pub fn title_block_text(&self) -> String {
        join_inline(&self.title_block)
    }

    pub fn drawing_field_text(&self) -> String {
        join_inline(&self.drawing_field)
    }

    /// Tech-requirements text, one span per line, top to bottom
    pub fn tech_requirements_text(&self) -> String {
        let mut spans = self.tech_requirements.clone();
        spans.sort_by(|a, b| center_y(a).total_cmp(&center_y(b)));
        spans
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn center_y(span: &TextSpan) -> f64 {
    span.center().map(|c| c.y).unwrap_or(f64::MAX)
}

fn join_inline(spans: &[&TextSpan]) -> String {
    spans
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl RegionClassifier {
    pub fn new(zones: ZoneConfig) -> Self {
        Self { zones }
    }

    /// Zone of a point on a page of the given size.
    ///
    /// The title block is tested first: the tech-requirements band shares its
    /// x-range, so evaluation order is what keeps the zones exclusive.
    pub fn zone_for_point(&self, point: Point, width: f64, height: f64) -> Zone {
        let in_title_x = point.x >= self.zones.title_block_min_x * width && point.x <= width;
        let in_title_y = point.y >= self.zones.title_block_min_y * height && point.y <= height;
        if in_title_x && in_title_y {
            return Zone::TitleBlock;
        }

        let in_tech_x = point.x >= self.zones.tech_requirements_min_x * width && point.x <= width;
        let in_tech_y = point.y >= 0.0 && point.y <= self.zones.tech_requirements_max_y * height;
        if in_tech_x && in_tech_y {
            return Zone::TechRequirements;
        }

        Zone::DrawingField
    }

    /// Zone of a span, or None if its bounding box is unusable
    pub fn classify_span(&self, span: &TextSpan, width: f64, height: f64) -> Option<Zone> {
        span.center()
            .map(|center| self.zone_for_point(center, width, height))
    }

    pub fn partition<'a>(&self, page: &'a PageModel) -> ZonedPage<'a> {
        let mut zoned = ZonedPage::default();

        for span in &page.spans {
            match self.classify_span(span, page.width, page.height) {
                Some(Zone::TitleBlock) => zoned.title_block.push(span),
                Some(Zone::DrawingField) => zoned.drawing_field.push(span),
                Some(Zone::TechRequirements) => zoned.tech_requirements.push(span),
                None => {
                    warn!(
                        "Page {}: skipping span {:?} with missing or degenerate bounding box",
                        page.page_number, span.text
                    );
                    zoned.dropped += 1;
                }
            }
        }

        debug!(
            "Page {} zones: title_block={} drawing_field={} tech_requirements={} dropped={}",
            page.page_number,
            zoned.title_block.len(),
            zoned.drawing_field.len(),
            zoned.tech_requirements.len(),
            zoned.dropped
        );

        zoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_at(text: &str, cx: f64, cy: f64) -> TextSpan {
        TextSpan::new(text, BoundingBox::new(cx - 5.0, cy - 2.0, cx + 5.0, cy + 2.0))
    }

    #[test]
    fn test_corner_zones() {
        let classifier = RegionClassifier::default();
        let (w, h) = (1000.0, 800.0);
        assert_eq!(classifier.zone_for_point(Point::new(900.0, 750.0), w, h), Zone::TitleBlock);
        assert_eq!(classifier.zone_for_point(Point::new(900.0, 100.0), w, h), Zone::TechRequirements);
        assert_eq!(classifier.zone_for_point(Point::new(100.0, 100.0), w, h), Zone::DrawingField);
        // Between the tech band (<= 520) and the title block (>= 560)
        assert_eq!(classifier.zone_for_point(Point::new(900.0, 540.0), w, h), Zone::DrawingField);
    }

    #[test]
    fn test_title_block_wins_over_tech_band() {
        let zones = ZoneConfig {
            tech_requirements_max_y: 1.0,
            ..ZoneConfig::default()
        };
        let classifier = RegionClassifier::new(zones);
        assert_eq!(
            classifier.zone_for_point(Point::new(700.0, 700.0), 1000.0, 800.0),
            Zone::TitleBlock
        );
    }

    #[test]
    fn test_degenerate_spans_dropped() {
        let mut page = PageModel::new(1, 1000.0, 800.0);
        page.spans.push(span_at("A", 100.0, 100.0));
        page.spans.push(TextSpan {
            text: "lost".to_string(),
            bbox: None,
            rotation: 0.0,
            font_size: 10.0,
        });
        page.spans.push(TextSpan::new("flat", BoundingBox::new(5.0, 5.0, 5.0, 5.0)));
        page.spans.push(TextSpan::new("nan", BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0)));

        let zoned = RegionClassifier::default().partition(&page);
        assert_eq!(zoned.drawing_field.len(), 1);
        assert_eq!(zoned.dropped, 3);
    }

    #[test]
    fn test_tech_text_ordered_top_to_bottom() {
        let mut page = PageModel::new(1, 1000.0, 800.0);
        page.spans.push(span_at("2. Second", 800.0, 200.0));
        page.spans.push(span_at("1. First", 800.0, 100.0));
        page.spans.push(span_at("Title", 900.0, 760.0));
        page.spans.push(span_at("Sheet", 950.0, 780.0));

        let zoned = RegionClassifier::default().partition(&page);
        assert_eq!(zoned.tech_requirements_text(), "1. First\n2. Second");
        assert_eq!(zoned.title_block_text(), "Title Sheet");
        assert_eq!(zoned.spans(Zone::DrawingField).len(), 0);
    }
}
