use crate::config::GeometryConfig;
use crate::error::{compile, AuditResult};
use crate::types::*;
use regex::Regex;
use tracing::debug;

/// Perpendicular distance from `point` to the infinite line through `start`
/// and `end`. A zero-length line is infinitely far from everything.
pub fn distance_to_line(start: &Point, end: &Point, point: &Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let denominator = (dx * dx + dy * dy).sqrt();
    if denominator == 0.0 {
        return f64::INFINITY;
    }
    let numerator = (dy * point.x - dx * point.y + end.x * start.y - end.y * start.x).abs();
    numerator / denominator
}

/// True when `angle` (any range, taken modulo 180) lies within `band`
/// degrees of horizontal or of vertical.
pub fn in_axis_zone(angle: f64, band: f64) -> bool {
    let normalized = angle.rem_euclid(180.0);
    let horizontal = normalized <= band || normalized >= 180.0 - band;
    let vertical = (normalized - 90.0).abs() <= band;
    horizontal || vertical
}

/// True when a text rotation reads horizontally (upright or upside down)
pub fn is_horizontal_rotation(rotation: f64, tolerance: f64) -> bool {
    let r = rotation.rem_euclid(360.0);
    r < tolerance || (r - 180.0).abs() < tolerance || 360.0 - r < tolerance
}

/// Line work of a page split by role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedSegments {
    /// Short wedge strokes of arrowheads
    pub arrows: Vec<LineSegment>,
    pub lines: Vec<LineSegment>,
    pub rectangles: Vec<BoundingBox>,
}

impl ClassifiedSegments {
    /// Every line stroke, arrowheads included
    pub fn all_lines(&self) -> impl Iterator<Item = &LineSegment> {
        self.lines.iter().chain(self.arrows.iter())
    }
}

const DIMENSION_PATTERN: &str =
    r"(?i)^(?:±?\d+(?:[.,]\d*)?\s*(?:мм|см|mm|cm|°|град|deg|м|R|⌀)?|[R⌀Ø]\d+(?:[.,]\d+)?)$";

const ANGULAR_MARKERS: [&str; 5] = ["°", "град", "deg", "угол", "∠"];

/// Correlates dimension numerals with the line work around them
pub struct GeometricAnalyzer {
    config: GeometryConfig,
    dimension_pattern: Regex,
}

impl GeometricAnalyzer {
    pub fn new(config: &GeometryConfig) -> AuditResult<Self> {
        Ok(Self {
            config: config.clone(),
            dimension_pattern: compile(DIMENSION_PATTERN)?,
        })
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    pub fn is_arrow_candidate(&self, line: &LineSegment) -> bool {
        let length_ok =
            line.length >= self.config.arrow_min_length && line.length <= self.config.arrow_max_length;
        length_ok
            && self
                .config
                .arrow_angle_bands
                .iter()
                .any(|(lo, hi)| line.angle >= *lo && line.angle <= *hi)
    }

    pub fn classify_segments(&self, segments: &[VectorSegment]) -> ClassifiedSegments {
        let mut classified = ClassifiedSegments::default();
        for segment in segments {
            match segment {
                VectorSegment::Line { start, end } => {
                    let line = LineSegment::new(*start, *end);
                    if self.is_arrow_candidate(&line) {
                        classified.arrows.push(line);
                    } else {
                        classified.lines.push(line);
                    }
                }
                VectorSegment::Rectangle { rect } => classified.rectangles.push(*rect),
                VectorSegment::Other => {}
            }
        }
        classified
    }

    /// Whether span text is a numeric or angular dimension. Trailing footnote
    /// asterisks are ignored.
    pub fn is_dimension_text(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if !trimmed.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }
        let core = trimmed.trim_end_matches(|c: char| c == '*' || c.is_whitespace());
        self.dimension_pattern.is_match(core)
    }

    pub fn is_angular_text(text: &str) -> bool {
        let lower = text.to_lowercase();
        ANGULAR_MARKERS.iter().any(|marker| lower.contains(marker))
    }

    pub fn in_zone(&self, angle: f64) -> bool {
        in_axis_zone(angle, self.config.zone_band)
    }

    pub fn is_horizontal_text(&self, rotation: f64) -> bool {
        is_horizontal_rotation(rotation, self.config.horizontal_text_tolerance)
    }

    fn is_shelf(&self, line: &LineSegment, distance: f64) -> bool {
        let tol = self.config.shelf_angle_tolerance;
        distance <= self.config.shelf_distance && (line.angle < tol || (line.angle - 180.0).abs() < tol)
    }

    /// Build a DimensionElement for a span, or None if the span is not a
    /// positioned dimension.
    pub fn dimension_element(
        &self,
        span: &TextSpan,
        segments: &ClassifiedSegments,
    ) -> Option<DimensionElement> {
        let bbox = *span.valid_bbox()?;
        if !self.is_dimension_text(&span.text) {
            return None;
        }
        let position = bbox.center();

        let mut nearby: Vec<(f64, &LineSegment)> = Vec::new();
        let mut shelf_lines = Vec::new();
        for line in segments.all_lines() {
            let distance = distance_to_line(&line.start, &line.end, &position);
            if distance < self.config.proximity_radius {
                nearby.push((distance, line));
            }
            if self.is_shelf(line, distance) {
                shelf_lines.push(line.clone());
            }
        }

        // First nearest wins on ties, keeping page order decisive
        let nearest = nearby
            .iter()
            .fold(None::<&(f64, &LineSegment)>, |best, candidate| match best {
                Some(b) if b.0 <= candidate.0 => Some(b),
                _ => Some(candidate),
            });
        let dimension_direction = match nearest {
            Some((_, line)) => line.angle,
            None => span.rotation,
        };

        let element = DimensionElement {
            text: span.text.trim().to_string(),
            position,
            rotation: span.rotation,
            font_size: span.font_size,
            bbox,
            nearby_lines: nearby.into_iter().map(|(_, line)| line.clone()).collect(),
            shelf_lines,
            dimension_direction,
            is_angular: Self::is_angular_text(&span.text),
            is_horizontal_text: self.is_horizontal_text(span.rotation),
        };

        debug!(
            "Dimension {:?} at ({:.1}, {:.1}): direction={:.1} nearby={} shelf={} angular={} horizontal={}",
            element.text,
            position.x,
            position.y,
            element.dimension_direction,
            element.nearby_lines.len(),
            element.shelf_lines.len(),
            element.is_angular,
            element.is_horizontal_text
        );

        Some(element)
    }

    pub fn analyze_spans(
        &self,
        spans: &[&TextSpan],
        segments: &ClassifiedSegments,
    ) -> Vec<DimensionElement> {
        spans
            .iter()
            .filter_map(|span| self.dimension_element(span, segments))
            .collect()
    }

    /// Dimension elements for every positioned span of the page
    pub fn analyze(&self, page: &PageModel) -> (Vec<DimensionElement>, ClassifiedSegments) {
        let segments = self.classify_segments(&page.segments);
        let spans: Vec<&TextSpan> = page.spans.iter().collect();
        let dimensions = self.analyze_spans(&spans, &segments);
        (dimensions, segments)
    }
}
