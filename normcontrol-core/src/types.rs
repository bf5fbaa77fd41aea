use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ===== PAGE MODEL =====
// Input contract. Produced once per page by the external extraction
// collaborator and never mutated by the audit pipeline.

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Axis-aligned box in page units, origin top-left, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// A box is degenerate when a coordinate is not finite, the corners are
    /// inverted, or it has collapsed to a single point.
    pub fn is_degenerate(&self) -> bool {
        let coords = [self.x0, self.y0, self.x1, self.y1];
        if coords.iter().any(|c| !c.is_finite()) {
            return true;
        }
        if self.x1 < self.x0 || self.y1 < self.y0 {
            return true;
        }
        self.width() == 0.0 && self.height() == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// Missing when the extractor could not position the run
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    /// Rotation in degrees, counter-clockwise
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub font_size: f64,
}

impl TextSpan {
    pub fn new(text: &str, bbox: BoundingBox) -> Self {
        Self {
            text: text.to_string(),
            bbox: Some(bbox),
            rotation: 0.0,
            font_size: 10.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Bounding box, if present and well formed
    pub fn valid_bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref().filter(|b| !b.is_degenerate())
    }

    pub fn center(&self) -> Option<Point> {
        self.valid_bbox().map(|b| b.center())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorSegment {
    Line { start: Point, end: Point },
    Rectangle { rect: BoundingBox },
    Other,
}

impl VectorSegment {
    pub fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        VectorSegment::Line {
            start: Point::new(x0, y0),
            end: Point::new(x1, y1),
        }
    }

    pub fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        VectorSegment::Rectangle {
            rect: BoundingBox::new(x0, y0, x1, y1),
        }
    }

    /// Length of a line segment; None for rectangles and other paths
    pub fn length(&self) -> Option<f64> {
        match self {
            VectorSegment::Line { start, end } => Some(start.distance_to(end)),
            _ => None,
        }
    }

    /// Direction of a line segment in degrees within [0, 180]
    pub fn angle(&self) -> Option<f64> {
        match self {
            VectorSegment::Line { start, end } => Some(line_angle(start, end)),
            _ => None,
        }
    }
}

/// Undirected line angle folded into [0, 180]; a vertical line is exactly 90.
pub fn line_angle(start: &Point, end: &Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx == 0.0 {
        return 90.0;
    }
    let angle = dy.atan2(dx).to_degrees();
    if angle >= 0.0 {
        angle
    } else {
        angle + 180.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageModel {
    /// Page number (1-indexed)
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub spans: Vec<TextSpan>,
    #[serde(default)]
    pub segments: Vec<VectorSegment>,
}

impl PageModel {
    pub fn new(page_number: u32, width: f64, height: f64) -> Self {
        Self {
            page_number,
            width,
            height,
            spans: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Explicit stand-in for a page the extractor could not read
    pub fn empty(page_number: u32) -> Self {
        Self::new(page_number, 0.0, 0.0)
    }

    pub fn has_content(&self) -> bool {
        self.spans.iter().any(|s| !s.text.trim().is_empty()) || !self.segments.is_empty()
    }
}

// ===== ZONES =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    TitleBlock,
    DrawingField,
    TechRequirements,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::TitleBlock => "title block",
            Zone::DrawingField => "drawing field",
            Zone::TechRequirements => "technical requirements",
        };
        write!(f, "{name}")
    }
}

// ===== EXTRACTED ELEMENTS =====

/// Footnote-marker arity: `*`, `**` or `***`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerTier {
    Single,
    Double,
    Triple,
}

impl MarkerTier {
    pub const ALL: [MarkerTier; 3] = [MarkerTier::Single, MarkerTier::Double, MarkerTier::Triple];

    /// Tier for a run of `len` asterisks. Runs longer than three fold into Triple.
    pub fn from_run_length(len: usize) -> Option<Self> {
        match len {
            0 => None,
            1 => Some(MarkerTier::Single),
            2 => Some(MarkerTier::Double),
            _ => Some(MarkerTier::Triple),
        }
    }

    pub fn stars(&self) -> &'static str {
        match self {
            MarkerTier::Single => "*",
            MarkerTier::Double => "**",
            MarkerTier::Triple => "***",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarkerTier::Single => "single asterisk (*)",
            MarkerTier::Double => "double asterisk (**)",
            MarkerTier::Triple => "triple asterisk (***)",
        }
    }
}

/// Domain tokens pulled from one text source (a zone of one page, or the
/// document-wide technical requirements).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedElements {
    pub codes: BTreeSet<String>,
    pub letters: BTreeSet<char>,
    /// Marker tokens such as `5*` or `**12`, grouped by tier
    pub markers: BTreeMap<MarkerTier, BTreeSet<String>>,
    /// Bare asterisk runs of exact length, counted per tier
    pub marker_runs: BTreeMap<MarkerTier, usize>,
    pub dimensions: BTreeSet<String>,
    /// Tolerance glyph -> base letters written right after it
    pub tolerances: BTreeMap<String, BTreeSet<String>>,
    pub roughness: BTreeSet<String>,
}

impl ExtractedElements {
    pub fn marker_tokens(&self, tier: MarkerTier) -> Option<&BTreeSet<String>> {
        self.markers.get(&tier).filter(|tokens| !tokens.is_empty())
    }

    pub fn marker_run_count(&self, tier: MarkerTier) -> usize {
        self.marker_runs.get(&tier).copied().unwrap_or(0)
    }
}

/// Document-wide technical requirements, authored once (first page) and
/// used as the comparison baseline for every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechRequirements {
    pub text: String,
    pub elements: ExtractedElements,
}

impl TechRequirements {
    pub fn is_present(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

// ===== GEOMETRY =====

/// A line segment with its derived measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
    pub length: f64,
    pub angle: f64,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            length: start.distance_to(&end),
            angle: line_angle(&start, &end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionElement {
    pub text: String,
    pub position: Point,
    pub rotation: f64,
    pub font_size: f64,
    pub bbox: BoundingBox,
    pub nearby_lines: Vec<LineSegment>,
    /// Near-horizontal lines close enough to carry the number as a leader shelf
    pub shelf_lines: Vec<LineSegment>,
    pub dimension_direction: f64,
    pub is_angular: bool,
    pub is_horizontal_text: bool,
}

// ===== VIOLATIONS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub rule_text: String,
    pub description: String,
    pub location: String,
    pub severity: Severity,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

impl Violation {
    pub fn new(rule_id: &str, rule_text: &str, severity: Severity) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            rule_text: rule_text.to_string(),
            description: String::new(),
            location: String::new(),
            severity,
            recommendation: String::new(),
            page: None,
            quote: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn on_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = Some(quote.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub total_violations: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
}

/// Output contract consumed by the reporting and storage collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub violations: Vec<Violation>,
    pub statistics: ReportStatistics,
    pub is_compliant: bool,
}

impl ViolationReport {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let count = |severity: Severity| violations.iter().filter(|v| v.severity == severity).count();
        let statistics = ReportStatistics {
            total_violations: violations.len(),
            high_severity: count(Severity::High),
            medium_severity: count(Severity::Medium),
            low_severity: count(Severity::Low),
        };
        let is_compliant = statistics.high_severity == 0 && statistics.medium_severity == 0;

        Self {
            violations,
            statistics,
            is_compliant,
        }
    }

    /// Report for a document the extractor produced nothing for
    pub fn no_data(reason: Option<&str>) -> Self {
        let mut violation = Violation::new(
            RULE_NO_DATA,
            "Document contains no analyzable data",
            Severity::High,
        )
        .description("No page content could be extracted from the document")
        .location("Entire document")
        .recommendation("Check that the file is a vector drawing and re-run the extraction");
        if let Some(reason) = reason {
            violation = violation.quote(reason);
        }
        Self::from_violations(vec![violation])
    }
}

// Rule identifiers follow the clause numbering of the checklist
pub const RULE_TITLE_BLOCK: &str = "1.1.1";
pub const RULE_LETTERS: &str = "1.1.3";
pub const RULE_FOOTNOTE_MARKERS: &str = "1.1.4";
pub const RULE_DIMENSION_ORIENTATION: &str = "1.1.5";
pub const RULE_ANGULAR_ORIENTATION: &str = "1.1.6";
pub const RULE_DATUM_PAIRING: &str = "1.1.8";
pub const RULE_ROUGHNESS_BRACKETS: &str = "1.1.9";
pub const RULE_NO_DATA: &str = "no_data";
pub const RULE_ENGINE_ERROR: &str = "engine_error";
