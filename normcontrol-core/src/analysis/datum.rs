use super::geometry::distance_to_line;
use crate::config::DatumConfig;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Occurrences of one candidate letter on a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatumTally {
    pub occurrences: usize,
    /// Occurrences framed by at least one graphic element
    pub confirmed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatumReport {
    pub letters: BTreeMap<char, DatumTally>,
}

impl DatumReport {
    /// Confirmed datum letters with fewer than `min_instances` confirmations.
    /// Letters never confirmed are not datums and are left out.
    pub fn unpaired(&self, min_instances: usize) -> Vec<(char, usize)> {
        self.letters
            .iter()
            .filter(|(_, tally)| tally.confirmed > 0 && tally.confirmed < min_instances)
            .map(|(letter, tally)| (*letter, tally.confirmed))
            .collect()
    }
}

/// Confirms datum designators by the line work drawn around them
pub struct DatumMatcher {
    config: DatumConfig,
}

impl DatumMatcher {
    pub fn new(config: &DatumConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Graphic elements within the search radius of `point`
    pub fn count_nearby_graphics(&self, point: &Point, segments: &[VectorSegment]) -> usize {
        let radius = self.config.search_radius;
        segments
            .iter()
            .filter(|segment| match segment {
                VectorSegment::Line { start, end } => {
                    start.distance_to(point) <= radius
                        || end.distance_to(point) <= radius
                        || distance_to_line(start, end, point) <= radius
                }
                VectorSegment::Rectangle { rect } => rect.center().distance_to(point) <= radius,
                VectorSegment::Other => false,
            })
            .count()
    }

    /// Tally every span whose whole text is one of the candidate letters
    pub fn match_letters(
        &self,
        candidates: &BTreeSet<char>,
        spans: &[&TextSpan],
        segments: &[VectorSegment],
    ) -> DatumReport {
        let mut report = DatumReport::default();

        for span in spans {
            let mut chars = span.text.trim().chars();
            let (Some(letter), None) = (chars.next(), chars.next()) else {
                continue;
            };
            if !candidates.contains(&letter) {
                continue;
            }
            let Some(center) = span.center() else { continue };

            let graphics = self.count_nearby_graphics(&center, segments);
            debug!(
                "Letter '{}' at ({:.1}, {:.1}): {} graphic elements nearby",
                letter, center.x, center.y, graphics
            );

            let tally = report.letters.entry(letter).or_default();
            tally.occurrences += 1;
            if graphics > 0 {
                tally.confirmed += 1;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(text: &str, cx: f64, cy: f64) -> TextSpan {
        TextSpan::new(text, BoundingBox::new(cx - 3.0, cy - 4.0, cx + 3.0, cy + 4.0))
    }

    fn candidates(letters: &str) -> BTreeSet<char> {
        letters.chars().collect()
    }

    #[test]
    fn test_single_confirmed_instance_is_unpaired() {
        let matcher = DatumMatcher::new(&DatumConfig::default());
        let a1 = letter("A", 100.0, 100.0);
        let a2 = letter("A", 400.0, 300.0);
        // Short vertical stroke beside the first occurrence only
        let segments = vec![VectorSegment::line(110.0, 95.0, 110.0, 105.0)];

        let report = matcher.match_letters(&candidates("A"), &[&a1, &a2], &segments);
        assert_eq!(report.letters[&'A'], DatumTally { occurrences: 2, confirmed: 1 });
        assert_eq!(report.unpaired(2), vec![('A', 1)]);
    }

    #[test]
    fn test_both_instances_confirmed() {
        let matcher = DatumMatcher::new(&DatumConfig::default());
        let a1 = letter("A", 100.0, 100.0);
        let a2 = letter("A", 400.0, 300.0);
        let segments = vec![
            VectorSegment::line(110.0, 95.0, 110.0, 105.0),
            VectorSegment::rectangle(390.0, 290.0, 410.0, 310.0),
        ];

        let report = matcher.match_letters(&candidates("A"), &[&a1, &a2], &segments);
        assert!(report.unpaired(2).is_empty());
    }

    #[test]
    fn test_unframed_letters_are_not_datums() {
        let matcher = DatumMatcher::new(&DatumConfig::default());
        let b = letter("Б", 100.0, 100.0);
        let report = matcher.match_letters(&candidates("Б"), &[&b], &[]);
        assert_eq!(report.letters[&'Б'].confirmed, 0);
        assert!(report.unpaired(2).is_empty());
    }

    #[test]
    fn test_non_candidate_and_multi_char_spans_ignored() {
        let matcher = DatumMatcher::new(&DatumConfig::default());
        let word = letter("AB", 100.0, 100.0);
        let other = letter("В", 100.0, 100.0);
        let segments = vec![VectorSegment::line(100.0, 90.0, 100.0, 110.0)];
        let report = matcher.match_letters(&candidates("A"), &[&word, &other], &segments);
        assert!(report.letters.is_empty());
    }

    #[test]
    fn test_graphic_counting() {
        let matcher = DatumMatcher::new(&DatumConfig::default());
        let point = Point::new(0.0, 0.0);
        let segments = vec![
            // Endpoint within radius
            VectorSegment::line(15.0, 0.0, 200.0, 300.0),
            // Far rectangle
            VectorSegment::rectangle(100.0, 100.0, 120.0, 120.0),
            // Near rectangle
            VectorSegment::rectangle(-5.0, -5.0, 5.0, 5.0),
            VectorSegment::Other,
        ];
        assert_eq!(matcher.count_nearby_graphics(&point, &segments), 2);
    }
}
