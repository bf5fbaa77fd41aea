use crate::classifier::ZonedPage;
use crate::error::{compile, AuditResult};
use crate::types::*;
use regex::Regex;
use tracing::{debug, info};

/// Zone text shorter than this is treated as missing
const MIN_SECTION_CHARS: usize = 10;

const START_KEYWORDS: [&str; 7] = [
    "размеры",
    "обработать",
    "поверхность",
    "допуск",
    "шероховатость",
    "технические",
    "требования",
];

const CONTENT_KEYWORDS: [&str; 11] = [
    "размер",
    "обработ",
    "поверхност",
    "допуск",
    "шероховатость",
    "покрытие",
    "защит",
    "качество",
    "точность",
    "сборк",
    "свар",
];

const END_KEYWORDS: [&str; 5] = ["примечания", "литература", "таблица", "рисунок", "---"];

/// Finds the technical-requirements note block of a page: the
/// TechRequirements zone first, the page text by content as a fallback.
pub struct TechRequirementsLocator {
    fallback: bool,
    numbered_item: Regex,
    tight_numbered_item: Regex,
}

impl TechRequirementsLocator {
    pub fn new(fallback: bool) -> AuditResult<Self> {
        Ok(Self {
            fallback,
            numbered_item: compile(r"^\d+\s*[.*)]\s")?,
            tight_numbered_item: compile(r"^\d+[.*)]\s")?,
        })
    }

    pub fn locate(&self, page: &PageModel, zoned: &ZonedPage) -> String {
        let zone_text = zoned.tech_requirements_text();
        if zone_text.trim().chars().count() >= MIN_SECTION_CHARS || !self.fallback {
            return zone_text;
        }

        debug!(
            "Page {}: tech-requirements zone holds {} chars, searching page text by content",
            page.page_number,
            zone_text.trim().chars().count()
        );
        match self.find_by_content(&page_lines(page)) {
            Some(found) => {
                info!(
                    "Page {}: tech requirements located by content ({} lines)",
                    page.page_number,
                    found.lines().count()
                );
                found
            }
            None => zone_text,
        }
    }

    /// Scan lines top to bottom for a block that reads like technical
    /// requirements. Returns None when nothing convincing is found.
    pub fn find_by_content(&self, lines: &[String]) -> Option<String> {
        let mut section: Vec<&str> = Vec::new();
        let mut in_section = false;

        for line in lines {
            let clean = line.trim();
            if clean.is_empty() {
                continue;
            }
            let lower = clean.to_lowercase();
            let has_content = contains_any(&lower, &CONTENT_KEYWORDS);

            if !in_section {
                let opens = contains_any(&lower, &START_KEYWORDS) || self.numbered_item.is_match(clean);
                if opens && (has_content || self.tight_numbered_item.is_match(clean)) {
                    in_section = true;
                } else {
                    continue;
                }
            }

            if contains_any(&lower, &END_KEYWORDS) {
                break;
            }
            section.push(clean);

            // A short plain line after a few items starts the next block
            if section.len() > 3
                && clean.chars().count() < 20
                && !has_content
                && !self.tight_numbered_item.is_match(clean)
            {
                break;
            }
        }

        let text = section.join("\n");
        let accepted = text.chars().count() > MIN_SECTION_CHARS
            && contains_any(&text.to_lowercase(), &CONTENT_KEYWORDS);
        accepted.then_some(text)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Positioned spans of the page as lines, top to bottom
fn page_lines(page: &PageModel) -> Vec<String> {
    let mut spans: Vec<(f64, &TextSpan)> = page
        .spans
        .iter()
        .filter_map(|s| s.center().map(|c| (c.y, s)))
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));
    spans.into_iter().map(|(_, s)| s.text.clone()).collect()
}
