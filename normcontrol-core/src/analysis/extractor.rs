use crate::config::ExtractionConfig;
use crate::error::{compile, AuditResult};
use crate::types::{ExtractedElements, MarkerTier};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

// Type suffix after the version digits: letters (СБ, ВДЭ) or a scheme code (Э3)
const CODE_SUFFIX: &str = r"(?:[A-ZА-ЯЁ]{2,3}|[A-ZА-ЯЁ]\d)";

const MARKER_PATTERN: &str = r"\d+\*+|\*+\d+";

const DIMENSION_TOKEN_PATTERN: &str =
    r"[R⌀Ø]\d+(?:[.,]\d+)?|±?\d+(?:[.,]\d+)?(?:\s*(?i:мм|см|mm|cm|°|град|deg))?";

const ROUGHNESS_PATTERN: &str = r"(?i)(?:шероховатость\s*)?R[az]\s*\d+(?:[.,]\d+)?";

/// Pattern-based extraction of drawing tokens from zone text.
///
/// Every family has its own method so rules can be tested against one
/// family at a time; `extract` runs them all.
pub struct ElementExtractor {
    code_pattern: Regex,
    marker_pattern: Regex,
    dimension_pattern: Regex,
    roughness_pattern: Regex,
    tolerance_patterns: Vec<(String, Regex)>,
    base_separator: Regex,
    stop_letters: BTreeSet<char>,
}

impl ElementExtractor {
    pub fn new(config: &ExtractionConfig) -> AuditResult<Self> {
        let code_pattern = format!(
            r"(?i)[A-ZА-ЯЁ]{{2,4}}(?:[.\-]\d+[.\-]\d+{CODE_SUFFIX}?|\d+\.\d+{CODE_SUFFIX})"
        );

        let separators = format!("(?:{}|–|-)", regex::escape(&config.base_separator));
        let mut tolerance_patterns = Vec::new();
        for symbol in &config.tolerance_symbols {
            let pattern = format!(
                r"{}\s*([A-ZА-ЯЁ]+(?:\s*{separators}\s*[A-ZА-ЯЁ]+)*)",
                regex::escape(symbol)
            );
            tolerance_patterns.push((symbol.clone(), compile(&pattern)?));
        }

        Ok(Self {
            code_pattern: compile(&code_pattern)?,
            marker_pattern: compile(MARKER_PATTERN)?,
            dimension_pattern: compile(DIMENSION_TOKEN_PATTERN)?,
            roughness_pattern: compile(ROUGHNESS_PATTERN)?,
            tolerance_patterns,
            base_separator: compile(&format!(r"\s*{separators}\s*"))?,
            stop_letters: config.stop_letters.iter().copied().collect(),
        })
    }

    pub fn extract(&self, text: &str) -> ExtractedElements {
        ExtractedElements {
            codes: self.extract_codes(text),
            letters: self.extract_letters(text),
            markers: self.extract_markers(text),
            marker_runs: count_marker_runs(text),
            dimensions: self.extract_dimensions(text),
            tolerances: self.extract_tolerances(text),
            roughness: self.extract_roughness(text),
        }
    }

    /// Document designations such as `АБВГ.123456.002СБ`
    pub fn extract_codes(&self, text: &str) -> BTreeSet<String> {
        self.code_pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Single uppercase letters standing on their own.
    ///
    /// Stop letters never qualify, and neither does any letter that touches a
    /// digit somewhere in the text (`R5`, `5Б`): such a letter belongs to a
    /// dimension or position callout, not to a designator.
    pub fn extract_letters(&self, text: &str) -> BTreeSet<char> {
        let chars: Vec<char> = text.chars().collect();

        let mut digit_adjacent = BTreeSet::new();
        for (i, &c) in chars.iter().enumerate() {
            if !is_designator_letter(c) {
                continue;
            }
            let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
            let next_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if prev_digit || next_digit {
                digit_adjacent.insert(c);
            }
        }

        let mut letters = BTreeSet::new();
        for (i, &c) in chars.iter().enumerate() {
            if !is_designator_letter(c) {
                continue;
            }
            let standalone_before = i == 0 || !is_word_char(chars[i - 1]);
            let standalone_after = chars.get(i + 1).map_or(true, |&n| !is_word_char(n));
            if standalone_before
                && standalone_after
                && !self.stop_letters.contains(&c)
                && !digit_adjacent.contains(&c)
            {
                letters.insert(c);
            }
        }
        letters
    }

    /// Footnote tokens like `5*` or `**12`, grouped by asterisk count
    pub fn extract_markers(&self, text: &str) -> BTreeMap<MarkerTier, BTreeSet<String>> {
        let mut markers: BTreeMap<MarkerTier, BTreeSet<String>> = BTreeMap::new();
        for m in self.marker_pattern.find_iter(text) {
            let stars = m.as_str().chars().filter(|&c| c == '*').count();
            if let Some(tier) = MarkerTier::from_run_length(stars) {
                markers.entry(tier).or_default().insert(m.as_str().to_string());
            }
        }
        markers
    }

    pub fn extract_dimensions(&self, text: &str) -> BTreeSet<String> {
        self.dimension_pattern
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string())
            .collect()
    }

    /// Tolerance glyph -> base letters written after it (`⊥ А—Б` gives А and Б)
    pub fn extract_tolerances(&self, text: &str) -> BTreeMap<String, BTreeSet<String>> {
        let mut tolerances: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (symbol, pattern) in &self.tolerance_patterns {
            for caps in pattern.captures_iter(text) {
                let Some(group) = caps.get(1) else { continue };
                let bases = tolerances.entry(symbol.clone()).or_default();
                for base in self.base_separator.split(group.as_str()) {
                    let base = base.trim();
                    if !base.is_empty() {
                        bases.insert(base.to_string());
                    }
                }
            }
        }
        tolerances
    }

    /// `Ra`/`Rz` values, whitespace collapsed
    pub fn extract_roughness(&self, text: &str) -> BTreeSet<String> {
        self.roughness_pattern
            .find_iter(text)
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    }
}

/// Count bare asterisk runs of exactly one, two and three stars
pub fn count_marker_runs(text: &str) -> BTreeMap<MarkerTier, usize> {
    let mut runs = BTreeMap::new();
    let mut current = 0usize;
    for c in text.chars().chain(std::iter::once('\0')) {
        if c == '*' {
            current += 1;
            continue;
        }
        let tier = match current {
            1 => Some(MarkerTier::Single),
            2 => Some(MarkerTier::Double),
            3 => Some(MarkerTier::Triple),
            _ => None,
        };
        if let Some(tier) = tier {
            *runs.entry(tier).or_insert(0) += 1;
        }
        current = 0;
    }
    runs
}

fn is_designator_letter(c: char) -> bool {
    c.is_ascii_uppercase() || ('А'..='Я').contains(&c) || c == 'Ё'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> ElementExtractor {
        ElementExtractor::new(&ExtractionConfig::default()).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_codes() {
        let e = extractor();
        let codes = e.extract_codes("Корпус АБВГ.123456.002СБ лист 1, см. ДЕЖЗ-100-01 и ИКЛМ.1.2Э3");
        assert_eq!(codes, set(&["АБВГ.123456.002СБ", "ДЕЖЗ-100-01", "ИКЛМ.1.2Э3"]));
        assert_eq!(e.extract_codes("абвг.123456.002сб"), set(&["абвг.123456.002сб"]));
        assert_eq!(e.extract_codes("ПРИМ1234.56ВО"), set(&["ПРИМ1234.56ВО"]));
        assert!(e.extract_codes("Масса 12.5 кг").is_empty());
    }

    #[test]
    fn test_standalone_letters() {
        let e = extractor();
        let letters = e.extract_letters("Вид Б, сечение В-В, база Г; ГОСТ А");
        assert_eq!(letters, ['А', 'Б', 'В', 'Г'].into_iter().collect());
    }

    #[test]
    fn test_letters_stop_set_and_digit_adjacency() {
        let e = extractor();
        // Т and Н are stop letters, Latin A too; Д touches a digit in "Д2" so it is dropped everywhere
        let letters = e.extract_letters("Т Н A Д Д2 Е ЕЖ word_Ж");
        assert_eq!(letters, ['Е'].into_iter().collect());
    }

    #[test]
    fn test_markers_by_tier() {
        let e = extractor();
        let markers = e.extract_markers("5* 7* 5* **12 3***");
        assert_eq!(markers.get(&MarkerTier::Single), Some(&set(&["5*", "7*"])));
        assert_eq!(markers.get(&MarkerTier::Double), Some(&set(&["**12"])));
        assert_eq!(markers.get(&MarkerTier::Triple), Some(&set(&["3***"])));
    }

    #[test]
    fn test_marker_runs() {
        let runs = count_marker_runs("* Размер для справок\n** Обработать\n*** ****");
        assert_eq!(runs.get(&MarkerTier::Single), Some(&1));
        assert_eq!(runs.get(&MarkerTier::Double), Some(&1));
        assert_eq!(runs.get(&MarkerTier::Triple), Some(&1));
        assert!(count_marker_runs("no markers").is_empty());
    }

    #[test]
    fn test_dimensions() {
        let e = extractor();
        let dims = e.extract_dimensions("R5 ⌀20 ±0,1 30° 16 мм 45 град");
        assert!(dims.contains("R5"));
        assert!(dims.contains("⌀20"));
        assert!(dims.contains("±0,1"));
        assert!(dims.contains("30°"));
        assert!(dims.contains("16 мм"));
        assert!(dims.contains("45 град"));
    }

    #[test]
    fn test_tolerances_with_bases() {
        let e = extractor();
        let tolerances = e.extract_tolerances("⊥ 0,05 А; ∥ Б—В");
        assert!(!tolerances.contains_key("⊥"));
        assert_eq!(tolerances.get("∥"), Some(&set(&["Б", "В"])));
        let direct = e.extract_tolerances("⊥А");
        assert_eq!(direct.get("⊥"), Some(&set(&["А"])));
    }

    #[test]
    fn test_roughness() {
        let e = extractor();
        let roughness = e.extract_roughness("Шероховатость  Ra 3,2; остальные Rz20 (√)");
        assert_eq!(roughness, set(&["Шероховатость Ra 3,2", "Rz20"]));
    }

    #[test]
    fn test_absence_yields_empty() {
        let elements = extractor().extract("");
        assert_eq!(elements, ExtractedElements::default());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let e = extractor();
        let text = "5* 5* Б Б АБВГ.123456.002СБ Ra 3.2";
        assert_eq!(e.extract(text), e.extract(text));
        assert_eq!(e.extract(text).markers[&MarkerTier::Single].len(), 1);
    }
}
