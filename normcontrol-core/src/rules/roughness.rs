use super::{join_sorted, AuditRule, PageContext};
use crate::types::*;
use anyhow::Result;

const RULE_TEXT: &str = "A roughness note repeated in the technical requirements must carry the bracketed √ mark";

/// Roughness on both the drawing and in the notes needs `(√)` in the notes
pub struct RoughnessBracketsRule;

impl AuditRule for RoughnessBracketsRule {
    fn id(&self) -> &str {
        RULE_ROUGHNESS_BRACKETS
    }

    fn name(&self) -> &str {
        "RoughnessBrackets"
    }

    fn check(&self, ctx: &PageContext) -> Result<Vec<Violation>> {
        let drawing = &ctx.analysis.drawing_field.roughness;
        let tech = &ctx.baseline.elements.roughness;
        if drawing.is_empty() || tech.is_empty() {
            return Ok(Vec::new());
        }

        // Brackets may sit on different lines of the note block
        let text = &ctx.baseline.text;
        if text.contains('(') && text.contains(')') {
            return Ok(Vec::new());
        }

        Ok(vec![Violation::new(RULE_ROUGHNESS_BRACKETS, RULE_TEXT, Severity::Medium)
            .description(format!(
                "Roughness is given on the drawing ({}) and in the technical requirements ({}) but the brackets \"(...)\" are missing",
                join_sorted(drawing),
                join_sorted(tech)
            ))
            .location(ctx.location(Zone::TechRequirements))
            .recommendation("Add the bracketed mark to the note, e.g. \"Ra 12,5 (√)\"")
            .on_page(ctx.page_number())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::Fixture;

    fn fixture(drawing: &[&str], tech: &[&str], tech_text: &str) -> Fixture {
        let mut f = Fixture::new().with_tech_text(tech_text);
        f.analysis.drawing_field.roughness = drawing.iter().map(|s| s.to_string()).collect();
        f.baseline.elements.roughness = tech.iter().map(|s| s.to_string()).collect();
        f
    }

    #[test]
    fn test_missing_brackets() {
        let f = fixture(&["Ra 3,2"], &["Ra 12,5"], "Ra 12,5 √");
        let violations = RoughnessBracketsRule.check(&f.context()).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].description.contains("Ra 3,2"));
    }

    #[test]
    fn test_brackets_on_separate_lines() {
        let f = fixture(&["Ra 3,2"], &["Ra 12,5"], "1. Ra 12,5 (\n√)");
        assert!(RoughnessBracketsRule.check(&f.context()).unwrap().is_empty());
    }

    #[test]
    fn test_only_one_side_has_roughness() {
        let f = fixture(&["Ra 3,2"], &[], "Покрытие");
        assert!(RoughnessBracketsRule.check(&f.context()).unwrap().is_empty());
        let f = fixture(&[], &["Ra 12,5"], "Ra 12,5");
        assert!(RoughnessBracketsRule.check(&f.context()).unwrap().is_empty());
    }
}
