use super::{join_sorted, AuditRule, PageContext};
use crate::types::*;
use anyhow::Result;
use std::collections::BTreeSet;

const RULE_TEXT: &str = "Letter designations on the drawing must be explained in the technical requirements";

/// Standalone letters of the drawing field vs. the technical requirements
pub struct LetterConsistencyRule;

impl AuditRule for LetterConsistencyRule {
    fn id(&self) -> &str {
        RULE_LETTERS
    }

    fn name(&self) -> &str {
        "LetterConsistency"
    }

    fn check(&self, ctx: &PageContext) -> Result<Vec<Violation>> {
        let page = ctx.page_number();
        let drawing: &BTreeSet<char> = &ctx.analysis.drawing_field.letters;
        let tech: &BTreeSet<char> = &ctx.baseline.elements.letters;
        let mut violations = Vec::new();

        if drawing.is_empty() && tech.is_empty() {
            return Ok(violations);
        }

        if !ctx.baseline.is_present() {
            violations.push(
                Violation::new(RULE_LETTERS, RULE_TEXT, Severity::Medium)
                    .description(format!(
                        "Letters {} are used on the drawing but the document has no technical requirements",
                        join_sorted(drawing)
                    ))
                    .location(ctx.location(Zone::DrawingField))
                    .recommendation("Add technical requirements explaining every letter designation")
                    .on_page(page),
            );
            return Ok(violations);
        }

        let unexplained: Vec<&char> = drawing.difference(tech).collect();
        if !unexplained.is_empty() {
            violations.push(
                Violation::new(RULE_LETTERS, RULE_TEXT, Severity::Medium)
                    .description(format!(
                        "Letters on the drawing not explained in the technical requirements: {}",
                        join_sorted(&unexplained)
                    ))
                    .location(ctx.location(Zone::DrawingField))
                    .recommendation(format!(
                        "Explain {} in the technical requirements or remove the designation",
                        join_sorted(&unexplained)
                    ))
                    .on_page(page),
            );
        }

        let unused: Vec<&char> = tech.difference(drawing).collect();
        if !unused.is_empty() {
            violations.push(
                Violation::new(RULE_LETTERS, RULE_TEXT, Severity::Medium)
                    .description(format!(
                        "Letters in the technical requirements not used on the drawing: {}",
                        join_sorted(&unused)
                    ))
                    .location(ctx.location(Zone::TechRequirements))
                    .recommendation(format!(
                        "Show {} on the drawing or remove it from the technical requirements",
                        join_sorted(&unused)
                    ))
                    .on_page(page),
            );
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::Fixture;

    fn fixture(drawing: &str, tech: &str, tech_text: &str) -> Fixture {
        let mut fixture = Fixture::new().with_tech_text(tech_text);
        fixture.analysis.drawing_field.letters = drawing.chars().collect();
        fixture.baseline.elements.letters = tech.chars().collect();
        fixture
    }

    #[test]
    fn test_unexplained_letter_named() {
        let f = fixture("AB", "A", "1. Размер A для справок");
        let violations = LetterConsistencyRule.check(&f.context()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Medium);
        assert!(violations[0].description.ends_with(": B"));
    }

    #[test]
    fn test_unused_tech_letter() {
        let f = fixture("А", "АВ", "1. Поверхность А, В");
        let violations = LetterConsistencyRule.check(&f.context()).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].description.contains("not used on the drawing: В"));
    }

    #[test]
    fn test_no_tech_requirements() {
        let f = fixture("АБ", "", "  ");
        let violations = LetterConsistencyRule.check(&f.context()).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].description.contains("А, Б"));
    }

    #[test]
    fn test_consistent_and_empty() {
        assert!(LetterConsistencyRule
            .check(&fixture("АБ", "БА", "text").context())
            .unwrap()
            .is_empty());
        assert!(LetterConsistencyRule
            .check(&fixture("", "", "").context())
            .unwrap()
            .is_empty());
    }
}
