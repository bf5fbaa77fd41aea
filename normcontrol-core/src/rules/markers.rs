use super::{join_sorted, AuditRule, PageContext};
use crate::types::*;
use anyhow::Result;

const RULE_TEXT: &str = "Footnote asterisks on the drawing must match notes in the technical requirements";

/// Footnote-marker tiers of the drawing field vs. the technical requirements
pub struct FootnoteMarkersRule;

impl AuditRule for FootnoteMarkersRule {
    fn id(&self) -> &str {
        RULE_FOOTNOTE_MARKERS
    }

    fn name(&self) -> &str {
        "FootnoteMarkers"
    }

    fn check(&self, ctx: &PageContext) -> Result<Vec<Violation>> {
        let page = ctx.page_number();
        let drawing = &ctx.analysis.drawing_field;
        let tech_present = ctx.baseline.is_present();
        let mut violations = Vec::new();

        for tier in MarkerTier::ALL {
            let tech_count = ctx.baseline.elements.marker_run_count(tier);

            match drawing.marker_tokens(tier) {
                Some(tokens) if !tech_present || tech_count == 0 => {
                    let reason = if tech_present {
                        "no matching note in the technical requirements"
                    } else {
                        "the document has no technical requirements"
                    };
                    violations.push(
                        Violation::new(RULE_FOOTNOTE_MARKERS, RULE_TEXT, Severity::Medium)
                            .description(format!(
                                "{} used on the drawing ({}) but {}",
                                capitalize(tier.label()),
                                join_sorted(tokens),
                                reason
                            ))
                            .location(ctx.location(Zone::DrawingField))
                            .recommendation(format!(
                                "Add a note marked {} to the technical requirements",
                                tier.stars()
                            ))
                            .on_page(page),
                    );
                }
                None if tech_present && tech_count > 0 => {
                    violations.push(
                        Violation::new(RULE_FOOTNOTE_MARKERS, RULE_TEXT, Severity::Medium)
                            .description(format!(
                                "{} appears in the technical requirements but nothing on the drawing refers to it",
                                capitalize(tier.label())
                            ))
                            .location(ctx.location(Zone::TechRequirements))
                            .recommendation(format!(
                                "Mark the dimension the note refers to with {} or remove the note",
                                tier.stars()
                            ))
                            .on_page(page),
                    );
                }
                _ => {}
            }
        }

        Ok(violations)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
