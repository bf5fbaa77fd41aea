use super::{AuditRule, PageContext};
use crate::types::*;
use anyhow::Result;

const RULE_TEXT: &str = "Every datum letter must appear at its feature and at the tolerance frame";

/// Confirmed datum letters that lack their second occurrence
pub struct DatumPairingRule;

impl AuditRule for DatumPairingRule {
    fn id(&self) -> &str {
        RULE_DATUM_PAIRING
    }

    fn name(&self) -> &str {
        "DatumPairing"
    }

    fn check(&self, ctx: &PageContext) -> Result<Vec<Violation>> {
        let required = ctx.config.datum.min_instances;
        let violations = ctx
            .analysis
            .datum
            .unpaired(required)
            .into_iter()
            .map(|(letter, confirmed)| {
                Violation::new(RULE_DATUM_PAIRING, RULE_TEXT, Severity::Medium)
                    .description(format!(
                        "Datum '{letter}' is marked {confirmed} time(s) but needs at least {required}"
                    ))
                    .location(ctx.location(Zone::DrawingField))
                    .recommendation(format!(
                        "Reference datum '{letter}' in a tolerance frame or mark its feature"
                    ))
                    .on_page(ctx.page_number())
                    .quote(letter.to_string())
            })
            .collect();
        Ok(violations)
    }
}
