use super::{AuditRule, PageContext};
use crate::catalog::type_suffix;
use crate::types::*;
use anyhow::Result;

const RULE_TEXT: &str = "The title block must carry a document code whose type suffix matches the document name";

/// Document code in the title block vs. the catalog name for its type
pub struct TitleBlockRule;

impl AuditRule for TitleBlockRule {
    fn id(&self) -> &str {
        RULE_TITLE_BLOCK
    }

    fn name(&self) -> &str {
        "TitleBlock"
    }

    fn check(&self, ctx: &PageContext) -> Result<Vec<Violation>> {
        let page = ctx.page_number();
        let location = ctx.location(Zone::TitleBlock);
        let codes = &ctx.analysis.title_block.codes;
        let mut violations = Vec::new();

        if codes.is_empty() {
            violations.push(
                Violation::new(RULE_TITLE_BLOCK, RULE_TEXT, Severity::High)
                    .description("No document code found in the title block")
                    .location(location)
                    .recommendation("Add the document designation, e.g. АБВГ.123456.002СБ, to the title block")
                    .on_page(page),
            );
            return Ok(violations);
        }

        let normalized_title = normalize(&ctx.analysis.title_block_text);

        for code in codes {
            let Some(suffix) = type_suffix(code) else {
                violations.push(
                    Violation::new(RULE_TITLE_BLOCK, RULE_TEXT, Severity::High)
                        .description(format!("Document code format unrecognized: {code} has no type suffix"))
                        .location(location.clone())
                        .recommendation("Append the document type code to the designation, e.g. СБ for an assembly drawing")
                        .on_page(page)
                        .quote(code.as_str()),
                );
                continue;
            };

            let Some(name) = ctx.catalog.name_for(&suffix) else {
                violations.push(
                    Violation::new(RULE_TITLE_BLOCK, RULE_TEXT, Severity::High)
                        .description(format!("Document type code '{suffix}' in {code} is not in the catalog"))
                        .location(location.clone())
                        .recommendation("Use a document type code from the drafting standard catalog")
                        .on_page(page)
                        .quote(code.as_str()),
                );
                continue;
            };

            if !normalized_title.contains(&normalize(name)) {
                violations.push(
                    Violation::new(RULE_TITLE_BLOCK, RULE_TEXT, Severity::High)
                        .description(format!(
                            "Code {code} designates '{name}' but the title block does not name the document that way"
                        ))
                        .location(location.clone())
                        .recommendation(format!("Add the document name \"{name}\" to the title block"))
                        .on_page(page)
                        .quote(code.as_str()),
                );
            }
        }

        Ok(violations)
    }
}

/// Lowercase with whitespace runs collapsed
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
