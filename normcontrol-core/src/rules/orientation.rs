use super::{AuditRule, PageContext};
use crate::analysis::geometry::in_axis_zone;
use crate::types::*;
use anyhow::Result;

const LINEAR_RULE_TEXT: &str =
    "Dimension numbers on lines inside the 30° zone must be written horizontally";
const ANGULAR_RULE_TEXT: &str =
    "Angular dimensions on lines inside the 30° zone must be written horizontally";

/// Linear dimensions whose leader runs near an axis but whose text is rotated
pub struct DimensionOrientationRule;

/// Same check for the angular subset
pub struct AngularDimensionOrientationRule;

impl AuditRule for DimensionOrientationRule {
    fn id(&self) -> &str {
        RULE_DIMENSION_ORIENTATION
    }

    fn name(&self) -> &str {
        "DimensionOrientation"
    }

    fn check(&self, ctx: &PageContext) -> Result<Vec<Violation>> {
        Ok(misoriented(ctx, false, RULE_DIMENSION_ORIENTATION, LINEAR_RULE_TEXT))
    }
}

impl AuditRule for AngularDimensionOrientationRule {
    fn id(&self) -> &str {
        RULE_ANGULAR_ORIENTATION
    }

    fn name(&self) -> &str {
        "AngularDimensionOrientation"
    }

    fn check(&self, ctx: &PageContext) -> Result<Vec<Violation>> {
        Ok(misoriented(ctx, true, RULE_ANGULAR_ORIENTATION, ANGULAR_RULE_TEXT))
    }
}

fn misoriented(ctx: &PageContext, angular: bool, rule_id: &str, rule_text: &str) -> Vec<Violation> {
    let band = ctx.config.geometry.zone_band;
    let kind = if angular { "Angular dimension" } else { "Dimension" };

    ctx.analysis
        .dimensions
        .iter()
        .filter(|d| d.is_angular == angular)
        .filter(|d| in_axis_zone(d.dimension_direction, band) && !d.is_horizontal_text)
        .map(|d| {
            Violation::new(rule_id, rule_text, Severity::Medium)
                .description(format!(
                    "{} '{}' sits on a line at {:.1}° (within {:.0}° of an axis) but its text is rotated {:.1}°",
                    kind, d.text, d.dimension_direction, band, d.rotation
                ))
                .location(format!(
                    "Page {}, drawing field at ({:.0}, {:.0})",
                    ctx.page_number(),
                    d.position.x,
                    d.position.y
                ))
                .recommendation("Write the dimension number horizontally")
                .on_page(ctx.page_number())
                .quote(d.text.as_str())
        })
        .collect()
}
