//! Pure document operations over stroke-indexed SVG artifacts.
//!
//! Every operation takes artifact text and returns new artifact text. None of them fail
//! outward: input that does not parse is logged and handed back unchanged (the counter
//! reports 0).

mod color;
mod composite;
mod count;
mod range;
mod transform;

pub use color::{STROKE_CLASS_PREFIX, force_stroke_color, stroke_class};
pub use composite::{AlphaParams, composite, composite_alpha};
pub use count::count_visible_strokes;
pub use range::{clamp_bounds, select_range};
pub use transform::{TransformParams, apply_transform};

use crate::svg::{Artifact, SvgDocument};

/// Parse `doc`, let `f` edit it, and serialize the result.
fn edit(op: &'static str, doc: &Artifact, f: impl FnOnce(&mut SvgDocument)) -> Artifact {
    match SvgDocument::parse(doc.as_str()) {
        Ok(mut parsed) => {
            f(&mut parsed);
            Artifact::from(parsed.to_svg_string())
        }
        Err(e) => degraded(op, doc, &e),
    }
}

fn degraded(op: &'static str, input: &Artifact, err: &dyn std::fmt::Display) -> Artifact {
    tracing::warn!(op, error = %err, "operation skipped; returning input unchanged");
    input.clone()
}
