use crate::foundation::math::format_number;
use crate::svg::dom::{Element, Node};
use crate::svg::stroke::is_non_painted;
use crate::svg::Artifact;

/// Translate-then-scale parameters. Non-finite components fall back to the identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformParams {
    pub tx: f64,
    pub ty: f64,
    pub sx: f64,
    pub sy: f64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            tx: 0.0,
            ty: 0.0,
            sx: 1.0,
            sy: 1.0,
        }
    }
}

impl TransformParams {
    pub fn sanitized(self) -> Self {
        let or = |v: f64, d: f64| if v.is_finite() { v } else { d };
        Self {
            tx: or(self.tx, 0.0),
            ty: or(self.ty, 0.0),
            sx: or(self.sx, 1.0),
            sy: or(self.sy, 1.0),
        }
    }

    fn to_attr(self) -> String {
        format!(
            "translate({} {}) scale({} {})",
            format_number(self.tx),
            format_number(self.ty),
            format_number(self.sx),
            format_number(self.sy)
        )
    }
}

/// Wrap the painted root content in one `<g transform="translate(..) scale(..)">`.
///
/// `style`, `defs`, `title`, `desc` and `metadata` stay at root level ahead of the group.
pub fn apply_transform(doc: &Artifact, params: TransformParams) -> Artifact {
    let params = params.sanitized();
    super::edit("apply_transform", doc, |parsed| {
        let root = &mut parsed.root;
        let mut group = Element::new("g").with_attr("transform", params.to_attr());
        for child in std::mem::take(&mut root.children) {
            match child {
                Node::Element(e) if is_non_painted(&e) => root.push(e),
                Node::Text(t) if t.trim().is_empty() => {}
                other => group.children.push(other),
            }
        }
        root.push(group);
    })
}

#[cfg(test)]
#[path = "../../tests/unit/ops/transform.rs"]
mod tests;
