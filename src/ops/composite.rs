use super::color::drop_repeated_rules;
use crate::foundation::math::{clamp_unit, format_number};
use crate::svg::dom::{Element, Node};
use crate::svg::{Artifact, SvgDocument};

/// Opacities and paint order for [`composite_alpha`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaParams {
    pub alpha_a: f64,
    pub alpha_b: f64,
    /// Paint B first, so A lands on top.
    pub swap: bool,
}

impl Default for AlphaParams {
    fn default() -> Self {
        Self {
            alpha_a: 1.0,
            alpha_b: 1.0,
            swap: false,
        }
    }
}

/// Append deep clones of `b`'s root children after `a`'s. Identical inputs return `a`.
pub fn composite(a: &Artifact, b: &Artifact) -> Artifact {
    if a.same(b) {
        return a.clone();
    }
    let mut extra = match SvgDocument::parse(b.as_str()) {
        Ok(doc) => doc.root.children,
        Err(e) => return super::degraded("composite", a, &e),
    };
    super::edit("composite", a, |parsed| {
        drop_repeated_rules(&parsed.root, &mut extra);
        parsed.root.children.extend(extra);
    })
}

/// Place `a` and `b` in separate opacity groups under `a`'s root.
///
/// Alphas are clamped into `[0, 1]` (NaN becomes 0). B paints over A unless `swap` is set.
pub fn composite_alpha(a: &Artifact, b: &Artifact, params: AlphaParams) -> Artifact {
    let mut b_children = match SvgDocument::parse(b.as_str()) {
        Ok(doc) => doc.root.children,
        Err(e) => return super::degraded("composite_alpha", a, &e),
    };
    super::edit("composite_alpha", a, |parsed| {
        let root = &mut parsed.root;
        drop_repeated_rules(root, &mut b_children);
        let group_a = opacity_group(params.alpha_a, std::mem::take(&mut root.children));
        let group_b = opacity_group(params.alpha_b, b_children);
        if params.swap {
            root.push(group_b);
            root.push(group_a);
        } else {
            root.push(group_a);
            root.push(group_b);
        }
    })
}

fn opacity_group(alpha: f64, children: Vec<Node>) -> Element {
    let mut group = Element::new("g").with_attr("opacity", format_number(clamp_unit(alpha)));
    group.children = children;
    group
}

#[cfg(test)]
#[path = "../../tests/unit/ops/composite.rs"]
mod tests;
