use std::collections::BTreeMap;

use crate::foundation::error::KakijunResult;
use crate::foundation::math::format_number;
use crate::svg::stroke::{
    ATTR_IGNORE, ATTR_STROKE, carrier_index, hide, is_decoration_id, is_drawable, is_hidden,
    is_non_painted,
};
use crate::svg::{Artifact, Element, SvgDocument};

/// View window used when a source declares none (KanjiVG glyph box).
pub const DEFAULT_VIEW_BOX: &str = "0 0 109 109";

/// Properties copied from discarded ancestors onto baked leaves.
const INHERITED_PROPS: [&str; 13] = [
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-opacity",
    "visibility",
    "color",
];

/// Normalized, stroke-indexed glyph document.
#[derive(Clone, Debug, PartialEq)]
pub struct BakedGlyph {
    /// One `<g data-stroke="N">` per used index, ascending.
    pub svg: Artifact,
    /// Highest observed stroke index (0 when the source has no carriers).
    pub count: u32,
}

impl BakedGlyph {
    /// Range selection needs at least one stroke.
    pub fn has_strokes(&self) -> bool {
        self.count > 0
    }
}

/// Consolidate a raw glyph source into one group per stroke index.
pub fn bake(raw: &str) -> KakijunResult<BakedGlyph> {
    let doc = SvgDocument::parse(raw)?;
    let mut src = doc.root;
    strip_decoration(&mut src);

    let mut buckets: BTreeMap<u32, Vec<Element>> = BTreeMap::new();
    let owner = carrier_index(&src);
    let inherited = Inherited::default();
    for child in src.child_elements() {
        collect_strokes(child, owner, &inherited, &mut buckets);
    }

    let max = buckets.keys().next_back().copied().unwrap_or(0);
    let count = if max > 0 { max } else { buckets.len() as u32 };

    let mut root = src.shallow_clone();
    for child in src.child_elements() {
        if matches!(child.local_name(), "style" | "defs") {
            root.push(child.clone());
        }
    }
    for (index, leaves) in buckets {
        let mut group = Element::new("g").with_attr(ATTR_STROKE, index.to_string());
        group.children.extend(leaves.into_iter().map(crate::svg::Node::Element));
        root.push(group);
    }
    normalize_root(&mut root);

    tracing::debug!(count, "baked glyph");
    Ok(BakedGlyph {
        svg: Artifact::from(SvgDocument { root }.to_svg_string()),
        count,
    })
}

/// Tag every drawable leaf with its owning stroke instead of regrouping.
///
/// Leaves without an owning carrier become `data-ignore="1"`, and are hidden when
/// `hide_decoration` is set.
pub fn annotate(raw: &str, hide_decoration: bool) -> KakijunResult<Artifact> {
    let mut doc = SvgDocument::parse(raw)?;
    strip_decoration(&mut doc.root);
    let owner = carrier_index(&doc.root);
    for child in doc.root.child_elements_mut() {
        tag_leaves(child, owner, hide_decoration);
    }
    normalize_root(&mut doc.root);
    Ok(Artifact::from(doc.to_svg_string()))
}

fn strip_decoration(root: &mut Element) {
    root.retain_descendants(&|e: &Element| e.attr("id").is_some_and(is_decoration_id));
}

fn normalize_root(root: &mut Element) {
    root.set_attr("width", "100%");
    root.set_attr("height", "100%");
    if !root.has_attr("viewBox") {
        root.set_attr("viewBox", DEFAULT_VIEW_BOX);
    }
    root.set_attr("preserveAspectRatio", "xMidYMid meet");
    root.visit_mut(&mut |e| {
        if is_drawable(e) {
            e.set_attr("vector-effect", "non-scaling-stroke");
        }
    });
}

fn tag_leaves(el: &mut Element, owner: Option<u32>, hide_decoration: bool) {
    if is_non_painted(el) {
        return;
    }
    let owner = carrier_index(el).or(owner);
    if is_drawable(el) {
        match owner {
            Some(index) => {
                el.set_attr(ATTR_STROKE, index.to_string());
                el.remove_attr(ATTR_IGNORE);
            }
            None => {
                el.set_attr(ATTR_IGNORE, "1");
                if hide_decoration {
                    hide(el);
                }
            }
        }
        return;
    }
    for child in el.child_elements_mut() {
        tag_leaves(child, owner, hide_decoration);
    }
}

fn collect_strokes(
    el: &Element,
    owner: Option<u32>,
    inherited: &Inherited,
    buckets: &mut BTreeMap<u32, Vec<Element>>,
) {
    if is_non_painted(el) {
        return;
    }
    let owner = carrier_index(el).or(owner);
    if is_drawable(el) {
        if let Some(index) = owner {
            buckets
                .entry(index)
                .or_default()
                .push(inherited.apply_to(el));
        }
        return;
    }
    let next = inherited.descend(el);
    for child in el.child_elements() {
        collect_strokes(child, owner, &next, buckets);
    }
}

/// Presentation state accumulated from the containers a leaf is lifted out of.
#[derive(Clone, Debug)]
struct Inherited {
    transforms: Vec<String>,
    opacity: f64,
    props: Vec<(String, String)>,
    hidden: bool,
}

impl Default for Inherited {
    fn default() -> Self {
        Self {
            transforms: Vec::new(),
            opacity: 1.0,
            props: Vec::new(),
            hidden: false,
        }
    }
}

impl Inherited {
    fn descend(&self, el: &Element) -> Self {
        let mut next = self.clone();
        if let Some(t) = el.attr("transform") {
            next.transforms.push(t.to_string());
        }
        if let Some(o) = el.attr("opacity").and_then(|v| v.trim().parse::<f64>().ok()) {
            next.opacity *= o.clamp(0.0, 1.0);
        }
        for name in INHERITED_PROPS {
            if let Some(v) = el.attr(name) {
                next.set_prop(name, v);
            }
        }
        // Inline declarations beat the same element's presentation attributes.
        if let Some(style) = el.attr("style") {
            for decl in style.split(';') {
                if let Some((k, v)) = decl.split_once(':') {
                    let k = k.trim().to_ascii_lowercase();
                    if INHERITED_PROPS.contains(&k.as_str()) {
                        next.set_prop(&k, v.trim());
                    }
                }
            }
        }
        next.hidden |= is_hidden(el);
        next
    }

    fn set_prop(&mut self, name: &str, value: &str) {
        match self.props.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.props.push((name.to_string(), value.to_string())),
        }
    }

    fn apply_to(&self, leaf: &Element) -> Element {
        let mut out = leaf.clone();
        if !self.transforms.is_empty() {
            let mut chain = self.transforms.join(" ");
            if let Some(own) = leaf.attr("transform") {
                chain.push(' ');
                chain.push_str(own);
            }
            out.set_attr("transform", chain);
        }
        if self.opacity < 1.0 {
            let own = leaf
                .attr("opacity")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
            out.set_attr("opacity", format_number(self.opacity * own));
        }
        let own_style = leaf.attr("style").unwrap_or("").to_ascii_lowercase();
        for (k, v) in &self.props {
            let declared_inline = own_style
                .split(';')
                .any(|d| d.split_once(':').is_some_and(|(dk, _)| dk.trim() == k));
            if !out.has_attr(k) && !declared_inline {
                out.set_attr(k, v.clone());
            }
        }
        if self.hidden {
            hide(&mut out);
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/bake.rs"]
mod tests;
