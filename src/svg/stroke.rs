//! Stroke-index conventions shared by the baker, the annotator and the document operations.
//!
//! - a *carrier* is an element whose `id` ends in `-s<digits>`; the digits are the stroke index
//! - baked and annotated documents tag stroke owners with `data-stroke="<index>"`
//! - leaves that belong to no stroke are tagged `data-ignore="1"`
//! - decoration (stroke numbers, grid, guide lines) is recognised by its `id` prefix

use super::dom::Element;

/// Attribute carrying the owning stroke index.
pub const ATTR_STROKE: &str = "data-stroke";
/// Attribute marking non-stroke leaves.
pub const ATTR_IGNORE: &str = "data-ignore";

const DRAWABLE_TAGS: [&str; 7] = [
    "path", "polyline", "line", "circle", "ellipse", "rect", "polygon",
];

const DECORATION_PREFIXES: [&str; 3] = ["strokenumbers", "grid", "guide"];

/// Root-level elements that carry definitions rather than painted content.
const NON_PAINTED_TAGS: [&str; 5] = ["style", "defs", "title", "desc", "metadata"];

/// Parse the stroke index encoded in an identifier suffix (`kvg:06c38-s3` → `3`).
pub fn stroke_index_from_id(id: &str) -> Option<u32> {
    let (_, digits) = id.rsplit_once("-s")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `true` for identifiers of stroke-number labels, grids and guide lines.
pub fn is_decoration_id(id: &str) -> bool {
    let bare = id.strip_prefix("kvg:").unwrap_or(id).to_ascii_lowercase();
    DECORATION_PREFIXES.iter().any(|p| bare.starts_with(p))
}

pub fn is_drawable(el: &Element) -> bool {
    DRAWABLE_TAGS.contains(&el.local_name())
}

pub fn is_non_painted(el: &Element) -> bool {
    NON_PAINTED_TAGS.contains(&el.local_name())
}

/// Carrier index of an element, read from its `id` suffix.
pub fn carrier_index(el: &Element) -> Option<u32> {
    el.attr("id").and_then(stroke_index_from_id)
}

/// Stroke index from a `data-stroke` tag.
pub fn tagged_index(el: &Element) -> Option<u32> {
    el.attr(ATTR_STROKE).and_then(|v| v.trim().parse().ok())
}

/// Decoration element: ignorable leaf or decoration identifier.
pub fn is_decoration(el: &Element) -> bool {
    el.attr(ATTR_IGNORE).is_some_and(|v| v != "0")
        || el.attr("id").is_some_and(is_decoration_id)
}

/// Whether the element itself is hidden (attributes or inline style).
pub fn is_hidden(el: &Element) -> bool {
    if el.attr("display").is_some_and(|v| v.trim() == "none") {
        return true;
    }
    if el.attr("visibility").is_some_and(hidden_visibility) {
        return true;
    }
    el.attr("style")
        .is_some_and(|s| style_decls(s).any(|(k, v)| hiding_decl(&k, &v)))
}

pub fn hide(el: &mut Element) {
    el.set_attr("display", "none");
}

/// Clear every hiding attribute and inline declaration.
pub fn show(el: &mut Element) {
    if el.attr("display").is_some_and(|v| v.trim() == "none") {
        el.remove_attr("display");
    }
    if el.attr("visibility").is_some_and(hidden_visibility) {
        el.remove_attr("visibility");
    }
    if let Some(style) = el.attr("style") {
        let kept: Vec<String> = style_decls(style)
            .filter(|(k, v)| !hiding_decl(k, v))
            .map(|(k, v)| format!("{k}:{v}"))
            .collect();
        if kept.is_empty() {
            el.remove_attr("style");
        } else {
            el.set_attr("style", kept.join(";"));
        }
    }
}

fn hidden_visibility(v: &str) -> bool {
    matches!(v.trim(), "hidden" | "collapse")
}

fn hiding_decl(k: &str, v: &str) -> bool {
    (k == "display" && v == "none") || (k == "visibility" && hidden_visibility(v))
}

fn style_decls(style: &str) -> impl Iterator<Item = (String, String)> + '_ {
    style.split(';').filter_map(|decl| {
        let (k, v) = decl.split_once(':')?;
        Some((k.trim().to_ascii_lowercase(), v.trim().to_string()))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/svg/stroke.rs"]
mod tests;
