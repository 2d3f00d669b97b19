use crate::svg::Artifact;
use crate::svg::dom::Element;
use crate::svg::stroke::{ATTR_IGNORE, hide, is_decoration, is_non_painted, show, tagged_index};

/// Show strokes `start..=end` and hide every other stroke and all ignorable leaves.
///
/// Callers clamp and order the bounds. Non-decoration ancestors of a shown stroke are
/// force-shown so an inherited hidden state cannot suppress it.
pub fn select_range(doc: &Artifact, start: u32, end: u32) -> Artifact {
    super::edit("select_range", doc, |parsed| {
        select(&mut parsed.root, start, end);
    })
}

/// Clamp declared bounds into `[1, count]` and order them. `count` must be positive.
pub fn clamp_bounds(start: i64, end: i64, count: u32) -> (u32, u32) {
    let max = i64::from(count.max(1));
    let s = start.clamp(1, max) as u32;
    let e = end.clamp(1, max) as u32;
    if s <= e { (s, e) } else { (e, s) }
}

/// Returns whether the subtree holds a shown in-range stroke.
fn select(el: &mut Element, start: u32, end: u32) -> bool {
    if is_non_painted(el) {
        return false;
    }
    if el.attr(ATTR_IGNORE).is_some_and(|v| v != "0") {
        hide(el);
        return false;
    }
    if let Some(index) = tagged_index(el) {
        if !(start..=end).contains(&index) {
            hide(el);
            return false;
        }
        show(el);
        for child in el.child_elements_mut() {
            select(child, start, end);
        }
        return true;
    }

    let mut shown = false;
    for child in el.child_elements_mut() {
        shown |= select(child, start, end);
    }
    if shown && !is_decoration(el) {
        show(el);
    }
    shown
}

#[cfg(test)]
#[path = "../../tests/unit/ops/range.rs"]
mod tests;
