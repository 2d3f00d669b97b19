use std::collections::BTreeSet;

use crate::svg::dom::Element;
use crate::svg::stroke::{
    carrier_index, is_decoration, is_drawable, is_hidden, is_non_painted, tagged_index,
};
use crate::svg::{Artifact, SvgDocument};

/// Number of visible strokes in a stroke-indexed document.
///
/// A drawable is visible when neither it nor any non-decoration ancestor is hidden. Drawables
/// tagged `data-stroke` themselves are preferred; without any, each visible drawable counts
/// for its nearest tagged or `-sN` ancestor. Sparse index sets report
/// `max(distinct, highest)`. Unparseable input counts 0.
pub fn count_visible_strokes(doc: &Artifact) -> u32 {
    let parsed = match SvgDocument::parse(doc.as_str()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "cannot count strokes of unparseable document");
            return 0;
        }
    };
    let mut scan = Scan::default();
    scan.walk(&parsed.root, false, None);

    let indices = if scan.tagged.is_empty() {
        &scan.inherited
    } else {
        &scan.tagged
    };
    let highest = indices.iter().next_back().copied().unwrap_or(0);
    highest.max(indices.len() as u32)
}

#[derive(Default)]
struct Scan {
    tagged: BTreeSet<u32>,
    inherited: BTreeSet<u32>,
}

impl Scan {
    fn walk(&mut self, el: &Element, blocked: bool, nearest: Option<u32>) {
        if is_non_painted(el) {
            return;
        }
        let hidden = is_hidden(el);
        let own = tagged_index(el);
        let nearest = own.or_else(|| carrier_index(el)).or(nearest);
        if is_drawable(el) {
            if blocked || hidden {
                return;
            }
            if let Some(index) = own {
                self.tagged.insert(index);
            }
            if let Some(index) = nearest {
                self.inherited.insert(index);
            }
            return;
        }
        let blocked = blocked || (hidden && !is_decoration(el));
        for child in el.child_elements() {
            self.walk(child, blocked, nearest);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/count.rs"]
mod tests;
