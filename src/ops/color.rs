use std::collections::HashSet;

use xxhash_rust::xxh3::xxh3_64;

use crate::svg::Artifact;
use crate::svg::dom::{Element, Node};
use crate::svg::stroke::is_drawable;

/// Prefix of the class (and rule `id`) that scopes an injected stroke rule.
pub const STROKE_CLASS_PREFIX: &str = "kakijun-stroke-";

const FALLBACK_COLOR: &str = "#000000";

const OVERRIDDEN: [&str; 5] = [
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "fill",
];

/// Class carried by every drawable colored with `color`.
pub fn stroke_class(color: &str) -> String {
    format!("{STROKE_CLASS_PREFIX}{:016x}", xxh3_64(color.as_bytes()))
}

/// Enforce one stroke color, width 3, round caps/joins and no fill on every drawable.
///
/// Applied twice over: a `<style>` rule and explicit per-element attributes, since some
/// consumers drop style elements. The rule selects only drawables carrying
/// [`stroke_class`] of `color`, so documents colored separately keep their colors once
/// composited. Re-applying replaces earlier rules and classes.
pub fn force_stroke_color(doc: &Artifact, color: &str) -> Artifact {
    let color = if is_plain_color(color) {
        color.trim()
    } else {
        tracing::warn!(color, "rejected stroke color; using {FALLBACK_COLOR}");
        FALLBACK_COLOR
    };
    let class = stroke_class(color);
    super::edit("force_stroke_color", doc, |parsed| {
        let root = &mut parsed.root;
        root.retain_descendants(&is_stroke_rule);
        let mut style = Element::new("style").with_attr("id", class.as_str());
        style.children.push(Node::Text(format!(
            ".{class}{{stroke:{color};stroke-width:3;stroke-linecap:round;\
             stroke-linejoin:round;fill:none;vector-effect:non-scaling-stroke}}"
        )));
        root.children.insert(0, Node::Element(style));

        root.visit_mut(&mut |e| {
            if !is_drawable(e) {
                return;
            }
            strip_inline(e);
            set_stroke_class(e, &class);
            e.set_attr("stroke", color);
            e.set_attr("stroke-width", "3");
            e.set_attr("stroke-linecap", "round");
            e.set_attr("stroke-linejoin", "round");
            e.set_attr("fill", "none");
            e.set_attr("vector-effect", "non-scaling-stroke");
        });
    })
}

/// Drop stroke rules from `incoming` that `kept` already defines.
pub(crate) fn drop_repeated_rules(kept: &Element, incoming: &mut Vec<Node>) {
    let mut ids = HashSet::new();
    collect_rule_ids(kept, &mut ids);
    if ids.is_empty() {
        return;
    }
    let repeated =
        |e: &Element| is_stroke_rule(e) && e.attr("id").is_some_and(|id| ids.contains(id));
    incoming.retain(|n| !matches!(n, Node::Element(e) if repeated(e)));
    for node in incoming.iter_mut() {
        if let Node::Element(e) = node {
            e.retain_descendants(&repeated);
        }
    }
}

fn collect_rule_ids(e: &Element, out: &mut HashSet<String>) {
    for child in e.child_elements() {
        if is_stroke_rule(child) {
            if let Some(id) = child.attr("id") {
                out.insert(id.to_string());
            }
        } else {
            collect_rule_ids(child, out);
        }
    }
}

fn is_stroke_rule(e: &Element) -> bool {
    e.local_name() == "style" && e.attr("id").is_some_and(|id| id.starts_with(STROKE_CLASS_PREFIX))
}

fn set_stroke_class(e: &mut Element, class: &str) {
    let mut tokens: Vec<&str> = e
        .attr("class")
        .unwrap_or("")
        .split_whitespace()
        .filter(|t| !t.starts_with(STROKE_CLASS_PREFIX))
        .collect();
    tokens.push(class);
    let joined = tokens.join(" ");
    e.set_attr("class", joined);
}

/// Inline declarations would beat the enforced attributes, so drop the overridden ones.
fn strip_inline(e: &mut Element) {
    let Some(style) = e.attr("style") else {
        return;
    };
    let kept: Vec<&str> = style
        .split(';')
        .filter(|d| {
            let key = d.split_once(':').map_or("", |(k, _)| k.trim());
            !d.trim().is_empty() && !OVERRIDDEN.iter().any(|o| key.eq_ignore_ascii_case(o))
        })
        .collect();
    let kept = kept.join(";");
    if kept.is_empty() {
        e.remove_attr("style");
    } else {
        e.set_attr("style", kept);
    }
}

/// Hex, named and functional colors; nothing that could close the CSS rule.
fn is_plain_color(color: &str) -> bool {
    let color = color.trim();
    !color.is_empty()
        && color
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | ' ' | '-'))
}

#[cfg(test)]
#[path = "../../tests/unit/ops/color.rs"]
mod tests;
