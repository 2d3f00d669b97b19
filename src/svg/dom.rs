use std::fmt;

use crate::foundation::error::{KakijunError, KakijunResult};

/// Namespace bound to `kvg:` in KanjiVG sources. The files only declare it in their DTD.
const KANJIVG_NS: &str = "http://kanjivg.tagaini.net";

/// Upper bound on prefixes bound during one parse.
const MAX_PREFIX_REPAIRS: usize = 4;

/// A node of the owned document tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Element with attributes and children.
    Element(Element),
    /// Character data (CDATA is folded into text).
    Text(String),
}

/// Owned, mutable XML element.
///
/// Names are stored qualified, exactly as they are serialized (`svg`, `kvg:element`).
/// Namespace declarations are kept as ordinary `xmlns`/`xmlns:*` attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    /// Qualified element name.
    pub name: String,
    attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Copy of the element's name and attributes, without children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attrs: self.attrs.clone(),
            children: Vec::new(),
        }
    }

    /// Element name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    /// Attributes in document order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Pre-order visit of this element and every descendant element.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in self.child_elements_mut() {
            child.visit_mut(f);
        }
    }

    /// Drop every descendant element for which `pred` returns `true` (with its subtree).
    pub fn retain_descendants(&mut self, pred: &impl Fn(&Element) -> bool) {
        self.children.retain(|n| match n {
            Node::Element(e) => !pred(e),
            Node::Text(_) => true,
        });
        for child in self.child_elements_mut() {
            child.retain_descendants(pred);
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            escape_into(out, v, true);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_to(out),
                Node::Text(t) => escape_into(out, t, false),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Parsed SVG document. Prolog, DOCTYPE, comments and processing instructions are not kept.
#[derive(Clone, Debug, PartialEq)]
pub struct SvgDocument {
    pub root: Element,
}

impl SvgDocument {
    /// Parse XML text into an owned tree.
    ///
    /// Prefixes that are used but never declared (KanjiVG binds `kvg:` only through its DTD)
    /// are bound on the root element and parsing is retried.
    pub fn parse(text: &str) -> KakijunResult<Self> {
        let mut owned: Option<String> = None;
        for _ in 0..=MAX_PREFIX_REPAIRS {
            let src = owned.as_deref().unwrap_or(text);
            let opts = roxmltree::ParsingOptions {
                allow_dtd: true,
                ..roxmltree::ParsingOptions::default()
            };
            match roxmltree::Document::parse_with_options(src, opts) {
                Ok(doc) => {
                    let root = convert_element(doc.root_element(), None);
                    return Ok(Self { root });
                }
                Err(roxmltree::Error::UnknownNamespace(prefix, _)) => {
                    let uri = if prefix == "kvg" {
                        KANJIVG_NS.to_string()
                    } else {
                        format!("urn:x-kakijun:{prefix}")
                    };
                    let repaired = bind_prefix_on_root(src, &prefix, &uri).ok_or_else(|| {
                        KakijunError::parse(format!("undeclared namespace prefix '{prefix}'"))
                    })?;
                    tracing::debug!(prefix = %prefix, "bound undeclared namespace prefix");
                    owned = Some(repaired);
                }
                Err(e) => return Err(KakijunError::parse(e.to_string())),
            }
        }
        Err(KakijunError::parse("too many undeclared namespace prefixes"))
    }

    /// Serialize to SVG text (no XML declaration).
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        self.root.write_to(&mut out);
        out
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_svg_string())
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn qualify(node: roxmltree::Node<'_, '_>, local: &str, ns: Option<&str>) -> String {
    match ns.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn convert_element(
    node: roxmltree::Node<'_, '_>,
    parent_scope: Option<&[(Option<String>, String)]>,
) -> Element {
    let tag = node.tag_name();
    let mut el = Element::new(qualify(node, tag.name(), tag.namespace()));

    let scope: Vec<(Option<String>, String)> = node
        .namespaces()
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect();
    for (prefix, uri) in &scope {
        let declared_above =
            parent_scope.is_some_and(|p| p.iter().any(|(pp, pu)| pp == prefix && pu == uri));
        if declared_above {
            continue;
        }
        match prefix {
            Some(p) if p == "xml" => {}
            Some(p) => el.set_attr(&format!("xmlns:{p}"), uri.clone()),
            None => el.set_attr("xmlns", uri.clone()),
        }
    }

    for a in node.attributes() {
        let name = match a.namespace() {
            Some("http://www.w3.org/XML/1998/namespace") => format!("xml:{}", a.name()),
            ns => qualify(node, a.name(), ns),
        };
        el.set_attr(&name, a.value());
    }

    for child in node.children() {
        if child.is_element() {
            el.push(convert_element(child, Some(&scope)));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                el.children.push(Node::Text(t.to_string()));
            }
        }
    }
    el
}

/// Insert `xmlns:<prefix>="<uri>"` into the root start tag.
fn bind_prefix_on_root(src: &str, prefix: &str, uri: &str) -> Option<String> {
    let bytes = src.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'<' && (bytes[i + 1].is_ascii_alphabetic() || bytes[i + 1] == b'_') {
            let mut j = i + 1;
            while j < bytes.len()
                && !bytes[j].is_ascii_whitespace()
                && bytes[j] != b'>'
                && bytes[j] != b'/'
            {
                j += 1;
            }
            let mut out = String::with_capacity(src.len() + uri.len() + prefix.len() + 12);
            out.push_str(&src[..j]);
            out.push_str(&format!(" xmlns:{prefix}=\"{uri}\""));
            out.push_str(&src[j..]);
            return Some(out);
        }
        i += 1;
    }
    None
}

fn escape_into(out: &mut String, s: &str, attr: bool) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/svg/dom.rs"]
mod tests;
