use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::foundation::error::{KakijunError, KakijunResult};
use crate::ops::{AlphaParams, TransformParams};

/// Stable node identifier chosen by the editor.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Named input port on a node.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    /// Single input of Range and Transform.
    In,
    A,
    B,
}

impl Port {
    pub const ALL: [Port; 3] = [Port::In, Port::A, Port::B];
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Port::In => "in",
            Port::A => "a",
            Port::B => "b",
        })
    }
}

/// Operation performed by a node, with its parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    Glyph {
        #[serde(rename = "char", default, skip_serializing_if = "Option::is_none")]
        ch: Option<String>,
        /// Stroke color; the evaluator default applies when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    Range {
        #[serde(default = "default_start")]
        start: i64,
        /// Open-ended by default; clamped to the stroke count.
        #[serde(default = "default_end")]
        end: i64,
    },
    Transform {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default = "default_scale")]
        sx: f64,
        #[serde(default = "default_scale")]
        sy: f64,
    },
    Composite {
        #[serde(default = "default_alpha")]
        alpha_a: f64,
        #[serde(default = "default_alpha")]
        alpha_b: f64,
        #[serde(default)]
        swap: bool,
    },
}

fn default_start() -> i64 {
    1
}

fn default_end() -> i64 {
    i64::from(u32::MAX)
}

fn default_scale() -> f64 {
    1.0
}

fn default_alpha() -> f64 {
    1.0
}

impl NodeKind {
    pub fn glyph(ch: &str) -> Self {
        NodeKind::Glyph {
            ch: Some(ch.to_string()),
            color: None,
        }
    }

    pub fn range(start: i64, end: i64) -> Self {
        NodeKind::Range { start, end }
    }

    pub fn transform(p: TransformParams) -> Self {
        NodeKind::Transform {
            x: p.tx,
            y: p.ty,
            sx: p.sx,
            sy: p.sy,
        }
    }

    pub fn composite(p: AlphaParams) -> Self {
        NodeKind::Composite {
            alpha_a: p.alpha_a,
            alpha_b: p.alpha_b,
            swap: p.swap,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Glyph { .. } => "glyph",
            NodeKind::Range { .. } => "range",
            NodeKind::Transform { .. } => "transform",
            NodeKind::Composite { .. } => "composite",
        }
    }

    /// Input ports accepted by this kind.
    pub fn ports(&self) -> &'static [Port] {
        match self {
            NodeKind::Glyph { .. } => &[],
            NodeKind::Range { .. } | NodeKind::Transform { .. } => &[Port::In],
            NodeKind::Composite { .. } => &[Port::A, Port::B],
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeDef {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EdgeDef {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default = "default_port")]
    pub port: Port,
}

fn default_port() -> Port {
    Port::In
}

/// Serialized graph as exchanged with the editor.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphDef {
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

/// Validated node graph.
///
/// Each input port holds at most one edge. Cycles are allowed; evaluation bounds its depth.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, NodeKind>,
    inputs: BTreeMap<NodeId, BTreeMap<Port, NodeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> KakijunResult<Self> {
        let def: GraphDef = serde_json::from_str(text)
            .map_err(|e| KakijunError::validation(format!("graph json: {e}")))?;
        Self::from_def(def)
    }

    pub fn from_def(def: GraphDef) -> KakijunResult<Self> {
        let mut graph = Self::new();
        for node in def.nodes {
            graph.add_node(node.id, node.kind)?;
        }
        for edge in def.edges {
            if graph.input(&edge.target, edge.port).is_some() {
                return Err(KakijunError::validation(format!(
                    "port '{}' of node '{}' has more than one edge",
                    edge.port, edge.target
                )));
            }
            graph.connect(&edge.source, &edge.target, edge.port)?;
        }
        Ok(graph)
    }

    pub fn to_def(&self) -> GraphDef {
        GraphDef {
            nodes: self
                .nodes
                .iter()
                .map(|(id, kind)| NodeDef {
                    id: id.clone(),
                    kind: kind.clone(),
                })
                .collect(),
            edges: self
                .inputs
                .iter()
                .flat_map(|(target, ports)| {
                    ports.iter().map(move |(port, source)| EdgeDef {
                        source: source.clone(),
                        target: target.clone(),
                        port: *port,
                    })
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&NodeKind> {
        self.nodes.get(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Upstream node feeding `port` of `id`.
    pub fn input(&self, id: &NodeId, port: Port) -> Option<&NodeId> {
        self.inputs.get(id).and_then(|ports| ports.get(&port))
    }

    /// Nodes reading `id` on any port.
    pub fn dependents(&self, id: &NodeId) -> BTreeSet<&NodeId> {
        self.inputs
            .iter()
            .filter(|(_, ports)| ports.values().any(|src| src == id))
            .map(|(target, _)| target)
            .collect()
    }

    pub fn add_node(&mut self, id: NodeId, kind: NodeKind) -> KakijunResult<()> {
        if id.0.trim().is_empty() {
            return Err(KakijunError::validation("node id must be non-empty"));
        }
        if self.nodes.contains_key(&id) {
            return Err(KakijunError::validation(format!("duplicate node id '{id}'")));
        }
        self.nodes.insert(id, kind);
        Ok(())
    }

    /// Replace a node's kind and parameters. Edges on ports the new kind lacks are dropped.
    pub fn set_kind(&mut self, id: &NodeId, kind: NodeKind) -> KakijunResult<()> {
        let slot = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| KakijunError::not_found(format!("node '{id}'")))?;
        let ports = kind.ports();
        *slot = kind;
        if let Some(inputs) = self.inputs.get_mut(id) {
            inputs.retain(|port, _| ports.contains(port));
            if inputs.is_empty() {
                self.inputs.remove(id);
            }
        }
        Ok(())
    }

    /// Connect `source` to `port` of `target`, returning the replaced upstream if any.
    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        port: Port,
    ) -> KakijunResult<Option<NodeId>> {
        if !self.nodes.contains_key(source) {
            return Err(KakijunError::validation(format!(
                "edge source '{source}' does not exist"
            )));
        }
        let kind = self.nodes.get(target).ok_or_else(|| {
            KakijunError::validation(format!("edge target '{target}' does not exist"))
        })?;
        if !kind.ports().contains(&port) {
            return Err(KakijunError::validation(format!(
                "{} node '{target}' has no '{port}' port",
                kind.name()
            )));
        }
        Ok(self
            .inputs
            .entry(target.clone())
            .or_default()
            .insert(port, source.clone()))
    }

    pub fn disconnect(&mut self, target: &NodeId, port: Port) -> Option<NodeId> {
        let ports = self.inputs.get_mut(target)?;
        let old = ports.remove(&port);
        if ports.is_empty() {
            self.inputs.remove(target);
        }
        old
    }

    /// Remove a node with every edge touching it. Returns its former dependents.
    pub fn remove_node(&mut self, id: &NodeId) -> KakijunResult<Vec<NodeId>> {
        if self.nodes.remove(id).is_none() {
            return Err(KakijunError::not_found(format!("node '{id}'")));
        }
        self.inputs.remove(id);
        let mut dependents = Vec::new();
        for (target, ports) in self.inputs.iter_mut() {
            let before = ports.len();
            ports.retain(|_, src| src != id);
            if ports.len() != before {
                dependents.push(target.clone());
            }
        }
        self.inputs.retain(|_, ports| !ports.is_empty());
        Ok(dependents)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/model.rs"]
mod tests;
