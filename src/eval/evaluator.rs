use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::cache::{OpCache, OpCacheOpts};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{KakijunError, KakijunResult};
use crate::glyph::{GlyphSource, GlyphSourceOpts, annotate};
use crate::graph::{Graph, NodeId, NodeKind, Port};
use crate::ops::{self, AlphaParams, TransformParams};
use crate::svg::Artifact;

#[derive(Clone, Debug)]
pub struct EvalOpts {
    /// Recursion bound; graphs are not checked for cycles.
    pub max_depth: usize,
    /// Stroke color for glyph nodes that do not set one.
    pub stroke_color: String,
}

impl Default for EvalOpts {
    fn default() -> Self {
        Self {
            max_depth: 20,
            stroke_color: "#000000".to_string(),
        }
    }
}

/// Recursive graph evaluator.
///
/// Each call starts a fresh memo table, so a node read by several consumers is computed
/// once per call and nothing is carried between calls except the glyph and operation caches.
/// A failing node evaluates to `None`; its siblings are unaffected.
pub struct Evaluator {
    source: Arc<GlyphSource>,
    cache: Arc<OpCache>,
    opts: EvalOpts,
}

impl Evaluator {
    pub fn new(source: Arc<GlyphSource>, cache: Arc<OpCache>, opts: EvalOpts) -> Self {
        Self {
            source,
            cache,
            opts,
        }
    }

    /// Evaluator owning a fresh glyph source and operation cache.
    pub fn from_opts(glyphs: GlyphSourceOpts, cache: OpCacheOpts, opts: EvalOpts) -> Self {
        Self::new(
            Arc::new(GlyphSource::new(glyphs)),
            Arc::new(OpCache::new(cache)),
            opts,
        )
    }

    pub fn source(&self) -> &Arc<GlyphSource> {
        &self.source
    }

    pub fn cache(&self) -> &Arc<OpCache> {
        &self.cache
    }

    pub fn opts(&self) -> &EvalOpts {
        &self.opts
    }

    pub fn evaluate(&self, graph: &Graph, target: &NodeId) -> Option<Artifact> {
        self.evaluate_with_cancel(graph, target, &CancelToken::new())
    }

    #[tracing::instrument(level = "debug", skip(self, graph, cancel))]
    pub fn evaluate_with_cancel(
        &self,
        graph: &Graph,
        target: &NodeId,
        cancel: &CancelToken,
    ) -> Option<Artifact> {
        Pass::new(self, graph, cancel).eval(target, 0)
    }

    /// Evaluate several targets with one shared memo table.
    #[tracing::instrument(level = "debug", skip(self, graph, cancel), fields(targets = targets.len()))]
    pub fn evaluate_many(
        &self,
        graph: &Graph,
        targets: &[NodeId],
        cancel: &CancelToken,
    ) -> BTreeMap<NodeId, Option<Artifact>> {
        let mut pass = Pass::new(self, graph, cancel);
        targets
            .iter()
            .map(|t| (t.clone(), pass.eval(t, 0)))
            .collect()
    }
}

/// State of one evaluation call.
struct Pass<'a> {
    ev: &'a Evaluator,
    graph: &'a Graph,
    cancel: &'a CancelToken,
    memo: HashMap<NodeId, Option<Artifact>>,
}

impl<'a> Pass<'a> {
    fn new(ev: &'a Evaluator, graph: &'a Graph, cancel: &'a CancelToken) -> Self {
        Self {
            ev,
            graph,
            cancel,
            memo: HashMap::new(),
        }
    }

    fn eval(&mut self, id: &NodeId, depth: usize) -> Option<Artifact> {
        if depth > self.ev.opts.max_depth {
            tracing::warn!(node = %id, depth, "evaluation depth exceeded; is the graph cyclic?");
            return None;
        }
        if let Some(done) = self.memo.get(id) {
            return done.clone();
        }
        let out = match self.compute(id, depth) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(node = %id, error = %e, "node evaluation failed");
                None
            }
        };
        self.memo.insert(id.clone(), out.clone());
        out
    }

    fn input(&mut self, id: &NodeId, port: Port, depth: usize) -> Option<Artifact> {
        let upstream = self.graph.input(id, port)?.clone();
        self.eval(&upstream, depth + 1)
    }

    fn compute(&mut self, id: &NodeId, depth: usize) -> KakijunResult<Option<Artifact>> {
        let graph = self.graph;
        let kind = graph
            .node(id)
            .ok_or_else(|| KakijunError::not_found(format!("node '{id}'")))?;
        match kind {
            NodeKind::Glyph { ch, color } => {
                let Some(ch) = ch.as_deref().filter(|c| !c.is_empty()) else {
                    return Ok(None);
                };
                let glyph = self.ev.source.resolve_with_cancel(ch, self.cancel)?;
                let annotated = annotate(&glyph.source, true)?;
                let color = color.as_deref().unwrap_or(&self.ev.opts.stroke_color);
                Ok(Some(ops::force_stroke_color(&annotated, color)))
            }
            NodeKind::Range { start, end } => {
                let Some(input) = self.input(id, Port::In, depth) else {
                    return Ok(None);
                };
                self.ev.cache.range(id.as_str(), &input, *start, *end)
            }
            NodeKind::Transform { x, y, sx, sy } => {
                let params = TransformParams {
                    tx: *x,
                    ty: *y,
                    sx: *sx,
                    sy: *sy,
                };
                let Some(input) = self.input(id, Port::In, depth) else {
                    return Ok(None);
                };
                Ok(Some(self.ev.cache.transform(&input, params)))
            }
            NodeKind::Composite {
                alpha_a,
                alpha_b,
                swap,
            } => {
                let params = AlphaParams {
                    alpha_a: *alpha_a,
                    alpha_b: *alpha_b,
                    swap: *swap,
                };
                let a = self.input(id, Port::A, depth);
                let b = self.input(id, Port::B, depth);
                Ok(match (a, b) {
                    (Some(a), Some(b)) => Some(self.ev.cache.composite_alpha(&a, &b, params)),
                    (Some(one), None) | (None, Some(one)) => Some(one),
                    (None, None) => None,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/evaluator.rs"]
mod tests;
