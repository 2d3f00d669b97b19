use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use crate::exec::Executor;
use crate::foundation::error::KakijunResult;
use crate::graph::{Graph, NodeId, NodeKind, Port, Scheduler};
use crate::svg::Artifact;

#[derive(Clone, Debug)]
pub struct SessionOpts {
    /// Quiet period after the last edit before affected nodes are re-evaluated.
    pub debounce: Duration,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(120),
        }
    }
}

/// Work handed out by [`PreviewSession::take_due`]: a graph snapshot and the nodes to
/// re-evaluate, in dependency order.
#[derive(Clone, Debug)]
pub struct RefreshTicket {
    pub generation: u64,
    pub graph: Graph,
    pub targets: Vec<NodeId>,
}

impl RefreshTicket {
    /// Evaluate every target in order.
    pub fn run(&self, executor: &dyn Executor) -> Vec<(NodeId, KakijunResult<Option<Artifact>>)> {
        self.targets
            .iter()
            .map(|t| (t.clone(), executor.evaluate(&self.graph, t)))
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub generation: u64,
    /// Nodes whose stored artifact was replaced (possibly by `None`).
    pub updated: Vec<NodeId>,
    /// Nodes whose executor failed; they now have no artifact.
    pub failed: Vec<NodeId>,
}

/// Editable graph plus the latest artifact of every node.
///
/// Edits mark nodes dirty and restart the debounce window. A refresh re-evaluates the dirty
/// nodes and their descendants. Any edit or newer refresh supersedes a refresh in flight,
/// whose results are then discarded.
pub struct PreviewSession {
    graph: Graph,
    executor: Box<dyn Executor>,
    opts: SessionOpts,
    artifacts: BTreeMap<NodeId, Option<Artifact>>,
    dirty: BTreeSet<NodeId>,
    last_edit: Option<Instant>,
    generation: u64,
}

impl PreviewSession {
    /// Every node of `graph` starts dirty; the first poll after the debounce window fills
    /// the table.
    pub fn new(graph: Graph, executor: Box<dyn Executor>, opts: SessionOpts, now: Instant) -> Self {
        let dirty = graph.node_ids().cloned().collect();
        Self {
            graph,
            executor,
            opts,
            artifacts: BTreeMap::new(),
            dirty,
            last_edit: Some(now),
            generation: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Latest artifact of a node; `None` while pending or when the node has none.
    pub fn artifact(&self, id: &NodeId) -> Option<&Artifact> {
        self.artifacts.get(id).and_then(Option::as_ref)
    }

    pub fn is_dirty(&self, id: &NodeId) -> bool {
        self.dirty.contains(id)
    }

    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn add_node(&mut self, id: NodeId, kind: NodeKind, now: Instant) -> KakijunResult<()> {
        self.graph.add_node(id.clone(), kind)?;
        self.touch(id, now);
        Ok(())
    }

    pub fn set_kind(&mut self, id: &NodeId, kind: NodeKind, now: Instant) -> KakijunResult<()> {
        self.graph.set_kind(id, kind)?;
        self.touch(id.clone(), now);
        Ok(())
    }

    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        port: Port,
        now: Instant,
    ) -> KakijunResult<()> {
        self.graph.connect(source, target, port)?;
        self.touch(target.clone(), now);
        Ok(())
    }

    pub fn disconnect(&mut self, target: &NodeId, port: Port, now: Instant) {
        if self.graph.disconnect(target, port).is_some() {
            self.touch(target.clone(), now);
        }
    }

    pub fn remove_node(&mut self, id: &NodeId, now: Instant) -> KakijunResult<()> {
        let dependents = self.graph.remove_node(id)?;
        self.artifacts.remove(id);
        self.executor.forget_node(id);
        self.dirty.remove(id);
        self.generation += 1;
        self.last_edit = Some(now);
        self.dirty.extend(dependents);
        Ok(())
    }

    /// Claim the pending work once the debounce window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<RefreshTicket> {
        if self.dirty.is_empty() {
            return None;
        }
        if let Some(at) = self.last_edit {
            if now.saturating_duration_since(at) < self.opts.debounce {
                return None;
            }
        }
        Some(self.take_now())
    }

    /// Claim the pending work regardless of the debounce window.
    pub fn take_now(&mut self) -> RefreshTicket {
        let changed: Vec<NodeId> = std::mem::take(&mut self.dirty).into_iter().collect();
        self.generation += 1;
        let targets = Scheduler::affected(&self.graph, &changed);
        tracing::debug!(generation = self.generation, nodes = targets.len(), "refresh started");
        RefreshTicket {
            generation: self.generation,
            graph: self.graph.clone(),
            targets,
        }
    }

    /// Store the results of a ticket, unless it has been superseded.
    ///
    /// A superseded ticket's targets are marked dirty again.
    pub fn complete(
        &mut self,
        ticket: RefreshTicket,
        results: Vec<(NodeId, KakijunResult<Option<Artifact>>)>,
    ) -> Option<RefreshReport> {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded refresh"
            );
            let live: Vec<NodeId> = ticket
                .targets
                .into_iter()
                .filter(|t| self.graph.contains(t))
                .collect();
            self.dirty.extend(live);
            return None;
        }
        let mut report = RefreshReport {
            generation: ticket.generation,
            ..RefreshReport::default()
        };
        for (id, result) in results {
            let artifact = match result {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!(node = %id, error = %e, "node refresh failed");
                    report.failed.push(id.clone());
                    None
                }
            };
            self.artifacts.insert(id.clone(), artifact);
            report.updated.push(id);
        }
        Some(report)
    }

    /// Refresh on the session's own executor once the debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<RefreshReport> {
        let ticket = self.take_due(now)?;
        let results = ticket.run(self.executor.as_ref());
        self.complete(ticket, results)
    }

    /// Refresh every pending node immediately.
    pub fn flush(&mut self) -> Option<RefreshReport> {
        if self.dirty.is_empty() {
            return None;
        }
        let ticket = self.take_now();
        let results = ticket.run(self.executor.as_ref());
        self.complete(ticket, results)
    }

    fn touch(&mut self, id: NodeId, now: Instant) {
        self.dirty.insert(id);
        self.generation += 1;
        self.last_edit = Some(now);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/preview.rs"]
mod tests;
