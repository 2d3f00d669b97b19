use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::model::{Graph, NodeId, Port};

/// Push-based invalidation over a [`Graph`].
///
/// A change to some nodes invalidates them and everything downstream; the scheduler lists
/// those nodes so that every node comes after the nodes it reads from.
pub struct Scheduler;

impl Scheduler {
    /// Changed nodes and their descendants in topological order.
    ///
    /// Unknown ids are ignored. Nodes on a cycle cannot be ordered; they follow the ordered
    /// ones in discovery order.
    pub fn affected(graph: &Graph, changed: &[NodeId]) -> Vec<NodeId> {
        let mut discovered: Vec<NodeId> = Vec::new();
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut queue: VecDeque<NodeId> = changed
            .iter()
            .filter(|id| graph.contains(id))
            .cloned()
            .collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            for dep in graph.dependents(&id) {
                if !seen.contains(dep) {
                    queue.push_back(dep.clone());
                }
            }
            discovered.push(id);
        }

        // Kahn's algorithm restricted to the affected set.
        let mut pending: BTreeMap<NodeId, usize> = discovered
            .iter()
            .map(|id| (id.clone(), inputs_within(graph, id, &seen)))
            .collect();
        let mut ready: VecDeque<NodeId> = discovered
            .iter()
            .filter(|id| pending.get(*id) == Some(&0))
            .cloned()
            .collect();
        let mut order: Vec<NodeId> = Vec::with_capacity(discovered.len());
        while let Some(id) = ready.pop_front() {
            if pending.remove(&id).is_none() {
                continue;
            }
            for dep in graph.dependents(&id) {
                if let Some(n) = pending.get_mut(dep) {
                    *n = n.saturating_sub(inputs_from(graph, dep, &id));
                    if *n == 0 {
                        ready.push_back(dep.clone());
                    }
                }
            }
            order.push(id);
        }

        if !pending.is_empty() {
            tracing::debug!(cyclic = pending.len(), "affected set contains a cycle");
            order.extend(
                discovered
                    .iter()
                    .filter(|id| pending.contains_key(*id))
                    .cloned(),
            );
        }
        order
    }
}

/// Upstream edges of `id` whose source is inside `set`.
fn inputs_within(graph: &Graph, id: &NodeId, set: &BTreeSet<NodeId>) -> usize {
    Port::ALL
        .into_iter()
        .filter_map(|port| graph.input(id, port))
        .filter(|src| set.contains(*src))
        .count()
}

/// Number of ports of `target` fed by `source`.
fn inputs_from(graph: &Graph, target: &NodeId, source: &NodeId) -> usize {
    Port::ALL
        .into_iter()
        .filter(|port| graph.input(target, *port) == Some(source))
        .count()
}

#[cfg(test)]
#[path = "../../tests/unit/graph/scheduler.rs"]
mod tests;
