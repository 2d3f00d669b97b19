use crate::foundation::error::KakijunResult;
use crate::graph::{Graph, NodeId};
use crate::svg::Artifact;

use super::Executor;

/// Primary executor with a fallback used only when the primary returns an error.
///
/// A successful `None` from the primary is final. The evaluator already turns node failures
/// (unresolvable glyphs, unparseable documents, depth overruns) into `None`, so with the
/// default in-process primary the fallback runs only on executor failures: a panic during
/// evaluation, or a primary that cannot run at all.
pub struct FallbackExecutor {
    primary: Box<dyn Executor>,
    fallback: Box<dyn Executor>,
}

impl FallbackExecutor {
    pub fn new(primary: Box<dyn Executor>, fallback: Box<dyn Executor>) -> Self {
        Self { primary, fallback }
    }
}

impl Executor for FallbackExecutor {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn evaluate(&self, graph: &Graph, target: &NodeId) -> KakijunResult<Option<Artifact>> {
        match self.primary.evaluate(graph, target) {
            Ok(out) => Ok(out),
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    node = %target,
                    error = %e,
                    "primary executor failed; retrying on fallback"
                );
                self.fallback.evaluate(graph, target)
            }
        }
    }

    fn forget_node(&self, id: &NodeId) {
        self.primary.forget_node(id);
        self.fallback.forget_node(id);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/fallback.rs"]
mod tests;
