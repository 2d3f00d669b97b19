use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::eval::Evaluator;
use crate::foundation::error::{KakijunError, KakijunResult};
use crate::graph::{Graph, NodeId};
use crate::svg::Artifact;

use super::{Executor, ExecutorSettings, panic_message};

/// Runs an [`Evaluator`] on the caller's thread. A panic is reported as an error.
pub struct InProcessExecutor {
    evaluator: Evaluator,
}

impl InProcessExecutor {
    pub fn new(evaluator: Evaluator) -> Self {
        Self { evaluator }
    }

    pub fn from_settings(settings: &ExecutorSettings) -> Self {
        Self::new(Evaluator::from_opts(
            settings.glyphs.clone(),
            settings.cache.clone(),
            settings.eval.clone(),
        ))
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }
}

impl Executor for InProcessExecutor {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn evaluate(&self, graph: &Graph, target: &NodeId) -> KakijunResult<Option<Artifact>> {
        catch_unwind(AssertUnwindSafe(|| self.evaluator.evaluate(graph, target))).map_err(|p| {
            KakijunError::evaluation(format!(
                "in-process evaluation of '{target}' panicked: {}",
                panic_message(p.as_ref())
            ))
        })
    }

    fn forget_node(&self, id: &NodeId) {
        self.evaluator.cache().forget_node(id.as_str());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/in_process.rs"]
mod tests;
