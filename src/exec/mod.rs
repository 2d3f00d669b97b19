//! Interchangeable ways of running one graph evaluation.
//!
//! - [`InProcessExecutor`] evaluates on the calling thread.
//! - [`WorkerExecutor`] sends the request to an isolated worker thread with its own
//!   glyph source and caches.
//! - [`FallbackExecutor`] tries a primary executor and retries on a fallback only when the
//!   primary fails.

use std::any::Any;

use crate::cache::OpCacheOpts;
use crate::eval::EvalOpts;
use crate::foundation::error::KakijunResult;
use crate::glyph::GlyphSourceOpts;
use crate::graph::{Graph, NodeId};
use crate::svg::Artifact;

mod fallback;
mod in_process;
mod worker;

pub use fallback::FallbackExecutor;
pub use in_process::InProcessExecutor;
pub use worker::{WorkerExecutor, WorkerOpts};

/// Evaluate one target node of a graph.
///
/// `Ok(None)` means the node has no artifact (missing input, unresolvable glyph, depth
/// bound); `Err` means the executor itself failed.
pub trait Executor: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, graph: &Graph, target: &NodeId) -> KakijunResult<Option<Artifact>>;

    /// Release per-node state (range slots) of a node that left the graph.
    fn forget_node(&self, _id: &NodeId) {}
}

/// Available executor kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutorKind {
    InProcess,
    Worker,
    /// In-process first, worker on failure.
    #[default]
    Fallback,
}

/// Everything needed to build an evaluator, for each executor that owns one.
#[derive(Clone, Debug, Default)]
pub struct ExecutorSettings {
    pub glyphs: GlyphSourceOpts,
    pub cache: OpCacheOpts,
    pub eval: EvalOpts,
    pub worker: WorkerOpts,
}

pub fn create_executor(kind: ExecutorKind, settings: &ExecutorSettings) -> Box<dyn Executor> {
    match kind {
        ExecutorKind::InProcess => Box::new(InProcessExecutor::from_settings(settings)),
        ExecutorKind::Worker => Box::new(WorkerExecutor::new(settings.clone())),
        ExecutorKind::Fallback => Box::new(FallbackExecutor::new(
            Box::new(InProcessExecutor::from_settings(settings)),
            Box::new(WorkerExecutor::new(settings.clone())),
        )),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
