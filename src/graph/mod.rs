//! Node graph model and change propagation.

pub mod model;
pub mod scheduler;

pub use model::{EdgeDef, Graph, GraphDef, NodeDef, NodeId, NodeKind, Port};
pub use scheduler::Scheduler;
