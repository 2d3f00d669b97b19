//! kakijun composes stroke-order diagrams from a small graph of glyph operations.
//!
//! - Resolve a character to its KanjiVG-style source with [`GlyphSource`]
//! - Normalize it into a stroke-indexed document with [`bake`] or [`annotate`]
//! - Wire Glyph, Range, Transform and Composite nodes into a [`Graph`]
//! - Evaluate a node through an [`Executor`] (in-process, isolated worker, or both)
//! - Keep an editable graph fresh with a debounced [`PreviewSession`]
#![forbid(unsafe_code)]

pub mod cache;
pub mod eval;
pub mod exec;
pub mod export;
pub mod foundation;
pub mod glyph;
pub mod graph;
pub mod ops;
pub mod session;
pub mod svg;

pub use crate::cache::{CacheStats, OpCache, OpCacheOpts};
pub use crate::eval::{EvalOpts, Evaluator};
pub use crate::exec::{
    Executor, ExecutorKind, ExecutorSettings, FallbackExecutor, InProcessExecutor,
    WorkerExecutor, WorkerOpts, create_executor,
};
pub use crate::export::{RasterOpts, rasterize_png};
pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::error::{KakijunError, KakijunResult};
pub use crate::glyph::{
    BakedGlyph, GlyphArtifact, GlyphSource, GlyphSourceOpts, annotate, bake,
};
pub use crate::graph::{Graph, GraphDef, NodeId, NodeKind, Port, Scheduler};
pub use crate::session::{PreviewSession, SessionOpts};
pub use crate::svg::{Artifact, SvgDocument};
