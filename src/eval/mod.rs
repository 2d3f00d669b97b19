//! Graph evaluation.

pub mod evaluator;

pub use evaluator::{EvalOpts, Evaluator};
