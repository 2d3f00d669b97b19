//! Owned SVG document model built on `roxmltree`, plus the stroke-tagging conventions.

pub mod artifact;
pub mod dom;
pub mod stroke;

pub use artifact::Artifact;
pub use dom::{Element, Node, SvgDocument};
