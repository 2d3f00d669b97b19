//! Glyph acquisition and stroke normalization.
//!
//! [`GlyphSource`] turns a character into raw source text; [`bake`] and [`annotate`] turn
//! that text into stroke-indexed documents the operations understand.

pub mod bake;
pub mod fetch;
pub mod source;

pub use bake::{BakedGlyph, DEFAULT_VIEW_BOX, annotate, bake};
#[cfg(feature = "remote")]
pub use fetch::HttpFetcher;
pub use fetch::{DirFetcher, GlyphFetcher};
pub use source::{GlyphArtifact, GlyphSource, GlyphSourceOpts, codepoint_id};
