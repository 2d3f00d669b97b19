//! Raster export of artifacts.

pub mod raster;

pub use raster::{RasterOpts, parse_hex_color, rasterize, rasterize_png};
