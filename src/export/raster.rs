use std::io::Cursor;

use crate::foundation::error::{KakijunError, KakijunResult};
use crate::svg::Artifact;

const MAX_DIM: u32 = 16_384;

#[derive(Clone, Debug)]
pub struct RasterOpts {
    /// Edge length of the square canvas in pixels.
    pub size: u32,
    /// Straight-alpha RGBA fill behind the artifact.
    pub background: [u8; 4],
}

impl Default for RasterOpts {
    fn default() -> Self {
        Self {
            size: 512,
            background: [255, 255, 255, 255],
        }
    }
}

/// Render an artifact centered on a square canvas, aspect preserved.
pub fn rasterize(artifact: &Artifact, opts: &RasterOpts) -> KakijunResult<image::RgbaImage> {
    if opts.size == 0 || opts.size > MAX_DIM {
        return Err(KakijunError::invalid_input(format!(
            "raster size must be within 1..={MAX_DIM}, got {}",
            opts.size
        )));
    }
    let tree = usvg::Tree::from_data(artifact.as_str().as_bytes(), &usvg::Options::default())
        .map_err(|e| KakijunError::parse(format!("svg tree: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(opts.size, opts.size)
        .ok_or_else(|| KakijunError::evaluation("failed to allocate raster pixmap"))?;
    let [r, g, b, a] = opts.background;
    pixmap.fill(resvg::tiny_skia::Color::from_rgba8(r, g, b, a));

    let side = opts.size as f32;
    let (w, h) = (tree.size().width(), tree.size().height());
    let scale = (side / w).min(side / h);
    let xform = resvg::tiny_skia::Transform::from_row(
        scale,
        0.0,
        0.0,
        scale,
        (side - w * scale) / 2.0,
        (side - h * scale) / 2.0,
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    image::RgbaImage::from_raw(opts.size, opts.size, data)
        .ok_or_else(|| KakijunError::evaluation("raster buffer has the wrong length"))
}

/// [`rasterize`] and encode as PNG.
pub fn rasterize_png(artifact: &Artifact, opts: &RasterOpts) -> KakijunResult<Vec<u8>> {
    let img = rasterize(artifact, opts)?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| KakijunError::Other(anyhow::Error::new(e).context("encode png")))?;
    Ok(out.into_inner())
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(text: &str) -> KakijunResult<[u8; 4]> {
    let bad = || KakijunError::invalid_input(format!("not a hex color: {text:?}"));
    let hex = text.trim().strip_prefix('#').ok_or_else(bad)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(hex.chars()) {
                let v = c.to_digit(16).ok_or_else(bad)? as u8;
                *slot = v * 17;
            }
            Ok([rgb[0], rgb[1], rgb[2], 255])
        }
        6 => Ok([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Ok([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => Err(bad()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/raster.rs"]
mod tests;
