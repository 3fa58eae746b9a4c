use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::Canvas;
use crate::foundation::error::{PressError, PressResult};

/// Decoded-size information and encoded bytes of an image asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedImage {
    /// PNG, JPEG or GIF bytes.
    pub bytes: Arc<Vec<u8>>,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

impl ResolvedImage {
    /// Probe encoded image bytes for their size.
    ///
    /// Formats the rasterizer cannot embed directly are re-encoded as PNG.
    pub fn from_bytes(bytes: Vec<u8>) -> PressResult<Self> {
        let format = image::guess_format(&bytes).context("detect image format")?;
        let decoded = image::load_from_memory(&bytes).context("decode image from memory")?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(PressError::validation("image has zero size"));
        }

        let bytes = match format {
            image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::Gif => bytes,
            other => {
                tracing::debug!(?other, "re-encoding image as png");
                let mut buf = Vec::new();
                decoded
                    .to_rgba8()
                    .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                    .context("re-encode image as png")?;
                buf
            }
        };

        Ok(Self {
            bytes: Arc::new(bytes),
            width,
            height,
        })
    }

    /// Height / width.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.height) / f64::from(self.width.max(1))
    }

    fn kind(&self) -> Option<usvg::ImageKind> {
        match image::guess_format(&self.bytes).ok()? {
            image::ImageFormat::Png => Some(usvg::ImageKind::PNG(self.bytes.clone())),
            image::ImageFormat::Jpeg => Some(usvg::ImageKind::JPEG(self.bytes.clone())),
            image::ImageFormat::Gif => Some(usvg::ImageKind::GIF(self.bytes.clone())),
            _ => None,
        }
    }
}

/// Images referenced by a layout, keyed by their reference string.
pub type ImageSet = BTreeMap<String, ResolvedImage>;

/// SVG rasterizer backed by `resvg` with a shared font database.
#[derive(Clone)]
pub struct SvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgRasterizer {
    /// Rasterizer using the system fonts.
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self::with_fontdb(Arc::new(db))
    }

    /// Rasterizer using an explicit font database.
    pub fn with_fontdb(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { fontdb }
    }

    /// Rasterize `svg` into a premultiplied RGBA8 buffer of `canvas` size.
    ///
    /// `<image>` hrefs are looked up in `images`; nothing is read from disk.
    pub fn rasterize(&self, svg: &str, canvas: Canvas, images: &ImageSet) -> PressResult<Vec<u8>> {
        let resolver = usvg::ImageHrefResolver {
            resolve_string: Box::new(move |href: &str, _opts: &usvg::Options| {
                images.get(href).and_then(ResolvedImage::kind)
            }),
            ..Default::default()
        };
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            image_href_resolver: resolver,
            ..Default::default()
        };

        let tree = usvg::Tree::from_str(svg, &opts)
            .map_err(|e| PressError::rasterization(format!("parse svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
            .ok_or_else(|| PressError::rasterization("failed to allocate pixmap"))?;

        let sx = (canvas.width as f32) / tree.size().width();
        let sy = (canvas.height as f32) / tree.size().height();
        let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
        resvg::render(&tree, xform, &mut pixmap.as_mut());
        Ok(pixmap.take())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
