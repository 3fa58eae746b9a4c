use std::io::Cursor;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::Canvas;
use crate::foundation::error::{PressError, PressResult};
use crate::operation::mode::OperationMode;

/// Opaque RGBA8 frame, tightly packed, row-major.
///
/// Projector output is always opaque: unlit pixels are black with alpha 255.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes.
    pub data: Vec<u8>,
}

impl RasterImage {
    /// All-black opaque frame.
    pub fn black(canvas: Canvas) -> Self {
        let mut data = vec![0u8; canvas.rgba_len()];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
        }
    }

    /// Wrap an existing buffer, checking its length.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> PressResult<Self> {
        let canvas = Canvas::new(width, height)?;
        if data.len() != canvas.rgba_len() {
            return Err(PressError::validation(format!(
                "rgba buffer has {} bytes, expected {} for {width}x{height}",
                data.len(),
                canvas.rgba_len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Number of pixels with any non-zero color channel.
    pub fn lit_pixel_count(&self) -> usize {
        self.data
            .chunks_exact(4)
            .filter(|px| px[0] != 0 || px[1] != 0 || px[2] != 0)
            .count()
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> PressResult<Vec<u8>> {
        let mut buf = Vec::new();
        image::write_buffer_with_format(
            &mut Cursor::new(&mut buf),
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| PressError::rasterization(format!("encode png: {e}")))?;
        Ok(buf)
    }

    /// Write a PNG file, creating parent directories.
    pub fn save_png(&self, path: impl AsRef<Path>) -> PressResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// A rendered projector frame tagged with the target it belongs to and the mode it was produced
/// under.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFrame {
    /// Press id in scene setup, or the production group name.
    pub target: String,
    /// Operation mode at render time.
    pub mode: OperationMode,
    /// Projector-resolution pixels.
    pub image: RasterImage,
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
