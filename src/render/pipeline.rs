use std::time::Instant;

use crate::calibration::calibrator::Calibrator;
use crate::foundation::core::{Canvas, Point, PressId};
use crate::foundation::error::{PressError, PressResult};
use crate::foundation::math::fmt_num;
use crate::layout::color::Color;
use crate::layout::model::Layout;
use crate::render::composite::{add_saturating_in_place, flatten_onto_black, over_in_place};
use crate::render::frame::RasterImage;
use crate::render::raster::{ImageSet, SvgRasterizer};
use crate::render::svg::{SvgParams, canonical_svg};
use crate::render::warp::{resize_bilinear, warp_perspective};

/// How the canonical raster reaches projector space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarpMode {
    /// Pre-warp through the inverse calibration homography.
    #[default]
    Perspective,
    /// Debug mode: stretch the canonical raster to the output, no perspective correction.
    Bypass,
}

/// Per-pipeline drawing options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Outline width in millimeters.
    pub stroke_width_mm: f64,
    /// Warp mode.
    pub warp: WarpMode,
    /// Overlay the press boundary on single-press frames.
    pub show_boundary: bool,
    /// Margin of the boundary overlay in millimeters.
    pub boundary_margin_mm: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            stroke_width_mm: 0.5,
            warp: WarpMode::Perspective,
            show_boundary: false,
            boundary_margin_mm: 5.0,
        }
    }
}

/// Everything needed to render one press inside a production frame.
#[derive(Clone, Copy, Debug)]
pub struct PressRender<'a> {
    /// Press being rendered.
    pub press: &'a PressId,
    /// Absolute layout of the press.
    pub layout: &'a Layout,
    /// Calibration of the press.
    pub calibrator: &'a Calibrator,
    /// Images referenced by `layout`.
    pub images: &'a ImageSet,
}

/// Layout -> canonical SVG -> canonical raster -> opaque black background -> projector frame.
#[derive(Clone, Debug)]
pub struct RenderPipeline {
    rasterizer: SvgRasterizer,
    opts: RenderOptions,
}

impl RenderPipeline {
    /// Pipeline with a system-font rasterizer.
    pub fn new(opts: RenderOptions) -> Self {
        Self::with_rasterizer(SvgRasterizer::new(), opts)
    }

    /// Pipeline with an explicit rasterizer.
    pub fn with_rasterizer(rasterizer: SvgRasterizer, opts: RenderOptions) -> Self {
        Self { rasterizer, opts }
    }

    /// Current options.
    pub fn options(&self) -> RenderOptions {
        self.opts
    }

    /// Canonical SVG of `layout` under `calibrator`'s canonical size.
    pub fn canonical_svg(
        &self,
        layout: &Layout,
        calibrator: &Calibrator,
        images: &ImageSet,
    ) -> PressResult<String> {
        let canvas = calibrator.canonical_size_px()?;
        let params = SvgParams {
            canvas,
            density: calibrator.raster_density(),
            stroke_width_mm: self.opts.stroke_width_mm,
        };
        Ok(canonical_svg(layout, &params, images))
    }

    /// Rasterize `layout` into the undistorted canonical raster, flattened onto opaque black.
    pub fn render_canonical(
        &self,
        layout: &Layout,
        calibrator: &Calibrator,
        images: &ImageSet,
    ) -> PressResult<RasterImage> {
        if !calibrator.is_calibrated() {
            return Err(PressError::not_calibrated());
        }
        let canvas = calibrator.canonical_size_px()?;
        let svg = self.canonical_svg(layout, calibrator, images)?;
        let mut data = self.rasterizer.rasterize(&svg, canvas, images)?;
        flatten_onto_black(&mut data);
        RasterImage::from_rgba8(canvas.width, canvas.height, data)
    }

    /// Render one press into a projector frame of size `output`.
    #[tracing::instrument(level = "debug", skip_all, fields(w = output.width, h = output.height))]
    pub fn render_single(
        &self,
        layout: &Layout,
        calibrator: &Calibrator,
        output: Canvas,
        images: &ImageSet,
    ) -> PressResult<RasterImage> {
        let output = Canvas::new(output.width, output.height)?;
        let t0 = Instant::now();
        let canonical = self.render_canonical(layout, calibrator, images)?;

        let mut frame = match self.opts.warp {
            WarpMode::Perspective => {
                let h = calibrator.homography()?;
                warp_perspective(&canonical, &h, output)
            }
            WarpMode::Bypass => resize_bilinear(&canonical, output)?,
        };

        if self.opts.show_boundary {
            self.overlay_boundary(&mut frame, calibrator)?;
        }

        tracing::debug!(
            elements = layout.elements.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "rendered press frame"
        );
        Ok(frame)
    }

    /// Render every press independently and add the warped frames together.
    ///
    /// Presses without calibration are skipped with a warning; if none can be rendered the
    /// first calibration failure is returned.
    #[tracing::instrument(level = "debug", skip_all, fields(presses = presses.len()))]
    pub fn render_production(
        &self,
        presses: &[PressRender<'_>],
        output: Canvas,
    ) -> PressResult<RasterImage> {
        let output = Canvas::new(output.width, output.height)?;
        let mut acc = RasterImage::black(output);
        let mut rendered = 0usize;
        let mut first_missing = None;

        for p in presses {
            if !p.calibrator.is_calibrated() {
                tracing::warn!(press = %p.press, "press has a scene but no calibration; skipping");
                first_missing.get_or_insert_with(|| p.press.clone());
                continue;
            }
            let frame = self.render_single(p.layout, p.calibrator, output, p.images)?;
            add_saturating_in_place(&mut acc, &frame)?;
            rendered += 1;
        }

        match first_missing {
            Some(press) if rendered == 0 => Err(PressError::calibration_required(press.as_str())),
            _ => Ok(acc),
        }
    }

    /// Yellow press outline (translucent fill, corner markers) in projector space.
    fn overlay_boundary(&self, frame: &mut RasterImage, calibrator: &Calibrator) -> PressResult<()> {
        let corners = calibrator.boundary_pattern(self.opts.boundary_margin_mm)?;
        let svg = boundary_svg(frame.canvas(), &corners);
        let overlay = self.rasterizer.rasterize(&svg, frame.canvas(), &ImageSet::new())?;
        over_in_place(&mut frame.data, &overlay, 1.0)
    }
}

fn boundary_svg(canvas: Canvas, corners: &[Point; 4]) -> String {
    let yellow = Color::YELLOW.to_hex();
    let points = corners
        .iter()
        .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
        .collect::<Vec<_>>()
        .join(" ");
    let markers: String = corners
        .iter()
        .map(|p| {
            format!(
                r#"<circle cx="{}" cy="{}" r="8" fill="{yellow}"/>"#,
                fmt_num(p.x),
                fmt_num(p.y)
            )
        })
        .collect();
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><polygon points="{points}" fill="{yellow}" fill-opacity="0.2" stroke="{yellow}" stroke-width="4"/>{markers}</svg>"#,
        w = canvas.width,
        h = canvas.height
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
