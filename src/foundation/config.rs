use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::foundation::core::Canvas;
use crate::foundation::error::{PressError, PressResult};
use crate::render::pipeline::{RenderOptions, WarpMode};

/// Pixels per millimeter of the canonical (undistorted) press raster.
pub const DEFAULT_RASTER_DENSITY: f64 = 10.0;

/// Process-level settings for the projector pipeline.
///
/// Every field has a default so a partial JSON file (or `{}`) is a valid configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Projector output resolution.
    pub output: Canvas,
    /// Canonical raster density in px/mm.
    pub raster_density_px_per_mm: f64,
    /// Stroke width used for outlines and lines, in millimeters.
    pub stroke_width_mm: f64,
    /// Interval of the periodic re-broadcast render.
    pub broadcast_interval_ms: u64,
    /// Margin around the press used by the boundary overlay and validation.
    pub boundary_margin_mm: f64,
    /// Perspective warp or debug bypass.
    pub warp: WarpMode,
    /// Overlay the press boundary pattern on rendered frames.
    pub show_boundary: bool,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            output: Canvas::default(),
            raster_density_px_per_mm: DEFAULT_RASTER_DENSITY,
            stroke_width_mm: 0.5,
            broadcast_interval_ms: 2000,
            boundary_margin_mm: 5.0,
            warp: WarpMode::Perspective,
            show_boundary: false,
        }
    }
}

impl ProjectorConfig {
    /// Parse a configuration from a JSON reader and validate it.
    pub fn from_reader<R: std::io::Read>(r: R) -> PressResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| PressError::serde(format!("parse projector config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PressResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PressError::validation(format!("open projector config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject configurations the pipeline cannot honor.
    pub fn validate(&self) -> PressResult<()> {
        Canvas::new(self.output.width, self.output.height)?;
        if !self.raster_density_px_per_mm.is_finite() || self.raster_density_px_per_mm <= 0.0 {
            return Err(PressError::validation(
                "raster_density_px_per_mm must be finite and > 0",
            ));
        }
        if !self.stroke_width_mm.is_finite() || self.stroke_width_mm <= 0.0 {
            return Err(PressError::validation(
                "stroke_width_mm must be finite and > 0",
            ));
        }
        if self.broadcast_interval_ms == 0 {
            return Err(PressError::validation("broadcast_interval_ms must be > 0"));
        }
        if !self.boundary_margin_mm.is_finite() || self.boundary_margin_mm < 0.0 {
            return Err(PressError::validation(
                "boundary_margin_mm must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Interval of the periodic re-broadcast render.
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }

    /// Render options derived from this configuration.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            stroke_width_mm: self.stroke_width_mm,
            warp: self.warp,
            show_boundary: self.show_boundary,
            boundary_margin_mm: self.boundary_margin_mm,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
