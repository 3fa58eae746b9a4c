//! Four-point projector calibration for one press.
//!
//! The calibrator owns the projector-pixel correspondences of the press corners and the derived
//! homography mapping **projector pixels -> canonical raster pixels**. The canonical raster is the
//! press surface sampled at a fixed density (`raster_density` px/mm), so canonical coordinates
//! are millimeters times density.

use crate::calibration::homography::Homography;
use crate::foundation::config::DEFAULT_RASTER_DENSITY;
use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::CalibrationError;
use crate::foundation::math::dist;

/// Residuals above this (in millimeters) mark a calibration as unusable.
pub const MAX_ROUND_TRIP_ERROR_MM: f64 = 1.0;

/// Largest canonical raster side, in pixels.
pub const MAX_CANONICAL_SIDE_PX: u32 = 32_768;
/// Largest canonical raster area, in pixels (1 GiB of RGBA8).
pub const MAX_CANONICAL_PIXELS: u64 = 1 << 28;

/// Persisted calibration shape.
///
/// Only the raw correspondences and press size are stored; the homography and canonical size
/// are always recomputed on import.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationRecord {
    /// Projector-pixel corners: top-left, top-right, bottom-right, bottom-left.
    pub source_points: Vec<[f64; 2]>,
    /// Physical press width.
    pub press_width_mm: f64,
    /// Physical press height.
    pub press_height_mm: f64,
}

/// Result of [`Calibrator::validate_round_trip`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RoundTripReport {
    /// Largest corner residual in millimeters.
    pub max_error_mm: f64,
    /// Mean corner residual in millimeters.
    pub avg_error_mm: f64,
    /// `true` when `max_error_mm` is below [`MAX_ROUND_TRIP_ERROR_MM`].
    pub valid: bool,
    /// Approximate projector scale at the press plane.
    pub pixels_per_mm: f64,
}

#[derive(Clone, Debug)]
struct Solved {
    source_points: [Point; 4],
    press_width_mm: f64,
    press_height_mm: f64,
    canonical: Canvas,
    homography: Homography,
}

/// Projector-to-press calibration of a single press.
#[derive(Clone, Debug)]
pub struct Calibrator {
    density: f64,
    solved: Option<Solved>,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibrator {
    /// Uncalibrated calibrator at the default raster density.
    pub fn new() -> Self {
        Self::with_density(DEFAULT_RASTER_DENSITY)
    }

    /// Uncalibrated calibrator at `density` px/mm. Non-positive densities fall back to the default.
    pub fn with_density(density: f64) -> Self {
        let density = if density.is_finite() && density > 0.0 {
            density
        } else {
            DEFAULT_RASTER_DENSITY
        };
        Self {
            density,
            solved: None,
        }
    }

    /// Build a calibrator directly from a persisted record.
    pub fn from_record(record: &CalibrationRecord, density: f64) -> Result<Self, CalibrationError> {
        let mut c = Self::with_density(density);
        c.import(record)?;
        Ok(c)
    }

    /// Canonical raster density in px/mm.
    pub fn raster_density(&self) -> f64 {
        self.density
    }

    /// Install a new calibration from four projector points and the press size.
    ///
    /// On error the previous calibration (if any) is kept untouched.
    #[tracing::instrument(level = "debug", skip(self, points), fields(n = points.len()))]
    pub fn set_points(
        &mut self,
        points: &[Point],
        press_width_mm: f64,
        press_height_mm: f64,
    ) -> Result<(), CalibrationError> {
        let source_points: [Point; 4] = points
            .try_into()
            .map_err(|_| CalibrationError::PointCount { got: points.len() })?;
        let solved = self.solve(source_points, press_width_mm, press_height_mm)?;
        tracing::debug!(
            canonical_w = solved.canonical.width,
            canonical_h = solved.canonical.height,
            "calibration solved"
        );
        self.solved = Some(solved);
        Ok(())
    }

    /// Change the press size while keeping the current projector points.
    pub fn set_press_size(
        &mut self,
        press_width_mm: f64,
        press_height_mm: f64,
    ) -> Result<(), CalibrationError> {
        let points = self.solved()?.source_points;
        let solved = self.solve(points, press_width_mm, press_height_mm)?;
        self.solved = Some(solved);
        Ok(())
    }

    /// Drop the calibration.
    pub fn reset(&mut self) {
        self.solved = None;
    }

    /// `true` once a homography is available.
    pub fn is_calibrated(&self) -> bool {
        self.solved.is_some()
    }

    /// Canonical raster size (`round(press_mm * density)` per axis).
    pub fn canonical_size_px(&self) -> Result<Canvas, CalibrationError> {
        Ok(self.solved()?.canonical)
    }

    /// Press dimensions in millimeters.
    pub fn press_size_mm(&self) -> Result<(f64, f64), CalibrationError> {
        let s = self.solved()?;
        Ok((s.press_width_mm, s.press_height_mm))
    }

    /// Projector-pixel corner points in calibration order.
    pub fn source_points(&self) -> Result<[Point; 4], CalibrationError> {
        Ok(self.solved()?.source_points)
    }

    /// Projector -> canonical homography.
    pub fn homography(&self) -> Result<Homography, CalibrationError> {
        Ok(self.solved()?.homography)
    }

    /// Map a projector pixel onto the canonical raster.
    pub fn projector_to_canonical(&self, x: f64, y: f64) -> Result<Point, CalibrationError> {
        self.solved()?
            .homography
            .apply(Point::new(x, y))
            .ok_or_else(|| point_at_infinity(x, y))
    }

    /// Map a canonical raster position back into projector pixels.
    pub fn canonical_to_projector(&self, x: f64, y: f64) -> Result<Point, CalibrationError> {
        self.solved()?
            .homography
            .apply_inverse(Point::new(x, y))
            .ok_or_else(|| point_at_infinity(x, y))
    }

    /// Map a press position in millimeters to projector pixels.
    pub fn press_to_projector(&self, x_mm: f64, y_mm: f64) -> Result<Point, CalibrationError> {
        self.canonical_to_projector(x_mm * self.density, y_mm * self.density)
    }

    /// Map a projector pixel to a press position in millimeters.
    pub fn projector_to_press(&self, x: f64, y: f64) -> Result<Point, CalibrationError> {
        let p = self.projector_to_canonical(x, y)?;
        Ok(Point::new(p.x / self.density, p.y / self.density))
    }

    /// Approximate projector pixels per millimeter at the press plane.
    ///
    /// Average of the top-edge and right-edge scales of the clicked quad.
    pub fn pixels_per_mm(&self) -> Result<f64, CalibrationError> {
        let s = self.solved()?;
        let p = &s.source_points;
        let top = dist((p[0].x, p[0].y), (p[1].x, p[1].y));
        let right = dist((p[1].x, p[1].y), (p[2].x, p[2].y));
        Ok((top / s.press_width_mm + right / s.press_height_mm) / 2.0)
    }

    /// Press corners expanded by `margin_mm`, in projector pixels (TL, TR, BR, BL).
    pub fn boundary_pattern(&self, margin_mm: f64) -> Result<[Point; 4], CalibrationError> {
        let s = self.solved()?;
        let corners = expanded_corners_mm(s.press_width_mm, s.press_height_mm, margin_mm);
        let mut out = [Point::ZERO; 4];
        for (o, c) in out.iter_mut().zip(corners) {
            *o = self.press_to_projector(c.x, c.y)?;
        }
        Ok(out)
    }

    /// Persistable form of the current calibration.
    pub fn export(&self) -> Result<CalibrationRecord, CalibrationError> {
        let s = self.solved()?;
        Ok(CalibrationRecord {
            source_points: s.source_points.iter().map(|p| [p.x, p.y]).collect(),
            press_width_mm: s.press_width_mm,
            press_height_mm: s.press_height_mm,
        })
    }

    /// Replace the calibration by replaying a persisted record through the solver.
    pub fn import(&mut self, record: &CalibrationRecord) -> Result<(), CalibrationError> {
        let points: Vec<Point> = record
            .source_points
            .iter()
            .map(|[x, y]| Point::new(*x, *y))
            .collect();
        self.set_points(&points, record.press_width_mm, record.press_height_mm)
    }

    /// Round-trip the press corners (expanded by `margin_mm`) canonical -> projector -> canonical
    /// and report the residuals in millimeters.
    pub fn validate_round_trip(&self, margin_mm: f64) -> Result<RoundTripReport, CalibrationError> {
        let s = self.solved()?;
        let corners = expanded_corners_mm(s.press_width_mm, s.press_height_mm, margin_mm);

        let mut errors = [0.0f64; 4];
        for (e, c) in errors.iter_mut().zip(corners) {
            let proj = self.press_to_projector(c.x, c.y)?;
            let back = self.projector_to_press(proj.x, proj.y)?;
            *e = dist((c.x, c.y), (back.x, back.y));
        }

        let max_error_mm = errors.iter().copied().fold(0.0, f64::max);
        let avg_error_mm = errors.iter().sum::<f64>() / errors.len() as f64;
        Ok(RoundTripReport {
            max_error_mm,
            avg_error_mm,
            valid: max_error_mm < MAX_ROUND_TRIP_ERROR_MM,
            pixels_per_mm: self.pixels_per_mm()?,
        })
    }

    fn solved(&self) -> Result<&Solved, CalibrationError> {
        self.solved.as_ref().ok_or(CalibrationError::NotCalibrated)
    }

    fn solve(
        &self,
        source_points: [Point; 4],
        press_width_mm: f64,
        press_height_mm: f64,
    ) -> Result<Solved, CalibrationError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(press_width_mm) || !positive(press_height_mm) {
            return Err(CalibrationError::NonPositiveDimensions {
                width_mm: press_width_mm,
                height_mm: press_height_mm,
            });
        }

        let canonical = canonical_canvas(press_width_mm, press_height_mm, self.density)?;
        let (w, h) = (f64::from(canonical.width), f64::from(canonical.height));
        let dst = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ];

        let homography = Homography::from_correspondences(&source_points, &dst).inspect_err(|e| {
            tracing::warn!(error = %e, "calibration rejected");
        })?;

        Ok(Solved {
            source_points,
            press_width_mm,
            press_height_mm,
            canonical,
            homography,
        })
    }
}

fn canonical_canvas(w_mm: f64, h_mm: f64, density: f64) -> Result<Canvas, CalibrationError> {
    let (w, h) = ((w_mm * density).round(), (h_mm * density).round());
    if w < 1.0 || h < 1.0 {
        return Err(CalibrationError::Degenerate(format!(
            "press of {w_mm}x{h_mm} mm gives an empty canonical raster ({w}x{h} px)"
        )));
    }
    let side = f64::from(MAX_CANONICAL_SIDE_PX);
    if w > side || h > side || w * h > MAX_CANONICAL_PIXELS as f64 {
        return Err(CalibrationError::CanonicalTooLarge {
            width_px: w,
            height_px: h,
        });
    }
    Ok(Canvas {
        width: w as u32,
        height: h as u32,
    })
}

fn expanded_corners_mm(w: f64, h: f64, margin: f64) -> [Point; 4] {
    [
        Point::new(-margin, -margin),
        Point::new(w + margin, -margin),
        Point::new(w + margin, h + margin),
        Point::new(-margin, h + margin),
    ]
}

fn point_at_infinity(x: f64, y: f64) -> CalibrationError {
    CalibrationError::Degenerate(format!("point ({x}, {y}) maps to infinity"))
}

#[cfg(test)]
#[path = "../../tests/unit/calibration/calibrator.rs"]
mod tests;
