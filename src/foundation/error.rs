/// Convenience result type used across pressmap.
pub type PressResult<T> = Result<T, PressError>;

/// Reasons a four-point calibration is rejected.
///
/// A rejected submission never touches the calibration that was active before it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// The correspondence set did not contain exactly four projector points.
    #[error("calibration needs exactly 4 source points, got {got}")]
    PointCount {
        /// Number of points that were supplied.
        got: usize,
    },

    /// Press width or height was zero, negative or not finite.
    #[error("press dimensions must be positive, got {width_mm}x{height_mm} mm")]
    NonPositiveDimensions {
        /// Supplied press width in millimeters.
        width_mm: f64,
        /// Supplied press height in millimeters.
        height_mm: f64,
    },

    /// The correspondences cannot define a homography (duplicate or collinear points).
    #[error("degenerate correspondence set: {0}")]
    Degenerate(String),

    /// The press at the configured density would need a canonical raster larger than the
    /// renderer can allocate.
    #[error("canonical raster of {width_px}x{height_px} px exceeds the render limit")]
    CanonicalTooLarge {
        /// Required canonical width in pixels.
        width_px: f64,
        /// Required canonical height in pixels.
        height_px: f64,
    },

    /// A coordinate conversion or size query was made before calibration.
    #[error("calibrator is not calibrated")]
    NotCalibrated,
}

/// Top-level error taxonomy used by pressmap APIs.
#[derive(thiserror::Error, Debug)]
pub enum PressError {
    /// Calibration submission or coordinate conversion failure.
    #[error("calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    /// A render was attempted for a press without calibration.
    #[error("calibration required before rendering{}", press_suffix(.0))]
    CalibrationRequired(Option<String>),

    /// The rasterizer failed to parse, draw or encode a frame.
    #[error("rasterization error: {0}")]
    Rasterization(String),

    /// Invalid user-provided layout, scene or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// A referenced press, scene or asset does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PressError {
    /// Build a [`PressError::CalibrationRequired`] value naming the press.
    pub fn calibration_required(press: impl Into<String>) -> Self {
        Self::CalibrationRequired(Some(press.into()))
    }

    /// Build a [`PressError::CalibrationRequired`] value for a press not known at the call site.
    pub fn not_calibrated() -> Self {
        Self::CalibrationRequired(None)
    }

    /// Attach a press name to an unnamed [`PressError::CalibrationRequired`].
    pub fn for_press(self, press: &str) -> Self {
        match self {
            Self::CalibrationRequired(None) => Self::calibration_required(press),
            other => other,
        }
    }

    /// Build a [`PressError::Rasterization`] value.
    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization(msg.into())
    }

    /// Build a [`PressError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PressError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`PressError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

fn press_suffix(press: &Option<String>) -> String {
    press
        .as_deref()
        .map(|p| format!(" press '{p}'"))
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
