//! Four-point perspective calibration of a press.

/// Per-press calibration state and coordinate conversions.
pub mod calibrator;
/// Planar homography estimation and application.
pub mod homography;
